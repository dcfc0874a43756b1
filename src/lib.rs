pub mod analysis;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod providers;
pub mod proxy;
pub mod server;

pub use config::{AnalyzerConfig, ProviderConfig};
pub use error::{AnalyzerError, Result};
pub use logging::SharedJournal;
pub use server::{build_router, AppState};
