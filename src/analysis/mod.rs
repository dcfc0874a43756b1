//! Provider request building and response normalization.
//!
//! The core of the analyzer: shapes an outbound request for the configured
//! provider and turns whatever comes back into one answer string or a
//! classified failure. All functions here are pure (no I/O).

pub mod normalize;
pub mod provider_types;
pub mod request;

pub use normalize::{normalize, ExtractionResult, FailureKind, RawReply, TransportFailure};
pub use request::{build, OutboundRequest};
