use crate::error::{AnalyzerError, Result};
use crate::providers::{AuthMode, ProviderKind, ProviderPreset};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// On-disk configuration, as written in `call-analyzer.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Provider selection. Everything except `name` falls back to the preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProviderKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<AuthMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Extra attempts after a transport failure. HTTP error statuses are never retried.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_capacity")]
    pub capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Command-line overrides layered on top of the file config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub journal_file: Option<PathBuf>,
}

/// Fully resolved provider settings. Built once at start-up, immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// Endpoint template; `{model}` is replaced with `model`.
    pub endpoint: String,
    pub auth_mode: AuthMode,
    pub model: String,
    pub api_key_env: String,
    pub generation: GenerationParams,
}

fn default_port() -> u16 {
    3000
}

fn default_provider_name() -> String {
    "openai".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_delay_ms() -> u64 {
    250
}

fn default_journal_capacity() -> usize {
    1_000
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            provider: ProviderSection::default(),
            generation: GenerationParams::default(),
            transport: TransportConfig::default(),
            journal: JournalConfig::default(),
        }
    }
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self::named(default_provider_name())
    }
}

impl ProviderSection {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            endpoint: None,
            auth_mode: None,
            model: None,
            api_key_env: None,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            max_retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            capacity: default_journal_capacity(),
            file: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AnalyzerError::config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Search standard locations for a config file, falling back to defaults.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        for candidate in config_search_paths() {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(&candidate);
            }
        }

        tracing::info!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Apply command-line overrides. Selecting a provider discards the file's
    /// provider-level settings; `model` is applied after that.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(provider) = overrides.provider {
            self.provider = ProviderSection::named(provider);
        }
        if let Some(model) = overrides.model {
            self.provider.model = Some(model);
        }
        if let Some(path) = overrides.journal_file {
            self.journal.file = Some(path);
        }
    }

    /// Merge the provider section with its preset into a [`ProviderConfig`].
    pub fn resolve_provider(&self) -> Result<ProviderConfig> {
        let section = &self.provider;
        let preset = ProviderPreset::from_name(&section.name);

        let kind = section
            .kind
            .or(preset.map(|p| p.kind))
            .ok_or_else(|| unknown_provider(&section.name, "kind"))?;
        let endpoint = section
            .endpoint
            .clone()
            .or_else(|| preset.map(|p| p.endpoint.to_string()))
            .ok_or_else(|| unknown_provider(&section.name, "endpoint"))?;
        let model = section
            .model
            .clone()
            .or_else(|| preset.map(|p| p.default_model.to_string()))
            .ok_or_else(|| unknown_provider(&section.name, "model"))?;
        let auth_mode = section
            .auth_mode
            .or(preset.map(|p| p.auth_mode))
            .unwrap_or(AuthMode::Bearer);
        let api_key_env = section
            .api_key_env
            .clone()
            .or_else(|| preset.map(|p| p.default_api_key_env.to_string()))
            .unwrap_or_else(|| "API_KEY".to_string());

        let provider = ProviderConfig {
            name: section.name.clone(),
            kind,
            endpoint,
            auth_mode,
            model,
            api_key_env,
            generation: self.generation.clone(),
        };

        url::Url::parse(&provider.endpoint_url()).map_err(|e| {
            AnalyzerError::config(format!("Invalid endpoint '{}': {}", provider.endpoint, e))
        })?;

        Ok(provider)
    }
}

impl ProviderConfig {
    /// Endpoint with the model substituted in.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint.replace("{model}", &self.model)
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AnalyzerError::config(format!(
                "Environment variable '{}' not set. Set it with your provider API key.",
                self.api_key_env
            ))),
        }
    }
}

fn unknown_provider(name: &str, missing: &str) -> AnalyzerError {
    AnalyzerError::config(format!(
        "Unknown provider '{}' and no {} configured. Known providers: {}",
        name,
        missing,
        ProviderPreset::names().join(", ")
    ))
}

/// Candidate config file locations, highest priority first.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("call-analyzer.toml")];

    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        paths.push(PathBuf::from(xdg).join("call-analyzer").join("config.toml"));
    }
    if let Some(home) = home_dir() {
        paths.push(home.join(".config").join("call-analyzer").join("config.toml"));
        paths.push(home.join(".call-analyzer.toml"));
    }

    paths
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
