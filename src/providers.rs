//! Built-in provider presets for the supported text-generation APIs.
//!
//! Each preset pins the request shape, endpoint, auth placement and default
//! environment variable for the API key. Users name a preset in their config
//! and only override what differs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request/response family a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// `/chat/completions` with a message list.
    ChatCompletions,
    /// `/responses` with a single `input` string.
    Responses,
    /// `:generateContent` with `contents/parts`.
    Gemini,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ChatCompletions => "chat-completions",
            Self::Responses => "responses",
            Self::Gemini => "gemini",
        };
        f.write_str(name)
    }
}

/// Where the API key goes on the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `?key=<key>`
    QueryParam,
}

#[derive(Debug, Clone)]
pub struct ProviderPreset {
    pub name: &'static str,
    pub kind: ProviderKind,
    pub endpoint: &'static str,
    pub auth_mode: AuthMode,
    pub default_model: &'static str,
    pub default_api_key_env: &'static str,
}

const PRESETS: &[ProviderPreset] = &[
    ProviderPreset {
        name: "openai",
        kind: ProviderKind::ChatCompletions,
        endpoint: "https://api.openai.com/v1/chat/completions",
        auth_mode: AuthMode::Bearer,
        default_model: "gpt-4o-mini",
        default_api_key_env: "OPENAI_API_KEY",
    },
    ProviderPreset {
        name: "openai-responses",
        kind: ProviderKind::Responses,
        endpoint: "https://api.openai.com/v1/responses",
        auth_mode: AuthMode::Bearer,
        default_model: "gpt-4o-mini",
        default_api_key_env: "OPENAI_API_KEY",
    },
    ProviderPreset {
        name: "gemini",
        kind: ProviderKind::Gemini,
        endpoint: "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent",
        auth_mode: AuthMode::QueryParam,
        default_model: "gemini-2.0-flash",
        default_api_key_env: "GEMINI_API_KEY",
    },
    ProviderPreset {
        name: "openrouter",
        kind: ProviderKind::ChatCompletions,
        endpoint: "https://openrouter.ai/api/v1/chat/completions",
        auth_mode: AuthMode::Bearer,
        default_model: "openai/gpt-4o-mini",
        default_api_key_env: "OPENROUTER_API_KEY",
    },
    ProviderPreset {
        name: "groq",
        kind: ProviderKind::ChatCompletions,
        endpoint: "https://api.groq.com/openai/v1/chat/completions",
        auth_mode: AuthMode::Bearer,
        default_model: "llama-3.3-70b-versatile",
        default_api_key_env: "GROQ_API_KEY",
    },
    ProviderPreset {
        name: "deepseek",
        kind: ProviderKind::ChatCompletions,
        endpoint: "https://api.deepseek.com/v1/chat/completions",
        auth_mode: AuthMode::Bearer,
        default_model: "deepseek-chat",
        default_api_key_env: "DEEPSEEK_API_KEY",
    },
];

impl ProviderPreset {
    #[must_use]
    pub fn from_name(name: &str) -> Option<&'static ProviderPreset> {
        let name = name.to_lowercase();
        PRESETS.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn all() -> &'static [ProviderPreset] {
        PRESETS
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        PRESETS.iter().map(|p| p.name).collect()
    }
}
