//! Build the outbound provider request for a transcript.
//!
//! The request shape, the placement of generation parameters and the placement
//! of the API key are all pure lookups on the resolved [`ProviderConfig`].

use std::collections::BTreeMap;

use serde::Serialize;

use super::provider_types::{
    ChatCompletionRequest, ChatMessage, Content, GenerateContentRequest, GenerationConfig, Part,
    ResponsesRequest,
};
use crate::config::{GenerationParams, ProviderConfig};
use crate::prompt;
use crate::providers::{AuthMode, ProviderKind};

/// A fully shaped provider call. Built fresh per analysis.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: RequestBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestBody {
    Chat(ChatCompletionRequest),
    Responses(ResponsesRequest),
    Gemini(GenerateContentRequest),
}

/// Shape a request for `provider` carrying `transcript`.
/// `transcript` is expected to have been validated as non-blank already.
#[must_use]
pub fn build(transcript: &str, provider: &ProviderConfig, api_key: &str) -> OutboundRequest {
    let mut url = provider.endpoint_url();
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    match provider.auth_mode {
        AuthMode::Bearer => {
            headers.insert("Authorization".to_string(), format!("Bearer {}", api_key));
        }
        AuthMode::QueryParam => {
            let separator = if url.contains('?') { '&' } else { '?' };
            let key: String = url::form_urlencoded::byte_serialize(api_key.as_bytes()).collect();
            url = format!("{url}{separator}key={key}");
        }
    }

    let body = build_body(transcript, provider.kind, &provider.model, &provider.generation);

    OutboundRequest { url, headers, body }
}

fn build_body(
    transcript: &str,
    kind: ProviderKind,
    model: &str,
    params: &GenerationParams,
) -> RequestBody {
    let prompt = prompt::render(transcript);

    match kind {
        ProviderKind::ChatCompletions => RequestBody::Chat(ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        }),
        ProviderKind::Responses => RequestBody::Responses(ResponsesRequest {
            model: model.to_string(),
            input: prompt,
            temperature: params.temperature,
            max_output_tokens: params.max_output_tokens,
        }),
        ProviderKind::Gemini => {
            let generation_config = if *params == GenerationParams::default() {
                None
            } else {
                Some(GenerationConfig {
                    temperature: params.temperature,
                    max_output_tokens: params.max_output_tokens,
                })
            };

            RequestBody::Gemini(GenerateContentRequest {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
                generation_config,
            })
        }
    }
}
