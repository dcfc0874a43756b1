use std::time::Duration;

use tracing::{debug, info, warn};

use crate::analysis::{build, normalize, OutboundRequest, RawReply, TransportFailure};
use crate::config::{ProviderConfig, TransportConfig};
use crate::error::{AnalyzerError, Result};

const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Outcome of one analysis, with the provider's status when a reply was received.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: Result<String>,
    pub provider_status: Option<u16>,
}

/// Send a transcript to the configured provider and normalize the reply.
///
/// `api_key` is `None` when the secret was missing at start-up; that is
/// reported as a configuration error before anything is sent.
pub async fn analyze(
    transcript: &str,
    provider: &ProviderConfig,
    api_key: Option<&str>,
    client: &reqwest::Client,
    transport: &TransportConfig,
) -> AnalysisOutcome {
    let Some(api_key) = api_key else {
        return AnalysisOutcome {
            result: Err(AnalyzerError::config(format!(
                "Environment variable '{}' not set. Set it with your provider API key.",
                provider.api_key_env
            ))),
            provider_status: None,
        };
    };

    let request = build(transcript, provider, api_key);
    info!(
        provider = %provider.name,
        kind = %provider.kind,
        model = %provider.model,
        "POST {}",
        redact(&request.url)
    );

    let reply = dispatch_with_retries(&request, client, transport).await;
    let provider_status = reply.as_ref().ok().map(|r| r.status);

    let result = normalize(&reply).into_result(provider_status);
    if let Err(ref e) = result {
        warn!(kind = e.kind(), "Analysis failed: {}", truncate(&e.to_string(), 300));
    }

    AnalysisOutcome {
        result,
        provider_status,
    }
}

/// Send one request. Any failure to obtain a status and a body is a transport failure.
pub async fn dispatch(
    request: &OutboundRequest,
    client: &reqwest::Client,
) -> std::result::Result<RawReply, TransportFailure> {
    let mut builder = client.post(&request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    // reqwest errors embed the URL, which carries the key in query-param mode.
    let response = builder
        .json(&request.body)
        .send()
        .await
        .map_err(|e| TransportFailure {
            message: format!("Request failed: {}", e.without_url()),
        })?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| TransportFailure {
        message: format!("Failed to read response body: {}", e.without_url()),
    })?;

    debug!(status, body_len = body.len(), "Provider responded");

    Ok(RawReply { status, body })
}

/// [`dispatch`], retrying transport failures up to `max_retries` times with
/// exponential backoff. Replies with any HTTP status are returned as-is.
pub async fn dispatch_with_retries(
    request: &OutboundRequest,
    client: &reqwest::Client,
    transport: &TransportConfig,
) -> std::result::Result<RawReply, TransportFailure> {
    let mut attempt = 0;
    loop {
        match dispatch(request, client).await {
            Ok(reply) => return Ok(reply),
            Err(failure) if attempt < transport.max_retries => {
                let delay = retry_delay(transport.retry_delay_ms, attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = transport.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "{}; retrying",
                    failure.message
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}

fn retry_delay(base_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS))
}

fn redact(url: &str) -> String {
    match url.find("key=") {
        Some(pos) => format!("{}key=***", &url[..pos]),
        None => url.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
