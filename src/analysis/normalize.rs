//! Turn a raw provider reply into one answer string or a classified failure.
//!
//! Classification runs in a fixed order and the first match wins:
//!
//! 1. transport failure (no reply at all)
//! 2. non-2xx status, surfaced with the provider's raw body
//! 3. an explicit `error` field in a JSON body, whatever the status
//! 4. the [`PROBES`] table, first non-empty hit wins
//! 5. no probe hit: the whole body, pretty-printed, is the answer
//! 6. body is not JSON at all
//!
//! Steps 2 and 3 come before any JSON probing so a provider's own error text
//! always reaches the caller.

use serde_json::Value;

use crate::error::AnalyzerError;

/// Untouched transport result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

/// The provider could not be reached or its body could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    ProviderHttp,
    ProviderReported,
    MalformedBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Success { text: String },
    Failure { kind: FailureKind, message: String },
}

/// One known place a provider puts its generated text.
#[derive(Debug, Clone, Copy)]
pub struct Probe {
    pub name: &'static str,
    /// RFC 6901 pointer into the parsed body.
    pub pointer: &'static str,
}

/// Extraction paths in priority order. More specific envelopes come first so a
/// looser path that happens to exist alongside them never wins. New shapes are
/// appended.
pub const PROBES: &[Probe] = &[
    Probe {
        name: "gemini_candidate",
        pointer: "/candidates/0/content/parts/0/text",
    },
    Probe {
        name: "responses_output",
        pointer: "/output/0/content/0/text",
    },
    Probe {
        name: "responses_output_text",
        pointer: "/output_text",
    },
    Probe {
        name: "chat_message",
        pointer: "/choices/0/message/content",
    },
    Probe {
        name: "legacy_completion",
        pointer: "/choices/0/text",
    },
];

impl Probe {
    /// The value at this probe's path, if present and non-empty.
    #[must_use]
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        body.pointer(self.pointer).filter(|v| !is_empty(v))
    }
}

/// Classify a reply. Deterministic: the same input always yields the same result.
#[must_use]
pub fn normalize(reply: &Result<RawReply, TransportFailure>) -> ExtractionResult {
    let raw = match reply {
        Ok(raw) => raw,
        Err(failure) => {
            return ExtractionResult::failure(FailureKind::Transport, failure.message.clone())
        }
    };

    if !(200..300).contains(&raw.status) {
        return ExtractionResult::failure(FailureKind::ProviderHttp, raw.body.clone());
    }

    let body: Value = match serde_json::from_str(&raw.body) {
        Ok(v) => v,
        Err(_) => return ExtractionResult::failure(FailureKind::MalformedBody, raw.body.clone()),
    };

    if let Some(error) = body.get("error").filter(|e| is_reported_error(e)) {
        return ExtractionResult::failure(FailureKind::ProviderReported, error_message(error));
    }

    for probe in PROBES {
        if let Some(value) = probe.extract(&body) {
            tracing::debug!(probe = probe.name, "Extracted provider text");
            return ExtractionResult::success(stringify(value));
        }
    }

    tracing::debug!("No probe matched, returning serialized body");
    ExtractionResult::success(pretty(&body))
}

impl ExtractionResult {
    fn success(text: String) -> Self {
        Self::Success { text }
    }

    fn failure(kind: FailureKind, message: String) -> Self {
        Self::Failure { kind, message }
    }

    /// Convert into the crate error type for the server boundary.
    /// `status` is the provider's HTTP status, used for `ProviderHttp`.
    pub fn into_result(self, status: Option<u16>) -> Result<String, AnalyzerError> {
        match self {
            Self::Success { text } => Ok(text),
            Self::Failure { kind, message } => Err(match kind {
                FailureKind::Transport => AnalyzerError::Transport { message },
                FailureKind::ProviderHttp => AnalyzerError::ProviderHttp {
                    status: status.unwrap_or(0),
                    message,
                },
                FailureKind::ProviderReported => AnalyzerError::ProviderReported { message },
                FailureKind::MalformedBody => AnalyzerError::MalformedBody { message },
            }),
        }
    }
}

/// Falsy or empty `error` values (`false`, `0`, `""`, `{}`, `[]`) are not errors.
fn is_reported_error(error: &Value) -> bool {
    match error {
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64() != Some(0.0),
        other => !is_empty(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Structured values are serialized so the answer is always a string.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => pretty(other),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(o) => match o.get("message") {
            Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
            _ => pretty(error),
        },
        other => pretty(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(status: u16, body: Value) -> Result<RawReply, TransportFailure> {
        Ok(RawReply {
            status,
            body: body.to_string(),
        })
    }

    fn text(result: ExtractionResult) -> String {
        match result {
            ExtractionResult::Success { text } => text,
            other => panic!("Expected success, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_failure() {
        let reply = Err(TransportFailure {
            message: "connection refused".to_string(),
        });
        assert_eq!(
            normalize(&reply),
            ExtractionResult::Failure {
                kind: FailureKind::Transport,
                message: "connection refused".to_string(),
            }
        );
    }

    #[test]
    fn test_http_error_surfaces_raw_body() {
        for (status, body) in [
            (400, r#"{"error":{"message":"bad key"}}"#),
            (429, "rate limited"),
            (503, ""),
            (302, "<html>moved</html>"),
        ] {
            let reply = Ok(RawReply {
                status,
                body: body.to_string(),
            });
            assert_eq!(
                normalize(&reply),
                ExtractionResult::Failure {
                    kind: FailureKind::ProviderHttp,
                    message: body.to_string(),
                },
                "status {status}"
            );
        }
    }

    #[test]
    fn test_error_field_with_200_status() {
        let reply = ok(200, json!({"error": {"message": "quota exceeded", "code": 429}}));
        assert_eq!(
            normalize(&reply),
            ExtractionResult::Failure {
                kind: FailureKind::ProviderReported,
                message: "quota exceeded".to_string(),
            }
        );
    }

    #[test]
    fn test_error_field_without_message_is_serialized() {
        let reply = ok(200, json!({"error": {"code": 500}}));
        let ExtractionResult::Failure { kind, message } = normalize(&reply) else {
            panic!("Expected failure");
        };
        assert_eq!(kind, FailureKind::ProviderReported);
        assert!(message.contains("\"code\": 500"));

        let reply = ok(200, json!({"error": "plain text"}));
        assert_eq!(
            normalize(&reply),
            ExtractionResult::Failure {
                kind: FailureKind::ProviderReported,
                message: "plain text".to_string(),
            }
        );
    }

    #[test]
    fn test_falsy_error_fields_are_ignored() {
        for error in [json!(false), json!(""), json!(0), json!(0.0), json!({}), json!([])] {
            let reply = ok(
                200,
                json!({"error": error, "choices": [{"message": {"content": "Good opening"}}]}),
            );
            assert_eq!(text(normalize(&reply)), "Good opening", "error = {error}");
        }
    }

    #[test]
    fn test_truthy_scalar_error_fields_are_reported() {
        for (error, message) in [(json!(true), "true"), (json!(1), "1")] {
            let reply = ok(200, json!({"error": error, "output_text": "ignored"}));
            assert_eq!(
                normalize(&reply),
                ExtractionResult::Failure {
                    kind: FailureKind::ProviderReported,
                    message: message.to_string(),
                }
            );
        }
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let reply = ok(200, json!({"error": null, "output_text": "fine"}));
        assert_eq!(text(normalize(&reply)), "fine");
    }

    #[test]
    fn test_gemini_candidate_probe() {
        let reply = ok(
            200,
            json!({"candidates": [{"content": {"parts": [{"text": "Great call"}], "role": "model"}}]}),
        );
        assert_eq!(text(normalize(&reply)), "Great call");
    }

    #[test]
    fn test_responses_output_probe() {
        let reply = ok(
            200,
            json!({"output": [{"type": "message", "content": [{"type": "output_text", "text": "Great call"}]}]}),
        );
        assert_eq!(text(normalize(&reply)), "Great call");
    }

    #[test]
    fn test_output_text_probe() {
        let reply = ok(200, json!({"output_text": "Flat answer"}));
        assert_eq!(text(normalize(&reply)), "Flat answer");
    }

    #[test]
    fn test_chat_message_probe() {
        let reply = ok(200, json!({"choices": [{"message": {"content": "Good opening"}}]}));
        assert_eq!(text(normalize(&reply)), "Good opening");
    }

    #[test]
    fn test_legacy_completion_probe() {
        let reply = ok(200, json!({"choices": [{"text": "Old style"}]}));
        assert_eq!(text(normalize(&reply)), "Old style");
    }

    #[test]
    fn test_specific_shape_beats_looser_one() {
        let reply = ok(
            200,
            json!({
                "output": [{"content": [{"text": "structured"}]}],
                "output_text": "flat",
                "choices": [{"text": "legacy"}]
            }),
        );
        assert_eq!(text(normalize(&reply)), "structured");

        let reply = ok(
            200,
            json!({
                "choices": [{"message": {"content": "chat"}, "text": "legacy"}]
            }),
        );
        assert_eq!(text(normalize(&reply)), "chat");
    }

    #[test]
    fn test_empty_values_fall_through() {
        let reply = ok(
            200,
            json!({
                "output": [{"content": [{"text": "  "}]}],
                "output_text": "",
                "choices": [{"message": {"content": null}, "text": "fallback hit"}]
            }),
        );
        assert_eq!(text(normalize(&reply)), "fallback hit");
    }

    #[test]
    fn test_structured_match_is_serialized() {
        let reply = ok(200, json!({"output_text": {"score": 7}}));
        let answer = text(normalize(&reply));
        let round: Value = serde_json::from_str(&answer).unwrap();
        assert_eq!(round, json!({"score": 7}));
    }

    #[test]
    fn test_unknown_shape_falls_back_to_whole_body() {
        let body = json!({"data": {"answer": "somewhere else"}});
        let answer = text(normalize(&ok(200, body.clone())));
        assert_eq!(answer, serde_json::to_string_pretty(&body).unwrap());
    }

    #[test]
    fn test_non_object_json_falls_back() {
        let reply = Ok(RawReply {
            status: 200,
            body: "\"just a string\"".to_string(),
        });
        assert_eq!(text(normalize(&reply)), "\"just a string\"");
    }

    #[test]
    fn test_malformed_body() {
        let reply = Ok(RawReply {
            status: 200,
            body: "<html>oops</html>".to_string(),
        });
        assert_eq!(
            normalize(&reply),
            ExtractionResult::Failure {
                kind: FailureKind::MalformedBody,
                message: "<html>oops</html>".to_string(),
            }
        );
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let reply = ok(200, json!({"unexpected": [1, 2, 3], "nested": {"a": "b"}}));
        assert_eq!(normalize(&reply), normalize(&reply));
    }

    #[test]
    fn test_into_result_maps_kinds() {
        let err = ExtractionResult::Failure {
            kind: FailureKind::ProviderHttp,
            message: "denied".to_string(),
        }
        .into_result(Some(403))
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::ProviderHttp { status: 403, .. }));
        assert_eq!(err.to_string(), "denied");

        let ok = ExtractionResult::Success {
            text: "fine".to_string(),
        }
        .into_result(None)
        .unwrap();
        assert_eq!(ok, "fine");
    }
}
