use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    /// Rate limit / quota exhaustion. The scanner reacts by switching
    /// the session into simulation mode; everything else is retried or
    /// surfaced as a failure.
    #[error("service quota exhausted")]
    QuotaExhausted,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },
}

impl AiError {
    pub fn is_quota(&self) -> bool {
        matches!(self, AiError::QuotaExhausted)
    }

    /// Translate a provider error response into the canonical taxonomy.
    ///
    /// Quota exhaustion arrives in several shapes: HTTP 429, a "quota"
    /// or "RESOURCE_EXHAUSTED" marker in the top-level message, or the
    /// same markers nested inside the provider's `error` object. All of
    /// them collapse to [`AiError::QuotaExhausted`] here so call sites
    /// never re-derive the heuristic.
    pub fn classify_provider_error(status: u16, body: &str) -> AiError {
        if status == 429 || looks_like_quota(body) {
            return AiError::QuotaExhausted;
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            let nested = &value["error"];
            let code = nested["code"].as_u64();
            let nested_status = nested["status"].as_str().unwrap_or_default();
            let nested_msg = nested["message"].as_str().unwrap_or_default();
            if code == Some(429)
                || nested_status == "RESOURCE_EXHAUSTED"
                || looks_like_quota(nested_msg)
            {
                return AiError::QuotaExhausted;
            }
        }

        AiError::Service {
            status,
            message: body.chars().take(200).collect(),
        }
    }
}

fn looks_like_quota(message: &str) -> bool {
    message.contains("429")
        || message.to_lowercase().contains("quota")
        || message.contains("RESOURCE_EXHAUSTED")
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        // Transport failures have no provider payload to inspect, but a
        // 429 status can still surface here via error_for_status.
        if err.status().map(|s| s.as_u16()) == Some(429) {
            AiError::QuotaExhausted
        } else {
            AiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_429_is_quota() {
        assert!(AiError::classify_provider_error(429, "").is_quota());
    }

    #[test]
    fn test_message_markers_are_quota() {
        assert!(AiError::classify_provider_error(400, "Quota exceeded for project").is_quota());
        assert!(AiError::classify_provider_error(500, "error 429 upstream").is_quota());
        assert!(AiError::classify_provider_error(503, "RESOURCE_EXHAUSTED").is_quota());
    }

    #[test]
    fn test_nested_error_object_is_quota() {
        let body = r#"{"error":{"code":429,"message":"rate limited","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(AiError::classify_provider_error(400, body).is_quota());

        let nested_msg = r#"{"error":{"code":400,"message":"Daily quota reached","status":"INVALID"}}"#;
        assert!(AiError::classify_provider_error(400, nested_msg).is_quota());
    }

    #[test]
    fn test_other_errors_stay_service() {
        let err = AiError::classify_provider_error(500, "internal error");
        assert!(!err.is_quota());
        match err {
            AiError::Service { status, .. } => assert_eq!(status, 500),
            other => panic!("expected Service, got {other:?}"),
        }
    }
}
