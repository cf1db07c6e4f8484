use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing API credential (set OPENAI_API_KEY or add it to config.yml)")]
    MissingCredential,
    #[error("insufficient quota")]
    QuotaExhausted,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    /// Classify a raw provider error body. The hosted API signals exhausted
    /// credit with an `insufficient_quota` code inside the JSON body.
    pub fn from_provider_body(body: &str) -> Self {
        if body.contains("insufficient_quota") {
            ApiError::QuotaExhausted
        } else {
            ApiError::Internal(body.to_string())
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, ApiError::QuotaExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_quota_errors() {
        let body = r#"{"error":{"code":"insufficient_quota","message":"You exceeded your current quota"}}"#;
        assert!(ApiError::from_provider_body(body).is_quota());

        let other = r#"{"error":{"code":"invalid_api_key"}}"#;
        assert!(!ApiError::from_provider_body(other).is_quota());
    }
}
