use thiserror::Error;

/// Message used when a failed response carries no readable error text.
pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-success status that was not recovered by a token refresh.
    #[error("{message}")]
    Request { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Failed to encode request body: {0}")]
    Encode(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Build a request error from a failed response body.
    ///
    /// The body is parsed as JSON and the `msg` field is preferred, then
    /// `error`. Anything else yields the generic failure message.
    pub fn from_status(status: u16, body: &str) -> Self {
        ApiError::Request {
            status,
            message: extract_message(body).unwrap_or_else(|| GENERIC_FAILURE.to_string()),
        }
    }

    /// HTTP status of the failed response, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Human-readable message, without any prefix.
    pub fn message(&self) -> String {
        match self {
            ApiError::Request { message, .. } => message.clone(),
            ApiError::Network(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["msg", "error"]
        .iter()
        .filter_map(|field| value.get(field))
        .find_map(|v| match v {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Null
            | serde_json::Value::Bool(false)
            | serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        })
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msg_field_wins() {
        let err = ApiError::from_status(400, r#"{"msg": "bad input", "error": "ignored"}"#);
        assert_eq!(err.to_string(), "bad input");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_error_field_fallback() {
        let err = ApiError::from_status(500, r#"{"error": "db down"}"#);
        assert_eq!(err.message(), "db down");
    }

    #[test]
    fn test_generic_message() {
        assert_eq!(ApiError::from_status(502, "<html>gateway</html>").message(), GENERIC_FAILURE);
        assert_eq!(ApiError::from_status(404, "").message(), GENERIC_FAILURE);
        assert_eq!(ApiError::from_status(400, r#"{"detail": "x"}"#).message(), GENERIC_FAILURE);
        assert_eq!(ApiError::from_status(400, r#"["msg"]"#).message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_unauthorized() {
        assert!(ApiError::from_status(401, "").is_unauthorized());
        assert!(!ApiError::Network("timed out".into()).is_unauthorized());
        assert_eq!(ApiError::Network("timed out".into()).message(), "timed out");
    }
}
