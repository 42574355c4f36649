// JSON bodies shared by the non-HTML endpoints
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_omits_empty_message() {
        let json = serde_json::to_value(ErrorResponse::new("json_parse_error")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "json_parse_error"}));

        let json = serde_json::to_value(ErrorResponse::with_message("invalid_input", "email is required")).unwrap();
        assert_eq!(json["message"], "email is required");
    }
}
