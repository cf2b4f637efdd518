//! Success half of the response envelope.
//!
//! Every successful response is `{success: true, message?, data?}`; the
//! failure side lives in [`crate::error`].

use serde::Serialize;

/// Uniform success envelope wrapping a typed `data` payload.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// `{success: true, data}`
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// `{success: true, message, data}`
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// `{success: true, message}` with no data payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_envelope() {
        let response = ApiResponse::data(json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], 1);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_message_envelope() {
        let response = ApiResponse::message("Listing deleted successfully");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["message"], "Listing deleted successfully");
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_message_and_data_envelope() {
        let response = ApiResponse::with_message("Created", json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["message"], "Created");
        assert_eq!(value["data"]["ok"], true);
    }
}
