use super::SchedulerError;
use serde::{Deserialize, Serialize};

/// Serializable error representation for JSON output (CLI `--json` errors, logs).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SerializableError {
    /// Error kind as string.
    pub kind: String,
    /// User-facing error message.
    pub message: String,
    /// Error code.
    pub code: u16,
    /// Context chain (operation history).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    /// Source error if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Box<SerializableError>>,
}

impl From<&SchedulerError> for SerializableError {
    fn from(error: &SchedulerError) -> Self {
        let kind = match error {
            SchedulerError::Store { .. } => "Store",
            SchedulerError::Engine { .. } => "Engine",
            SchedulerError::Queue { .. } => "Queue",
            SchedulerError::Other { .. } => "Other",
        }
        .to_string();

        let context: Vec<String> = error.chain().iter().map(|c| c.message.clone()).collect();
        let source = error
            .error_source()
            .map(|s| Box::new(SerializableError::from(s.as_ref())));

        Self {
            kind,
            message: error.user_message(),
            code: error.code(),
            context,
            source,
        }
    }
}

impl SchedulerError {
    /// Convert error to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(SerializableError::from(self))
            .unwrap_or_else(|_| serde_json::json!({ "error": "Serialization failed" }))
    }

    /// Convert error to a JSON string.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(&SerializableError::from(self))
            .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string())
    }

    /// Convert error to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(&SerializableError::from(self))
            .unwrap_or_else(|_| r#"{"error":"Serialization failed"}"#.to_string())
    }
}
