use crate::mirror::Role;
use crate::router::Command;
use crate::session::{CommandError, Envelope, Snapshot};
use serde::{Deserialize, Serialize};

/// Frames a client sends over the WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        channel: String,
        #[serde(default)]
        role: Role,
    },
    Leave,
    Command {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        command: Command,
    },
}

/// Frames the server sends over the WebSocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Full state, on join and after falling behind
    Snapshot { snapshot: Snapshot },
    Event { envelope: Envelope },
    Ack { request_id: Option<String> },
    /// Sent only to the connection whose command failed
    Rejected {
        request_id: Option<String>,
        code: String,
        message: String,
    },
    Left { channel: String },
}

impl ServerMessage {
    pub fn rejected(request_id: Option<String>, err: &CommandError) -> Self {
        ServerMessage::Rejected {
            request_id,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Parse a text frame. On failure the error carries the frame's `requestId`
/// when one could be recovered, so the rejection can be correlated.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, (Option<String>, CommandError)> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
        (
            None,
            CommandError::InvalidArgument(format!("malformed message: {}", e)),
        )
    })?;

    let request_id = value
        .get("requestId")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    serde_json::from_value(value).map_err(|e| {
        (
            request_id,
            CommandError::InvalidArgument(format!("malformed message: {}", e)),
        )
    })
}
