//! Frames exchanged over `/ws`.
//!
//! Every frame is a JSON envelope `{"type": ..., "payload": ...}`; frames
//! without data (`ping`, `pong`) carry no payload.

use serde::{Deserialize, Serialize};

use crate::notifications::Notification;

/// Server -> client frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every socket.
    Connected {
        connection_id: u64,
        server_version: String,
    },
    Pong,
    Error { code: ErrorCode, message: String },
    Notification(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ParseError,
    UnknownType,
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            message: message.into(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::Connected { .. } => "connected",
            ServerMessage::Pong => "pong",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Notification(_) => "notification",
        }
    }
}

/// Client -> server requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    Ping,
}

#[derive(Deserialize)]
struct ClientEnvelope {
    #[serde(rename = "type")]
    kind: String,
}

/// Decodes a text frame. Failures come back as the error frame to send.
pub fn parse_client_frame(text: &str) -> Result<ClientRequest, ServerMessage> {
    let envelope: ClientEnvelope = serde_json::from_str(text).map_err(|e| {
        ServerMessage::error(
            ErrorCode::ParseError,
            format!("Invalid message format: {}", e),
        )
    })?;
    match envelope.kind.as_str() {
        "ping" => Ok(ClientRequest::Ping),
        other => Err(ServerMessage::error(
            ErrorCode::UnknownType,
            format!("Unknown message type: {}", other),
        )),
    }
}
