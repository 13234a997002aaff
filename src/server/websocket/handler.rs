use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::connection::ConnectionManager;
use super::messages::{parse_client_frame, ClientRequest, ServerMessage};
use crate::server::session::Session;
use crate::server::state::GuardedConnectionManager;

/// `GET /ws`. The access token travels as `?token=`; the session extractor
/// answers 401 before the upgrade when it is missing or invalid.
pub async fn ws_handler(
    session: Session,
    State(connection_manager): State<GuardedConnectionManager>,
    ws: WebSocketUpgrade,
) -> Response {
    let user_id = session.user_id;
    ws.on_upgrade(move |socket| serve_socket(socket, user_id, connection_manager))
}

async fn serve_socket(socket: WebSocket, user_id: i64, connections: Arc<ConnectionManager>) {
    let (connection_id, outgoing) = connections.register(user_id).await;
    debug!("Socket {} opened for user {}", connection_id, user_id);

    let (sink, stream) = socket.split();
    let hello = ServerMessage::Connected {
        connection_id,
        server_version: format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")),
    };
    let writer = tokio::spawn(write_frames(sink, outgoing, hello));

    read_frames(stream, user_id, connection_id, &connections).await;

    writer.abort();
    connections.unregister(user_id, connection_id).await;
    debug!("Socket {} closed for user {}", connection_id, user_id);
}

/// Drains the connection's channel into the socket, starting with `hello`.
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut outgoing: mpsc::Receiver<ServerMessage>,
    hello: ServerMessage,
) {
    let mut next = Some(hello);
    while let Some(message) = next {
        let json = match serde_json::to_string(&message) {
            Ok(json) => json,
            Err(e) => {
                warn!("Dropping unserializable {} frame: {}", message.type_name(), e);
                next = outgoing.recv().await;
                continue;
            }
        };
        if sink.send(Message::Text(json.into())).await.is_err() {
            return;
        }
        next = outgoing.recv().await;
    }
}

async fn read_frames(
    mut stream: SplitStream<WebSocket>,
    user_id: i64,
    connection_id: u64,
    connections: &ConnectionManager,
) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Socket {} errored: {}", connection_id, e);
                break;
            }
        };
        let reply = reply_to(&text);
        let _ = connections
            .send_to_connection(user_id, connection_id, reply)
            .await;
    }
}

/// Every client frame gets exactly one answer.
fn reply_to(text: &str) -> ServerMessage {
    match parse_client_frame(text) {
        Ok(ClientRequest::Ping) => ServerMessage::Pong,
        Err(error) => {
            debug!("Rejected client frame: {:?}", error);
            error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::websocket::messages::ErrorCode;

    #[test]
    fn ping_gets_pong() {
        assert_eq!(reply_to(r#"{"type":"ping"}"#), ServerMessage::Pong);
    }

    #[test]
    fn bad_frames_get_errors() {
        assert!(matches!(
            reply_to(r#"{"type":"subscribe"}"#),
            ServerMessage::Error {
                code: ErrorCode::UnknownType,
                ..
            }
        ));
        assert!(matches!(
            reply_to("{"),
            ServerMessage::Error {
                code: ErrorCode::ParseError,
                ..
            }
        ));
    }
}
