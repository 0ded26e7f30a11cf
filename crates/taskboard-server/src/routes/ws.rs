//! WebSocket subscription endpoint.
//!
//! Clients connect to `/ws/boards/{id}?token=<bearer token>` and receive
//! every event published for that board. The socket is listen-only:
//! inbound frames other than close are ignored.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use taskboard_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
}

/// GET /ws/boards/:id — upgrade after verifying the token and board
/// ownership, then feed hub messages to the socket.
pub async fn board_ws(
    ws: WebSocketUpgrade,
    Path(board_id): Path<String>,
    Query(q): Query<WsQuery>,
    State(app): State<AppState>,
) -> Result<Response, AppError> {
    let token = q.token.ok_or(CoreError::TokenInvalid)?;
    let claims = app.signer.verify(&token)?;

    let bid = board_id.clone();
    app.with_store(move |s| {
        let board = taskboard_core::board::get(s.conn(), &bid)?;
        if board.owner_id != claims.user_id {
            return Err(CoreError::AccessDenied);
        }
        Ok(())
    })
    .await?;

    Ok(ws.on_upgrade(move |socket| run_session(socket, board_id, app)))
}

async fn run_session(socket: WebSocket, board_id: String, app: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_id, mut hub_rx) = app.hub.lock().await.register(&board_id);
    tracing::debug!(%board_id, client_id, "websocket client subscribed");

    // Write side: forward hub messages until the socket drops.
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = hub_rx.recv().await {
            if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Read side: drain frames so close and ping are handled.
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    app.hub.lock().await.unregister(&board_id, client_id);
    tracing::debug!(%board_id, client_id, "websocket client disconnected");
}
