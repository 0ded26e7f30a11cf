use std::sync::{Arc, Mutex};

use taskboard_core::auth::TokenSigner;
use taskboard_core::store::Store;

use crate::error::AppError;
use crate::hub::BoardHub;

/// Shared application state passed to all route handlers.
///
/// The store sits behind a blocking mutex: SQLite work runs on the
/// blocking pool via [`AppState::with_store`], and the mutex plus the
/// store's transactions serialize concurrent reorders on the same
/// sibling group. The broadcast hub is async and locked only briefly.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Store>>,
    pub hub: Arc<tokio::sync::Mutex<BoardHub>>,
    pub signer: Arc<TokenSigner>,
}

impl AppState {
    pub fn new(store: Store, signer: TokenSigner) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            hub: Arc::new(tokio::sync::Mutex::new(BoardHub::new())),
            signer: Arc::new(signer),
        }
    }

    /// Run a storage operation on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Store) -> taskboard_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let out = tokio::task::spawn_blocking(move || {
            let mut guard = store.lock().unwrap_or_else(|e| e.into_inner());
            f(&mut guard)
        })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("storage task join error: {e}")))??;
        Ok(out)
    }

    /// Push an event to every WebSocket client subscribed to the board.
    pub async fn publish(&self, board_id: &str, event: &str, data: serde_json::Value) {
        let msg = serde_json::json!({
            "event": event,
            "board_id": board_id,
            "data": data,
        })
        .to_string();
        self.hub.lock().await.broadcast(board_id, &msg);
    }
}
