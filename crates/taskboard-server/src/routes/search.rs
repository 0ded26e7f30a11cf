use axum::extract::{Query, State};
use axum::{Extension, Json};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::validate::{self, Validate};

#[derive(serde::Deserialize)]
pub struct SearchQuery {
    pub board_id: String,
    pub q: String,
}

impl Validate for SearchQuery {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "board_id", &self.board_id, 100);
        validate::length(details, "q", &self.q, 200);
    }
}

/// GET /api/search?board_id=&q= — substring search over a board's tasks.
pub async fn search_tasks(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    query.validate()?;
    let SearchQuery { board_id, q } = query;
    let hits = app
        .with_store(move |s| taskboard_core::task::search(s, &board_id, &auth.id, &q))
        .await?;
    Ok(Json(serde_json::json!({ "tasks": hits })))
}
