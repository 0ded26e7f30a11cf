use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use taskboard_core::activity::ActivityPage;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::routes::boards::PageQuery;
use crate::state::AppState;

/// GET /api/boards/:id/activities — the board's audit feed, newest first.
pub async fn board_activities(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ActivityPage>, AppError> {
    let page = q.page.unwrap_or(1);
    let limit = q.limit.unwrap_or(20).clamp(1, 100);
    let result = app
        .with_store(move |s| {
            taskboard_core::activity::board_page(s, &board_id, &auth.id, page, limit)
        })
        .await?;
    Ok(Json(result))
}
