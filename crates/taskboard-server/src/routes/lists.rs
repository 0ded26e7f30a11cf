use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::validate::{self, Validate};

#[derive(serde::Deserialize)]
pub struct ListNameBody {
    pub name: String,
}

impl Validate for ListNameBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "name", &self.name, 100);
    }
}

#[derive(serde::Deserialize)]
pub struct PositionBody {
    pub position: i64,
}

impl Validate for PositionBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::non_negative(details, "position", self.position);
    }
}

/// POST /api/boards/:id/lists — append a list at the end of the board.
pub async fn create_list(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(body): Json<ListNameBody>,
) -> Result<(StatusCode, Json<taskboard_core::list::List>), AppError> {
    body.validate()?;
    let bid = board_id.clone();
    let list = app
        .with_store(move |s| taskboard_core::list::create(s, &bid, &auth.id, &body.name))
        .await?;
    app.publish(&board_id, "list:created", serde_json::to_value(&list)?)
        .await;
    Ok((StatusCode::CREATED, Json(list)))
}

/// PUT /api/lists/:id — rename a list.
pub async fn update_list(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<String>,
    Json(body): Json<ListNameBody>,
) -> Result<Json<taskboard_core::list::List>, AppError> {
    body.validate()?;
    let list = app
        .with_store(move |s| taskboard_core::list::rename(s, &list_id, &auth.id, &body.name))
        .await?;
    app.publish(&list.board_id, "list:updated", serde_json::to_value(&list)?)
        .await;
    Ok(Json(list))
}

/// DELETE /api/lists/:id — delete a list; its tasks go with it and the
/// board's surviving lists are renumbered.
pub async fn delete_list(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = list_id.clone();
    let board_id = app
        .with_store(move |s| {
            let list = taskboard_core::list::get(s.conn(), &id)?;
            taskboard_core::list::delete(s, &id, &auth.id)?;
            Ok(list.board_id)
        })
        .await?;
    app.publish(
        &board_id,
        "list:deleted",
        serde_json::json!({ "id": list_id }),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/lists/:id/position — move a list to a new index on its board.
pub async fn move_list(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<String>,
    Json(body): Json<PositionBody>,
) -> Result<Json<taskboard_core::list::List>, AppError> {
    body.validate()?;
    let list = app
        .with_store(move |s| {
            taskboard_core::list::move_to(s, &list_id, &auth.id, body.position as usize)
        })
        .await?;
    app.publish(&list.board_id, "list:moved", serde_json::to_value(&list)?)
        .await;
    Ok(Json(list))
}
