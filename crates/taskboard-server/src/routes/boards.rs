use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::validate::{self, Validate};

#[derive(serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(serde::Deserialize)]
pub struct CreateBoardBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for CreateBoardBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "name", &self.name, 100);
        validate::optional_max(details, "description", self.description.as_deref(), 500);
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateBoardBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for UpdateBoardBody {
    fn check(&self, details: &mut Vec<String>) {
        if let Some(name) = self.name.as_deref() {
            validate::length(details, "name", name, 100);
        }
        validate::optional_max(details, "description", self.description.as_deref(), 500);
    }
}

/// GET /api/boards — the caller's boards, paginated, newest first.
pub async fn list_boards(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(q): Query<PageQuery>,
) -> Result<Json<taskboard_core::board::BoardPage>, AppError> {
    let page = q.page.unwrap_or(1);
    let limit = q.limit.unwrap_or(10).clamp(1, 100);
    let result = app
        .with_store(move |s| taskboard_core::board::list_page(s, &auth.id, page, limit))
        .await?;
    Ok(Json(result))
}

/// POST /api/boards — create a board owned by the caller.
pub async fn create_board(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateBoardBody>,
) -> Result<(StatusCode, Json<taskboard_core::board::Board>), AppError> {
    body.validate()?;
    let CreateBoardBody { name, description } = body;
    let board = app
        .with_store(move |s| {
            taskboard_core::board::create(s, &auth.id, &name, description.as_deref())
        })
        .await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// GET /api/boards/:id — full board tree (lists with tasks, in order).
pub async fn get_board(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<Json<taskboard_core::board::BoardDetail>, AppError> {
    let detail = app
        .with_store(move |s| taskboard_core::board::detail(s, &board_id, &auth.id))
        .await?;
    Ok(Json(detail))
}

/// PUT /api/boards/:id — rename or re-describe a board.
pub async fn update_board(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(board_id): Path<String>,
    Json(body): Json<UpdateBoardBody>,
) -> Result<Json<taskboard_core::board::Board>, AppError> {
    body.validate()?;
    let UpdateBoardBody { name, description } = body;
    let id = board_id.clone();
    let board = app
        .with_store(move |s| {
            taskboard_core::board::update(s, &id, &auth.id, name.as_deref(), description.as_deref())
        })
        .await?;
    app.publish(&board_id, "board:updated", serde_json::to_value(&board)?)
        .await;
    Ok(Json(board))
}

/// DELETE /api/boards/:id — delete a board and everything under it.
pub async fn delete_board(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(board_id): Path<String>,
) -> Result<StatusCode, AppError> {
    app.with_store(move |s| taskboard_core::board::delete(s, &board_id, &auth.id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
