use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use taskboard_core::task::TaskDetail;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::validate::{self, Validate};

#[derive(serde::Deserialize)]
pub struct CreateTaskBody {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for CreateTaskBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "title", &self.title, 200);
        validate::optional_max(details, "description", self.description.as_deref(), 1000);
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateTaskBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for UpdateTaskBody {
    fn check(&self, details: &mut Vec<String>) {
        if let Some(title) = self.title.as_deref() {
            validate::length(details, "title", title, 200);
        }
        validate::optional_max(details, "description", self.description.as_deref(), 1000);
    }
}

#[derive(serde::Deserialize)]
pub struct MoveTaskBody {
    #[serde(rename = "listId")]
    pub list_id: String,
    pub position: i64,
}

impl Validate for MoveTaskBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "listId", &self.list_id, 100);
        validate::non_negative(details, "position", self.position);
    }
}

#[derive(serde::Deserialize)]
pub struct AssignBody {
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl Validate for AssignBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::length(details, "userId", &self.user_id, 100);
    }
}

/// A task's board, resolved through its list. Used for event routing.
fn board_of(store: &taskboard_core::store::Store, list_id: &str) -> taskboard_core::Result<String> {
    Ok(taskboard_core::list::get(store.conn(), list_id)?.board_id)
}

/// POST /api/lists/:id/tasks — append a task at the end of the list.
pub async fn create_task(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(list_id): Path<String>,
    Json(body): Json<CreateTaskBody>,
) -> Result<(StatusCode, Json<TaskDetail>), AppError> {
    body.validate()?;
    let CreateTaskBody { title, description } = body;
    let (board_id, task) = app
        .with_store(move |s| {
            let board_id = board_of(s, &list_id)?;
            let task =
                taskboard_core::task::create(s, &list_id, &auth.id, &title, description.as_deref())?;
            Ok((board_id, task))
        })
        .await?;
    app.publish(&board_id, "task:created", serde_json::to_value(&task)?)
        .await;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/:id — a task with creator and assignees.
pub async fn get_task(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDetail>, AppError> {
    let task = app
        .with_store(move |s| taskboard_core::task::detail(s, &task_id, &auth.id))
        .await?;
    Ok(Json(task))
}

/// PUT /api/tasks/:id — retitle or re-describe a task.
pub async fn update_task(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateTaskBody>,
) -> Result<Json<TaskDetail>, AppError> {
    body.validate()?;
    let UpdateTaskBody { title, description } = body;
    let (board_id, task) = app
        .with_store(move |s| {
            let task = taskboard_core::task::update(
                s,
                &task_id,
                &auth.id,
                title.as_deref(),
                description.as_deref(),
            )?;
            let board_id = board_of(s, &task.list_id)?;
            Ok((board_id, task))
        })
        .await?;
    app.publish(&board_id, "task:updated", serde_json::to_value(&task)?)
        .await;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id — delete a task; its list is renumbered.
pub async fn delete_task(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = task_id.clone();
    let board_id = app
        .with_store(move |s| {
            let task = taskboard_core::task::get(s.conn(), &id)?;
            let board_id = board_of(s, &task.list_id)?;
            taskboard_core::task::delete(s, &id, &auth.id)?;
            Ok(board_id)
        })
        .await?;
    app.publish(
        &board_id,
        "task:deleted",
        serde_json::json!({ "id": task_id }),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/tasks/:id/move — move a task within or across lists.
pub async fn move_task(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(body): Json<MoveTaskBody>,
) -> Result<Json<TaskDetail>, AppError> {
    body.validate()?;
    let MoveTaskBody { list_id, position } = body;
    let (board_id, task) = app
        .with_store(move |s| {
            let task = taskboard_core::task::move_to(
                s,
                &task_id,
                &auth.id,
                &list_id,
                position as usize,
            )?;
            let board_id = board_of(s, &task.list_id)?;
            Ok((board_id, task))
        })
        .await?;
    app.publish(&board_id, "task:moved", serde_json::to_value(&task)?)
        .await;
    Ok(Json(task))
}

/// POST /api/tasks/:id/assign — assign a user to a task.
pub async fn assign_user(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(task_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Result<Json<TaskDetail>, AppError> {
    body.validate()?;
    let (board_id, task) = app
        .with_store(move |s| {
            let task = taskboard_core::task::assign(s, &task_id, &auth.id, &body.user_id)?;
            let board_id = board_of(s, &task.list_id)?;
            Ok((board_id, task))
        })
        .await?;
    app.publish(&board_id, "task:assigned", serde_json::to_value(&task)?)
        .await;
    Ok(Json(task))
}

/// DELETE /api/tasks/:id/unassign/:user_id — remove an assignment.
pub async fn unassign_user(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((task_id, user_id)): Path<(String, String)>,
) -> Result<Json<TaskDetail>, AppError> {
    let (board_id, task) = app
        .with_store(move |s| {
            let task = taskboard_core::task::unassign(s, &task_id, &auth.id, &user_id)?;
            let board_id = board_of(s, &task.list_id)?;
            Ok((board_id, task))
        })
        .await?;
    app.publish(&board_id, "task:unassigned", serde_json::to_value(&task)?)
        .await;
    Ok(Json(task))
}
