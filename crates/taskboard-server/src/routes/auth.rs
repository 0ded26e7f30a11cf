use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::validate::{self, Validate};

#[derive(serde::Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Validate for RegisterBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::email(details, &self.email);
        validate::min_length(details, "password", &self.password, 6);
        validate::length(details, "name", &self.name, 100);
    }
}

/// POST /api/auth/register — create an account and issue a token.
pub async fn register(
    State(app): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    body.validate()?;
    let RegisterBody {
        email,
        password,
        name,
    } = body;
    let user = app
        .with_store(move |s| taskboard_core::user::register(s, &email, &password, &name))
        .await?;
    let token = app.signer.issue(&user);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "user": user, "token": token })),
    ))
}

#[derive(serde::Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl Validate for LoginBody {
    fn check(&self, details: &mut Vec<String>) {
        validate::email(details, &self.email);
        validate::length(details, "password", &self.password, 200);
    }
}

/// POST /api/auth/login — verify credentials and issue a token.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    body.validate()?;
    let LoginBody { email, password } = body;
    let user = app
        .with_store(move |s| taskboard_core::user::login(s, &email, &password))
        .await?;
    let token = app.signer.issue(&user);
    Ok(Json(serde_json::json!({ "user": user, "token": token })))
}

/// GET /api/auth/profile — the authenticated account, fresh from the store.
pub async fn profile(
    State(app): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = app
        .with_store(move |s| taskboard_core::user::get(s.conn(), &auth.id))
        .await?;
    Ok(Json(serde_json::json!({ "user": user })))
}
