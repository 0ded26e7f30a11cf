use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("board not found: {0}")]
    BoardNotFound(String),

    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("access denied")]
    AccessDenied,

    #[error("email already registered: {0}")]
    EmailTaken(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user already assigned to task")]
    AlreadyAssigned,

    #[error("user is not assigned to task")]
    NotAssigned,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token expired")]
    TokenExpired,

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
