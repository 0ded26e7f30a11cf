use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use taskboard_core::CoreError;

/// Private sentinel error type used to carry a request-body validation
/// failure, with every violated constraint, through the `anyhow::Error`
/// chain.
#[derive(Debug)]
struct ValidationFailed(Vec<String>);

impl std::fmt::Display for ValidationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")
    }
}

impl std::error::Error for ValidationFailed {}

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request carrying a `details` array.
    pub fn validation(details: Vec<String>) -> Self {
        Self(ValidationFailed(details).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(v) = self.0.downcast_ref::<ValidationFailed>() {
            let body = serde_json::json!({
                "error": "validation failed",
                "details": v.0,
            });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<CoreError>() {
            match e {
                CoreError::UserNotFound(_)
                | CoreError::BoardNotFound(_)
                | CoreError::ListNotFound(_)
                | CoreError::TaskNotFound(_)
                | CoreError::NotAssigned => StatusCode::NOT_FOUND,
                CoreError::AccessDenied => StatusCode::FORBIDDEN,
                CoreError::EmailTaken(_) | CoreError::AlreadyAssigned => StatusCode::CONFLICT,
                CoreError::InvalidCredentials
                | CoreError::TokenInvalid
                | CoreError::TokenExpired => StatusCode::UNAUTHORIZED,
                CoreError::Db(_) | CoreError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_not_found_maps_to_404() {
        let err = AppError(CoreError::BoardNotFound("b1".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_assigned_maps_to_404() {
        let err = AppError(CoreError::NotAssigned.into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn access_denied_maps_to_403() {
        let err = AppError(CoreError::AccessDenied.into());
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn email_taken_maps_to_409() {
        let err = AppError(CoreError::EmailTaken("a@b.c".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn already_assigned_maps_to_409() {
        let err = AppError(CoreError::AlreadyAssigned.into());
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_credentials_maps_to_401() {
        let err = AppError(CoreError::InvalidCredentials.into());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn expired_token_maps_to_401() {
        let err = AppError(CoreError::TokenExpired.into());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn validation_maps_to_400() {
        let err = AppError::validation(vec!["name is required".into()]);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unexpected_error_maps_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json() {
        let err = AppError(CoreError::BoardNotFound("b1".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
