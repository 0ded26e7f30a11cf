use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// The authenticated caller, injected as a request extension by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
}

/// Axum middleware gating routes behind `Authorization: Bearer <token>`.
/// Verifies the token's signature and expiry and injects [`AuthUser`].
pub async fn require_auth(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        return unauthorized("missing bearer token");
    };

    match app.signer.verify(token) {
        Ok(claims) => {
            req.extensions_mut().insert(AuthUser {
                id: claims.user_id,
                email: claims.email,
                name: claims.name,
            });
            next.run(req).await
        }
        Err(e) => unauthorized(&e.to_string()),
    }
}

fn unauthorized(msg: &str) -> Response {
    let body = serde_json::json!({ "error": msg }).to_string();
    Response::builder()
        .status(401)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .expect("infallible: all header values are valid ASCII")
}
