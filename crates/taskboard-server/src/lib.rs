pub mod auth;
pub mod error;
pub mod hub;
pub mod routes;
pub mod state;
pub mod validate;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/api/auth/profile", get(routes::auth::profile))
        .route(
            "/api/boards",
            get(routes::boards::list_boards).post(routes::boards::create_board),
        )
        .route(
            "/api/boards/{id}",
            get(routes::boards::get_board)
                .put(routes::boards::update_board)
                .delete(routes::boards::delete_board),
        )
        .route("/api/boards/{id}/lists", post(routes::lists::create_list))
        .route(
            "/api/boards/{id}/activities",
            get(routes::activities::board_activities),
        )
        .route(
            "/api/lists/{id}",
            put(routes::lists::update_list).delete(routes::lists::delete_list),
        )
        .route("/api/lists/{id}/position", put(routes::lists::move_list))
        .route("/api/lists/{id}/tasks", post(routes::tasks::create_task))
        .route(
            "/api/tasks/{id}",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/api/tasks/{id}/move", put(routes::tasks::move_task))
        .route("/api/tasks/{id}/assign", post(routes::tasks::assign_user))
        .route(
            "/api/tasks/{id}/unassign/{user_id}",
            delete(routes::tasks::unassign_user),
        )
        .route("/api/search", get(routes::search::search_tasks))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/ws/boards/{id}", get(routes::ws::board_ws))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("taskboard API listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
