use axum::http::StatusCode;
use http_body_util::BodyExt;
use taskboard_core::auth::TokenSigner;
use taskboard_core::store::Store;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn app_with(store: Store) -> axum::Router {
    let state =
        taskboard_server::AppState::new(store, TokenSigner::new(b"test-secret".to_vec()));
    taskboard_server::build_router(state)
}

fn app() -> axum::Router {
    app_with(Store::open_in_memory().unwrap())
}

/// Send a request via `oneshot` and return (status, parsed JSON body).
async fn request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header("Authorization", format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&b).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Register an account and return (token, user_id).
async fn register(app: &axum::Router, email: &str, name: &str) -> (String, String) {
    let (status, json) = request(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "secret123",
            "name": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (
        json["token"].as_str().unwrap().to_string(),
        json["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Create a board and return its id.
async fn create_board(app: &axum::Router, token: &str, name: &str) -> String {
    let (status, json) = request(
        app,
        "POST",
        "/api/boards",
        Some(token),
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_list(app: &axum::Router, token: &str, board_id: &str, name: &str) -> String {
    let (status, json) = request(
        app,
        "POST",
        &format!("/api/boards/{board_id}/lists"),
        Some(token),
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

async fn create_task(app: &axum::Router, token: &str, list_id: &str, title: &str) -> String {
    let (status, json) = request(
        app,
        "POST",
        &format!("/api/lists/{list_id}/tasks"),
        Some(token),
        Some(serde_json::json!({ "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_string()
}

/// Fetch the board detail and flatten it to (list name, [task titles]),
/// asserting positions are dense in every sibling group.
async fn board_layout(app: &axum::Router, token: &str, board_id: &str) -> Vec<(String, Vec<String>)> {
    let (status, json) = request(app, "GET", &format!("/api/boards/{board_id}"), Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    let lists = json["lists"].as_array().unwrap();
    let mut out = Vec::new();
    for (i, l) in lists.iter().enumerate() {
        assert_eq!(l["position"].as_i64().unwrap(), i as i64);
        let tasks = l["tasks"].as_array().unwrap();
        let mut titles = Vec::new();
        for (j, t) in tasks.iter().enumerate() {
            assert_eq!(t["position"].as_i64().unwrap(), j as i64);
            titles.push(t["title"].as_str().unwrap().to_string());
        }
        out.push((l["name"].as_str().unwrap().to_string(), titles));
    }
    out
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let app = app();
    let (status, json) = request(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn register_login_profile_flow() {
    let app = app();
    let (token, user_id) = register(&app, "ada@example.com", "Ada").await;

    let (status, json) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "ada@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["id"], user_id.as_str());
    assert!(json["token"].is_string());

    let (status, json) = request(&app, "GET", "/api/auth/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn duplicate_email_is_conflict() {
    let app = app();
    register(&app, "ada@example.com", "Ada").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "email": "ada@example.com",
            "password": "secret123",
            "name": "Imposter",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_reports_every_violation() {
    let app = app();
    let (status, json) = request(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "email": "not-an-email", "password": "abc", "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let details = json["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    register(&app, "ada@example.com", "Ada").await;
    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "ada@example.com", "password": "wrongpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = app();
    let (status, _) = request(&app, "GET", "/api/boards", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/boards", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Boards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn board_crud_round_trip() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Roadmap").await;

    let (status, json) = request(&app, "GET", "/api/boards", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["boards"].as_array().unwrap().len(), 1);
    assert_eq!(json["pagination"]["total"], 1);

    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/boards/{board_id}"),
        Some(&token),
        Some(serde_json::json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Renamed");

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/boards/{board_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(&app, "GET", &format!("/api/boards/{board_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_board_is_forbidden() {
    let app = app();
    let (owner, _) = register(&app, "ada@example.com", "Ada").await;
    let (intruder, _) = register(&app, "eve@example.com", "Eve").await;
    let board_id = create_board(&app, &owner, "Private").await;

    let (status, _) = request(&app, "GET", &format!("/api/boards/{board_id}"), Some(&intruder), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/boards/{board_id}"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_board_is_not_found() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let (status, _) = request(&app, "GET", "/api/boards/nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_move_and_delete_keep_positions_dense() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    create_list(&app, &token, &board_id, "L0").await;
    let l1 = create_list(&app, &token, &board_id, "L1").await;
    let l2 = create_list(&app, &token, &board_id, "L2").await;

    // Move the last list to the front.
    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/lists/{l2}/position"),
        Some(&token),
        Some(serde_json::json!({ "position": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["position"], 0);

    let layout = board_layout(&app, &token, &board_id).await;
    let names: Vec<&str> = layout.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["L2", "L0", "L1"]);

    // Deleting the middle list renumbers the rest.
    let (status, _) = request(&app, "DELETE", &format!("/api/lists/{l1}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let layout = board_layout(&app, &token, &board_id).await;
    let names: Vec<&str> = layout.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["L2", "L0"]);
}

#[tokio::test]
async fn concurrent_moves_on_one_board_stay_dense() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let l0 = create_list(&app, &token, &board_id, "L0").await;
    create_list(&app, &token, &board_id, "L1").await;
    let l2 = create_list(&app, &token, &board_id, "L2").await;

    // Two simultaneous moves against the same sibling group. The store
    // mutex plus one transaction per move serializes them; whichever
    // order wins, the group must come out dense.
    let l2_path = format!("/api/lists/{l2}/position");
    let l0_path = format!("/api/lists/{l0}/position");
    let ((s1, _), (s2, _)) = tokio::join!(
        request(
            &app,
            "PUT",
            &l2_path,
            Some(&token),
            Some(serde_json::json!({ "position": 0 })),
        ),
        request(
            &app,
            "PUT",
            &l0_path,
            Some(&token),
            Some(serde_json::json!({ "position": 2 })),
        ),
    );
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);

    // board_layout asserts per-group density on every list and task.
    let layout = board_layout(&app, &token, &board_id).await;
    assert_eq!(layout.len(), 3);
}

#[tokio::test]
async fn negative_list_position_is_rejected_with_details() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let l0 = create_list(&app, &token, &board_id, "L0").await;

    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/lists/{l0}/position"),
        Some(&token),
        Some(serde_json::json!({ "position": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["details"][0]
        .as_str()
        .unwrap()
        .contains("position"));
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cross_list_task_move_end_to_end() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "A").await;
    let list_b = create_list(&app, &token, &board_id, "B").await;
    let t0 = create_task(&app, &token, &list_a, "T0").await;
    create_task(&app, &token, &list_a, "T1").await;
    create_task(&app, &token, &list_b, "T2").await;

    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/tasks/{t0}/move"),
        Some(&token),
        Some(serde_json::json!({ "listId": list_b, "position": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["list_id"], list_b.as_str());
    assert_eq!(json["position"], 1);

    let layout = board_layout(&app, &token, &board_id).await;
    assert_eq!(layout[0].1, ["T1"]);
    assert_eq!(layout[1].1, ["T2", "T0"]);
}

#[tokio::test]
async fn same_list_task_move_saturates_past_end() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "A").await;
    let t0 = create_task(&app, &token, &list_a, "T0").await;
    create_task(&app, &token, &list_a, "T1").await;

    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/tasks/{t0}/move"),
        Some(&token),
        Some(serde_json::json!({ "listId": list_a, "position": 99 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["position"], 1);

    let layout = board_layout(&app, &token, &board_id).await;
    assert_eq!(layout[0].1, ["T1", "T0"]);
}

#[tokio::test]
async fn task_update_and_delete() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "A").await;
    let t0 = create_task(&app, &token, &list_a, "T0").await;
    let t1 = create_task(&app, &token, &list_a, "T1").await;

    let (status, json) = request(
        &app,
        "PUT",
        &format!("/api/tasks/{t0}"),
        Some(&token),
        Some(serde_json::json!({ "title": "T0 revised", "description": "details" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "T0 revised");
    assert_eq!(json["description"], "details");

    let (status, _) = request(&app, "DELETE", &format!("/api/tasks/{t0}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Survivor renumbered to the front.
    let (status, json) = request(&app, "GET", &format!("/api/tasks/{t1}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["position"], 0);
}

#[tokio::test]
async fn assign_and_unassign_flow() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let (_, helper_id) = register(&app, "bob@example.com", "Bob").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "A").await;
    let t0 = create_task(&app, &token, &list_a, "T0").await;

    let (status, json) = request(
        &app,
        "POST",
        &format!("/api/tasks/{t0}/assign"),
        Some(&token),
        Some(serde_json::json!({ "userId": helper_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["assignees"][0]["name"], "Bob");

    // Assigning twice is a conflict.
    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/tasks/{t0}/assign"),
        Some(&token),
        Some(serde_json::json!({ "userId": helper_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = request(
        &app,
        "DELETE",
        &format!("/api/tasks/{t0}/unassign/{helper_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["assignees"].as_array().unwrap().is_empty());

    // Removing a missing assignment is not found.
    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/tasks/{t0}/unassign/{helper_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Activities and search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn activity_feed_is_newest_first() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "Backlog").await;
    create_task(&app, &token, &list_a, "Ship it").await;

    let (status, json) = request(
        &app,
        "GET",
        &format!("/api/boards/{board_id}/activities"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let activities = json["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 3);
    assert_eq!(activities[0]["kind"], "task_created");
    assert_eq!(activities[0]["description"], "Created task \"Ship it\"");
    assert_eq!(activities[2]["kind"], "board_created");
    assert_eq!(json["pagination"]["total"], 3);
}

#[tokio::test]
async fn search_matches_case_insensitively() {
    let app = app();
    let (token, _) = register(&app, "ada@example.com", "Ada").await;
    let board_id = create_board(&app, &token, "Board").await;
    let list_a = create_list(&app, &token, &board_id, "A").await;
    create_task(&app, &token, &list_a, "Fix LOGIN bug").await;
    create_task(&app, &token, &list_a, "Unrelated").await;

    let (status, json) = request(
        &app,
        "GET",
        &format!("/api/search?board_id={board_id}&q=login"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tasks = json["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["title"], "Fix LOGIN bug");
    assert_eq!(tasks[0]["list"]["name"], "A");
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn on_disk_store_survives_a_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("taskboard.db");

    let app1 = app_with(Store::open(&path).unwrap());
    let (token, _) = register(&app1, "ada@example.com", "Ada").await;
    create_board(&app1, &token, "Durable").await;
    drop(app1);

    // A fresh server over the same file sees the data, and the stable
    // signing key keeps the old token valid.
    let app2 = app_with(Store::open(&path).unwrap());
    let (status, json) = request(&app2, "GET", "/api/boards", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["boards"][0]["name"], "Durable");
}

#[tokio::test]
async fn search_on_foreign_board_is_forbidden() {
    let app = app();
    let (owner, _) = register(&app, "ada@example.com", "Ada").await;
    let (intruder, _) = register(&app, "eve@example.com", "Eve").await;
    let board_id = create_board(&app, &owner, "Private").await;

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/search?board_id={board_id}&q=x"),
        Some(&intruder),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
