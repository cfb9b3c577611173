use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use examhall::config::Config;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let db_path =
        std::env::temp_dir().join(format!("examhall-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = examhall::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    examhall::api::router(state).await
}

async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Option<String>) {
    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    (response.status(), cookie)
}

async fn admin_cookie(app: &Router) -> String {
    let (status, cookie) = login(app, "admin", "admin123").await;
    assert_eq!(status, StatusCode::OK);
    cookie.expect("login did not set a session cookie")
}

async fn create_student(app: &Router, cookie: &str, username: &str, max_logins: i32) -> i64 {
    let response = send(
        app,
        "POST",
        "/api/users",
        Some(cookie),
        Some(serde_json::json!({
            "username": username,
            "password": "correct-horse",
            "password_confirm": "correct-horse",
            "first_name": "Test",
            "last_name": "Student",
            "user_type": "student",
            "max_logins_allowed": max_logins,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let response = send(&app, "GET", "/api/health/live", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/health/ready", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let response = send(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, cookie) = login(&app, "admin", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());

    let cookie = admin_cookie(&app).await;

    let response = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "admin");
    assert_eq!(json["data"]["user_type"], "admin");
    assert!(json["data"].get("password_hash").is_none());

    let response = send(&app, "POST", "/api/auth/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_students() {
    let app = spawn_app().await;
    let admin = admin_cookie(&app).await;
    create_student(&app, &admin, "ana", 5).await;

    let (status, student) = login(&app, "ana", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);
    let student = student.unwrap();

    for uri in ["/api/users", "/api/students", "/api/reactivation-requests"] {
        let response = send(&app, "GET", uri, Some(&student), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");

        let response = send(&app, "GET", uri, Some(&admin), None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let response = send(&app, "GET", "/api/dashboard", Some(&student), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["role"], "student");
    assert!(json["data"]["pending_reactivation_requests"].is_null());
}

#[tokio::test]
async fn test_user_listing_reports_presence() {
    let app = spawn_app().await;
    let admin = admin_cookie(&app).await;
    create_student(&app, &admin, "ben", 5).await;

    let response = send(&app, "GET", "/api/users", Some(&admin), None).await;
    let json = body_json(response).await;
    let users = json["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);

    let admin_entry = users.iter().find(|u| u["username"] == "admin").unwrap();
    assert_eq!(admin_entry["is_online"], true);

    let ben = users.iter().find(|u| u["username"] == "ben").unwrap();
    assert_eq!(ben["is_online"], false);

    let response = send(&app, "GET", "/api/students", Some(&admin), None).await;
    let json = body_json(response).await;
    let students = json["data"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["username"], "ben");
}

#[tokio::test]
async fn test_login_limit_and_reactivation_flow() {
    let app = spawn_app().await;
    let admin = admin_cookie(&app).await;
    let student_id = create_student(&app, &admin, "cleo", 2).await;

    for _ in 0..2 {
        let (status, _) = login(&app, "cleo", "correct-horse").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, cookie) = login(&app, "cleo", "correct-horse").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(cookie.is_none());

    let response = send(
        &app,
        "POST",
        "/api/request-reactivation",
        None,
        Some(serde_json::json!({ "username": "cleo", "message": "Exam retake" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "pending");
    let request_id = json["data"]["id"].as_i64().unwrap();

    let response = send(
        &app,
        "POST",
        "/api/request-reactivation",
        None,
        Some(serde_json::json!({ "username": "cleo" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "GET", "/api/dashboard", Some(&admin), None).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["pending_reactivation_requests"], 1);

    let response = send(
        &app,
        "GET",
        "/api/reactivation-requests?status=pending",
        Some(&admin),
        None,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["username"], "cleo");
    assert_eq!(json["data"][0]["message"], "Exam retake");

    let response = send(
        &app,
        "POST",
        &format!("/api/reactivation-requests/{request_id}/approve"),
        Some(&admin),
        Some(serde_json::json!({ "response": "Approved for retake" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["processed_by_username"], "admin");

    let response = send(
        &app,
        "POST",
        &format!("/api/reactivation-requests/{request_id}/reject"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let (status, _) = login(&app, "cleo", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);

    let response = send(&app, "GET", "/api/students", Some(&admin), None).await;
    let json = body_json(response).await;
    let cleo = &json["data"][0];
    assert_eq!(cleo["id"].as_i64().unwrap(), student_id);
    assert_eq!(cleo["login_count"], 1);
    assert_eq!(cleo["is_active"], true);
    assert_eq!(cleo["disabled_by_login_limit"], false);
}

#[tokio::test]
async fn test_reactivation_submit_errors() {
    let app = spawn_app().await;
    let admin = admin_cookie(&app).await;
    create_student(&app, &admin, "dora", 2).await;

    let response = send(
        &app,
        "POST",
        "/api/request-reactivation",
        None,
        Some(serde_json::json!({ "username": "ghost" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/request-reactivation",
        None,
        Some(serde_json::json!({ "username": "dora" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);

    let response = send(
        &app,
        "POST",
        "/api/reactivation-requests/999/approve",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_reset_and_toggle() {
    let app = spawn_app().await;
    let admin = admin_cookie(&app).await;
    let student_id = create_student(&app, &admin, "eve", 1).await;

    let (status, student) = login(&app, "eve", "correct-horse").await;
    assert_eq!(status, StatusCode::OK);
    let student = student.unwrap();

    let (status, _) = login(&app, "eve", "correct-horse").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The earlier session stops working once the account is disabled.
    let response = send(&app, "GET", "/api/auth/me", Some(&student), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        "POST",
        &format!("/api/users/{student_id}/reset-login-count"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["login_count"], 0);
    assert_eq!(json["data"]["is_active"], true);

    let response = send(
        &app,
        "POST",
        &format!("/api/users/{student_id}/toggle-status"),
        Some(&admin),
        None,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["is_active"], false);
    assert_eq!(json["data"]["disabled_by_login_limit"], false);

    let (status, _) = login(&app, "eve", "correct-horse").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = send(
        &app,
        "PUT",
        &format!("/api/users/{student_id}"),
        Some(&admin),
        Some(serde_json::json!({ "max_logins_allowed": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "PUT",
        &format!("/api/users/{student_id}"),
        Some(&admin),
        Some(serde_json::json!({ "max_logins_allowed": 10, "first_name": "Evelyn" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["max_logins_allowed"], 10);
    assert_eq!(json["data"]["first_name"], "Evelyn");

    let response = send(&app, "POST", "/api/users/9999/reset-login-count", Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
