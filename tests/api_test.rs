use academic::db::init_pool;
use academic::routes::router;
use academic::state::AppState;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> Router {
    let db = init_pool("sqlite::memory:", 1)
        .await
        .expect("Failed to create database");
    router(AppState { db })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.expect("Failed to call router");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn course_body(code: &str) -> Value {
    json!({
        "code": code,
        "name": "Nhập môn lập trình",
        "duration_hours": 60,
        "base_fee": 2000000
    })
}

#[tokio::test]
async fn test_duplicate_course_code_maps_to_conflict() {
    let app = app().await;

    let (status, course) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(course["credits"], 0);
    assert_eq!(course["is_active"], true);

    let (status, err) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("courses_code_uidx"));

    let (_, list) = send(&app, Method::GET, "/courses", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_restricted_delete_maps_to_conflict() {
    let app = app().await;

    let (_, course) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    let course_id = course["id"].as_i64().unwrap();

    let (status, class) = send(
        &app,
        Method::POST,
        "/classes",
        Some(json!({ "course_id": course_id, "code": "CS101-A", "name": "Lớp A" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(class["status"], "planned");

    let (status, _) = send(&app, Method::DELETE, &format!("/courses/{course_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, graph) = send(&app, Method::GET, &format!("/courses/{course_id}/graph"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graph["classes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_class_status_maps_to_conflict() {
    let app = app().await;

    let (_, course) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    let course_id = course["id"].as_i64().unwrap();

    let (status, err) = send(
        &app,
        Method::POST,
        "/classes",
        Some(json!({
            "course_id": course_id,
            "code": "CS101-A",
            "name": "Lớp A",
            "status": "archived"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(err["message"].as_str().unwrap().contains("class_status"));

    let (_, graph) = send(&app, Method::GET, &format!("/courses/{course_id}/graph"), None).await;
    assert!(graph["classes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app().await;

    let (status, _) = send(&app, Method::POST, "/courses", Some(json!({ "code": "CS101" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_rows_are_not_found() {
    let app = app().await;

    let (status, _) = send(&app, Method::GET, "/courses/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/enrollments/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, "/students/99", Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrollment_flow_and_class_graph() {
    let app = app().await;

    let (_, course) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    let course_id = course["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/lecturers",
        Some(json!({ "user_id": "lecturer-1", "employee_code": "GV01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, student) = send(
        &app,
        Method::POST,
        "/students",
        Some(json!({ "user_id": "student-1", "student_code": "SV01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(student["nationality"], "Việt Nam");

    let (_, class) = send(
        &app,
        Method::POST,
        "/classes",
        Some(json!({
            "course_id": course_id,
            "code": "CS101-A",
            "name": "Lớp A",
            "lecturer_id": "lecturer-1"
        })),
    )
    .await;
    let class_id = class["id"].as_i64().unwrap();

    let enrollment = json!({ "class_id": class_id, "student_id": "student-1" });
    let (status, created) = send(&app, Method::POST, "/enrollments", Some(enrollment.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "waitlist");

    let (status, _) = send(&app, Method::POST, "/enrollments", Some(enrollment)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let enrollment_id = created["id"].as_i64().unwrap();
    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/enrollments/{enrollment_id}"),
        Some(json!({ "status": "pending_payment" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "pending_payment");

    let (_, graph) = send(&app, Method::GET, &format!("/classes/{class_id}/graph"), None).await;
    assert_eq!(graph["course"]["code"], "CS101");
    assert_eq!(graph["lecturer"]["employee_code"], "GV01");
    assert_eq!(graph["enrollments"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/classes/{class_id}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_course_delete_cascades_waitlist_over_http() {
    let app = app().await;

    let (_, course) = send(&app, Method::POST, "/courses", Some(course_body("CS101"))).await;
    let course_id = course["id"].as_i64().unwrap();

    let (status, entry) = send(
        &app,
        Method::POST,
        "/waitlist",
        Some(json!({ "course_id": course_id, "student_id": "student-1", "priority": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry_id = entry["id"].as_i64().unwrap();

    let (status, _) = send(&app, Method::DELETE, &format!("/courses/{course_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/waitlist/{entry_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
