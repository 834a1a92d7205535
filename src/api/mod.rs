use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;

use crate::db::{classes, courses, enrollments, lecturers, students, waitlist};
use crate::error::AppError;
use crate::models::*;
use crate::relations::{self, ClassGraph, CourseGraph};
use crate::state::AppState;

#[derive(Deserialize)]
struct CourseQueryParams {
    #[serde(default)]
    include_inactive: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route(
            "/courses/{id}",
            get(get_course).patch(update_course).delete(delete_course),
        )
        .route("/courses/{id}/graph", get(course_graph))
        .route("/classes", post(create_class))
        .route(
            "/classes/{id}",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route("/classes/{id}/graph", get(class_graph))
        .route("/enrollments", post(create_enrollment))
        .route(
            "/enrollments/{id}",
            get(get_enrollment).patch(update_enrollment).delete(delete_enrollment),
        )
        .route("/waitlist", post(create_waitlist_entry))
        .route(
            "/waitlist/{id}",
            get(get_waitlist_entry)
                .patch(update_waitlist_entry)
                .delete(delete_waitlist_entry),
        )
        .route("/lecturers", post(create_lecturer))
        .route("/lecturers/{id}", get(get_lecturer).patch(update_lecturer))
        .route("/students", post(create_student))
        .route("/students/{id}", get(get_student).patch(update_student))
}

fn deleted(ok: bool) -> Result<StatusCode, AppError> {
    if ok {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let courses = if params.include_inactive {
        courses::fetch_all_courses(&state.db).await?
    } else {
        courses::fetch_courses(&state.db).await?
    };
    Ok(Json(courses))
}

async fn create_course(
    State(state): State<AppState>,
    payload: Result<Json<NewCourse>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let Json(req) = payload?;
    let course = courses::insert_course(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, AppError> {
    let course = courses::find_course_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateCourse>, JsonRejection>,
) -> Result<Json<Course>, AppError> {
    let Json(req) = payload?;
    let course = courses::update_course(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(course))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(courses::delete_course(&state.db, id).await?)
}

async fn course_graph(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CourseGraph>, AppError> {
    let graph = relations::load_course_graph(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(graph))
}

async fn create_class(
    State(state): State<AppState>,
    payload: Result<Json<NewClass>, JsonRejection>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let Json(req) = payload?;
    let class = classes::insert_class(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Class>, AppError> {
    let class = classes::find_class_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class))
}

async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateClass>, JsonRejection>,
) -> Result<Json<Class>, AppError> {
    let Json(req) = payload?;
    let class = classes::update_class(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(class))
}

async fn delete_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(classes::delete_class(&state.db, id).await?)
}

async fn class_graph(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ClassGraph>, AppError> {
    let graph = relations::load_class_graph(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(graph))
}

async fn create_enrollment(
    State(state): State<AppState>,
    payload: Result<Json<NewEnrollment>, JsonRejection>,
) -> Result<(StatusCode, Json<Enrollment>), AppError> {
    let Json(req) = payload?;
    let enrollment = enrollments::insert_enrollment(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = enrollments::find_enrollment_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(enrollment))
}

async fn update_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateEnrollment>, JsonRejection>,
) -> Result<Json<Enrollment>, AppError> {
    let Json(req) = payload?;
    let enrollment = enrollments::update_enrollment(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(enrollment))
}

async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(enrollments::delete_enrollment(&state.db, id).await?)
}

async fn create_waitlist_entry(
    State(state): State<AppState>,
    payload: Result<Json<NewWaitlistEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<WaitlistEntry>), AppError> {
    let Json(req) = payload?;
    let entry = waitlist::insert_waitlist_entry(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_waitlist_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WaitlistEntry>, AppError> {
    let entry = waitlist::find_waitlist_entry_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(entry))
}

async fn update_waitlist_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateWaitlistEntry>, JsonRejection>,
) -> Result<Json<WaitlistEntry>, AppError> {
    let Json(req) = payload?;
    let entry = waitlist::update_waitlist_entry(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(entry))
}

async fn delete_waitlist_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(waitlist::delete_waitlist_entry(&state.db, id).await?)
}

async fn create_lecturer(
    State(state): State<AppState>,
    payload: Result<Json<NewLecturer>, JsonRejection>,
) -> Result<(StatusCode, Json<Lecturer>), AppError> {
    let Json(req) = payload?;
    let lecturer = lecturers::insert_lecturer(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(lecturer)))
}

async fn get_lecturer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Lecturer>, AppError> {
    let lecturer = lecturers::find_lecturer_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(lecturer))
}

async fn update_lecturer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateLecturer>, JsonRejection>,
) -> Result<Json<Lecturer>, AppError> {
    let Json(req) = payload?;
    let lecturer = lecturers::update_lecturer(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(lecturer))
}

async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<NewStudent>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let Json(req) = payload?;
    let student = students::insert_student(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

async fn get_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Student>, AppError> {
    let student = students::find_student_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(student))
}

async fn update_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateStudent>, JsonRejection>,
) -> Result<Json<Student>, AppError> {
    let Json(req) = payload?;
    let student = students::update_student(&state.db, id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(student))
}
