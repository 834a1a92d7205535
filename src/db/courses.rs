use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::info;

use crate::db::{begin_write, touch};
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::course::DEFAULT_CREDITS;
use crate::models::{Course, NewCourse, UpdateCourse};
use crate::schema::COURSES;

pub async fn fetch_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE is_active = 1 ORDER BY code")
        .fetch_all(db)
        .await
}

pub async fn fetch_all_courses(db: &SqlitePool) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY code")
        .fetch_all(db)
        .await
}

pub async fn find_course_by_id(db: &SqlitePool, id: i64) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_course_by_code(db: &SqlitePool, code: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE code = ?")
        .bind(code)
        .fetch_optional(db)
        .await
}

pub async fn insert_course(db: &SqlitePool, req: NewCourse) -> Result<Course, StoreError> {
    let mut tx = begin_write(db).await?;

    validate::ensure_unique(
        &mut tx,
        &COURSES.unique_indexes[0],
        &[KeyPart::Text(&req.code)],
        None,
    )
    .await?;

    let now = Utc::now();
    let course = sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses
            (code, name, description, credits, duration_hours, base_fee,
            is_active, metadata, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        RETURNING *
        "#,
    )
    .bind(&req.code)
    .bind(&req.name)
    .bind(&req.description)
    .bind(req.credits.unwrap_or(DEFAULT_CREDITS))
    .bind(req.duration_hours)
    .bind(req.base_fee)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.metadata.map(Json))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(course)
}

pub async fn update_course(
    db: &SqlitePool,
    id: i64,
    req: UpdateCourse,
) -> Result<Option<Course>, StoreError> {
    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(code) = req.code {
        if code != current.code {
            validate::ensure_unique(
                &mut tx,
                &COURSES.unique_indexes[0],
                &[KeyPart::Text(&code)],
                Some(id),
            )
            .await?;
        }
        current.code = code;
    }
    if let Some(name) = req.name {
        current.name = name;
    }
    if let Some(description) = req.description {
        current.description = Some(description);
    }
    if let Some(credits) = req.credits {
        current.credits = Some(credits);
    }
    if let Some(duration_hours) = req.duration_hours {
        current.duration_hours = duration_hours;
    }
    if let Some(base_fee) = req.base_fee {
        current.base_fee = base_fee;
    }
    if let Some(is_active) = req.is_active {
        current.is_active = is_active;
    }
    if let Some(metadata) = req.metadata {
        current.metadata = Some(Json(metadata));
    }
    current.updated_at = touch(current.updated_at);

    sqlx::query(
        r#"
        UPDATE courses
        SET code = ?1,
            name = ?2,
            description = ?3,
            credits = ?4,
            duration_hours = ?5,
            base_fee = ?6,
            is_active = ?7,
            metadata = ?8,
            updated_at = ?9
        WHERE id = ?10
        "#,
    )
    .bind(&current.code)
    .bind(&current.name)
    .bind(&current.description)
    .bind(current.credits)
    .bind(current.duration_hours)
    .bind(current.base_fee)
    .bind(current.is_active)
    .bind(&current.metadata)
    .bind(current.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(current))
}

/// Deletes a course together with its waitlist entries. Rejected while any
/// class still references the course.
pub async fn delete_course(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let mut tx = begin_write(db).await?;

    validate::ensure_no_restricting_dependents(&mut tx, COURSES.name, id).await?;
    let cascaded = validate::apply_cascades(&mut tx, COURSES.name, id).await?;

    let deleted = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        info!("deleted course {} with {} waitlist entries", id, cascaded);
    }
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn sample_course(code: &str) -> NewCourse {
    NewCourse {
        code: code.to_string(),
        name: "Giải tích 1".to_string(),
        description: None,
        credits: None,
        duration_hours: 45,
        base_fee: 1_500_000,
        is_active: None,
        metadata: None,
    }
}
