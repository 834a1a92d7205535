use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;
use tracing::info;

use crate::db::{begin_write, touch};
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::class::{DEFAULT_MAX_STUDENTS, DEFAULT_MIN_STUDENTS};
use crate::models::{Class, ClassStatus, NewClass, UpdateClass};
use crate::schema::CLASSES;

pub async fn find_class_by_id(db: &SqlitePool, id: i64) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_class_by_code(db: &SqlitePool, code: &str) -> Result<Option<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE code = ?")
        .bind(code)
        .fetch_optional(db)
        .await
}

pub async fn list_classes_by_course(db: &SqlitePool, course_id: i64) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE course_id = ? ORDER BY start_date, code")
        .bind(course_id)
        .fetch_all(db)
        .await
}

pub async fn list_classes_by_status(
    db: &SqlitePool,
    status: ClassStatus,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE status = ? ORDER BY start_date, code")
        .bind(status)
        .fetch_all(db)
        .await
}

pub async fn list_classes_by_lecturer(
    db: &SqlitePool,
    lecturer_user_id: &str,
) -> Result<Vec<Class>, sqlx::Error> {
    sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE lecturer_id = ? ORDER BY start_date, code")
        .bind(lecturer_user_id)
        .fetch_all(db)
        .await
}

pub async fn insert_class(db: &SqlitePool, req: NewClass) -> Result<Class, StoreError> {
    let status = match req.status.as_deref() {
        Some(s) => s.parse::<ClassStatus>()?,
        None => ClassStatus::default(),
    };

    let mut tx = begin_write(db).await?;

    if let Some(fk) = CLASSES.foreign_key("course_id") {
        validate::ensure_parent_exists(&mut tx, fk, req.course_id).await?;
    }
    validate::ensure_unique(
        &mut tx,
        &CLASSES.unique_indexes[0],
        &[KeyPart::Text(&req.code)],
        None,
    )
    .await?;

    let now = Utc::now();
    let class = sqlx::query_as::<_, Class>(
        r#"
        INSERT INTO classes
            (course_id, code, name, start_date, end_date, min_students, max_students,
            current_enrollment, status, lecturer_id, schedule_metadata, location,
            created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
        RETURNING *
        "#,
    )
    .bind(req.course_id)
    .bind(&req.code)
    .bind(&req.name)
    .bind(req.start_date)
    .bind(req.end_date)
    .bind(req.min_students.unwrap_or(DEFAULT_MIN_STUDENTS))
    .bind(req.max_students.unwrap_or(DEFAULT_MAX_STUDENTS))
    .bind(req.current_enrollment.unwrap_or(0))
    .bind(status)
    .bind(&req.lecturer_id)
    .bind(req.schedule_metadata.map(Json))
    .bind(&req.location)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(class)
}

pub async fn update_class(
    db: &SqlitePool,
    id: i64,
    req: UpdateClass,
) -> Result<Option<Class>, StoreError> {
    let status = req.status.as_deref().map(str::parse::<ClassStatus>).transpose()?;

    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(c) => c,
        None => return Ok(None),
    };

    if let Some(course_id) = req.course_id {
        if let Some(fk) = CLASSES.foreign_key("course_id") {
            validate::ensure_parent_exists(&mut tx, fk, course_id).await?;
        }
        current.course_id = course_id;
    }
    if let Some(code) = req.code {
        if code != current.code {
            validate::ensure_unique(
                &mut tx,
                &CLASSES.unique_indexes[0],
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
    if let Some(start_date) = req.start_date {
        current.start_date = Some(start_date);
    }
    if let Some(end_date) = req.end_date {
        current.end_date = Some(end_date);
    }
    if let Some(min_students) = req.min_students {
        current.min_students = min_students;
    }
    if let Some(max_students) = req.max_students {
        current.max_students = max_students;
    }
    if let Some(current_enrollment) = req.current_enrollment {
        current.current_enrollment = current_enrollment;
    }
    if let Some(status) = status {
        current.status = status;
    }
    if let Some(lecturer_id) = req.lecturer_id {
        current.lecturer_id = Some(lecturer_id);
    }
    if let Some(schedule_metadata) = req.schedule_metadata {
        current.schedule_metadata = Some(Json(schedule_metadata));
    }
    if let Some(location) = req.location {
        current.location = Some(location);
    }
    current.updated_at = touch(current.updated_at);

    sqlx::query(
        r#"
        UPDATE classes
        SET course_id = ?1,
            code = ?2,
            name = ?3,
            start_date = ?4,
            end_date = ?5,
            min_students = ?6,
            max_students = ?7,
            current_enrollment = ?8,
            status = ?9,
            lecturer_id = ?10,
            schedule_metadata = ?11,
            location = ?12,
            updated_at = ?13
        WHERE id = ?14
        "#,
    )
    .bind(current.course_id)
    .bind(&current.code)
    .bind(&current.name)
    .bind(current.start_date)
    .bind(current.end_date)
    .bind(current.min_students)
    .bind(current.max_students)
    .bind(current.current_enrollment)
    .bind(current.status)
    .bind(&current.lecturer_id)
    .bind(&current.schedule_metadata)
    .bind(&current.location)
    .bind(current.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(current))
}

/// Rejected while any enrollment still references the class.
pub async fn delete_class(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let mut tx = begin_write(db).await?;

    validate::ensure_no_restricting_dependents(&mut tx, CLASSES.name, id).await?;

    let deleted = sqlx::query("DELETE FROM classes WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    if deleted > 0 {
        info!("deleted class {}", id);
    }
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn sample_class(course_id: i64, code: &str) -> NewClass {
    NewClass {
        course_id,
        code: code.to_string(),
        name: format!("Lớp {code}"),
        start_date: None,
        end_date: None,
        min_students: None,
        max_students: None,
        current_enrollment: None,
        status: None,
        lecturer_id: None,
        schedule_metadata: None,
        location: None,
    }
}
