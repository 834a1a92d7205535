use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::begin_write;
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::waitlist::DEFAULT_PRIORITY;
use crate::models::{NewWaitlistEntry, UpdateWaitlistEntry, WaitlistEntry};
use crate::schema::WAITLIST;

pub async fn find_waitlist_entry_by_id(
    db: &SqlitePool,
    id: i64,
) -> Result<Option<WaitlistEntry>, sqlx::Error> {
    sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Entries for a course in storage order: `priority` ascending, then
/// `requested_at`.
pub async fn list_waitlist_by_course(
    db: &SqlitePool,
    course_id: i64,
) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
    sqlx::query_as::<_, WaitlistEntry>(
        "SELECT * FROM waitlist WHERE course_id = ? ORDER BY priority, requested_at, id",
    )
    .bind(course_id)
    .fetch_all(db)
    .await
}

pub async fn list_waitlist_by_student(
    db: &SqlitePool,
    student_user_id: &str,
) -> Result<Vec<WaitlistEntry>, sqlx::Error> {
    sqlx::query_as::<_, WaitlistEntry>(
        "SELECT * FROM waitlist WHERE student_id = ? ORDER BY requested_at, id",
    )
    .bind(student_user_id)
    .fetch_all(db)
    .await
}

pub async fn insert_waitlist_entry(
    db: &SqlitePool,
    req: NewWaitlistEntry,
) -> Result<WaitlistEntry, StoreError> {
    let mut tx = begin_write(db).await?;

    if let Some(fk) = WAITLIST.foreign_key("course_id") {
        validate::ensure_parent_exists(&mut tx, fk, req.course_id).await?;
    }
    validate::ensure_unique(
        &mut tx,
        &WAITLIST.unique_indexes[0],
        &[KeyPart::Int(req.course_id), KeyPart::Text(&req.student_id)],
        None,
    )
    .await?;

    let now = Utc::now();
    let entry = sqlx::query_as::<_, WaitlistEntry>(
        r#"
        INSERT INTO waitlist
            (course_id, student_id, priority, requested_at, expires_at, notes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        RETURNING *
        "#,
    )
    .bind(req.course_id)
    .bind(&req.student_id)
    .bind(req.priority.unwrap_or(DEFAULT_PRIORITY))
    .bind(req.requested_at.unwrap_or(now))
    .bind(req.expires_at)
    .bind(&req.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(entry)
}

/// Waitlist rows carry no `updated_at`; only the given fields change.
pub async fn update_waitlist_entry(
    db: &SqlitePool,
    id: i64,
    req: UpdateWaitlistEntry,
) -> Result<Option<WaitlistEntry>, StoreError> {
    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, WaitlistEntry>("SELECT * FROM waitlist WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(e) => e,
        None => return Ok(None),
    };

    if let Some(priority) = req.priority {
        current.priority = priority;
    }
    if let Some(notified_at) = req.notified_at {
        current.notified_at = Some(notified_at);
    }
    if let Some(expires_at) = req.expires_at {
        current.expires_at = Some(expires_at);
    }
    if let Some(notes) = req.notes {
        current.notes = Some(notes);
    }

    let updated = sqlx::query(
        r#"
        UPDATE waitlist
        SET priority = ?1,
            notified_at = ?2,
            expires_at = ?3,
            notes = ?4
        WHERE id = ?5
        "#,
    )
    .bind(current.priority)
    .bind(current.notified_at)
    .bind(current.expires_at)
    .bind(&current.notes)
    .bind(id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(current))
}

pub async fn delete_waitlist_entry(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let deleted = sqlx::query("DELETE FROM waitlist WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn sample_entry(course_id: i64, student_id: &str) -> NewWaitlistEntry {
    NewWaitlistEntry {
        course_id,
        student_id: student_id.to_string(),
        priority: None,
        requested_at: None,
        expires_at: None,
        notes: None,
    }
}
