use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{begin_write, touch};
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::{Enrollment, EnrollmentStatus, NewEnrollment, UpdateEnrollment};
use crate::schema::ENROLLMENTS;

pub async fn find_enrollment_by_id(db: &SqlitePool, id: i64) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list_enrollments_by_class(
    db: &SqlitePool,
    class_id: i64,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE class_id = ? ORDER BY created_at, id")
        .bind(class_id)
        .fetch_all(db)
        .await
}

pub async fn list_enrollments_by_student(
    db: &SqlitePool,
    student_user_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE student_id = ? ORDER BY created_at, id")
        .bind(student_user_id)
        .fetch_all(db)
        .await
}

pub async fn list_enrollments_by_status(
    db: &SqlitePool,
    status: EnrollmentStatus,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE status = ? ORDER BY created_at, id")
        .bind(status)
        .fetch_all(db)
        .await
}

pub async fn insert_enrollment(db: &SqlitePool, req: NewEnrollment) -> Result<Enrollment, StoreError> {
    let status = match req.status.as_deref() {
        Some(s) => s.parse::<EnrollmentStatus>()?,
        None => EnrollmentStatus::default(),
    };

    let mut tx = begin_write(db).await?;

    if let Some(fk) = ENROLLMENTS.foreign_key("class_id") {
        validate::ensure_parent_exists(&mut tx, fk, req.class_id).await?;
    }
    validate::ensure_unique(
        &mut tx,
        &ENROLLMENTS.unique_indexes[0],
        &[KeyPart::Int(req.class_id), KeyPart::Text(&req.student_id)],
        None,
    )
    .await?;

    let now = Utc::now();
    let enrollment = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments
            (class_id, student_id, status, enrolled_at, notes, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        RETURNING *
        "#,
    )
    .bind(req.class_id)
    .bind(&req.student_id)
    .bind(status)
    .bind(req.enrolled_at)
    .bind(&req.notes)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(enrollment)
}

pub async fn update_enrollment(
    db: &SqlitePool,
    id: i64,
    req: UpdateEnrollment,
) -> Result<Option<Enrollment>, StoreError> {
    let status = req
        .status
        .as_deref()
        .map(str::parse::<EnrollmentStatus>)
        .transpose()?;

    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(e) => e,
        None => return Ok(None),
    };

    let key_changed = req.class_id.is_some_and(|c| c != current.class_id)
        || req.student_id.as_ref().is_some_and(|s| *s != current.student_id);

    if let Some(class_id) = req.class_id {
        if let Some(fk) = ENROLLMENTS.foreign_key("class_id") {
            validate::ensure_parent_exists(&mut tx, fk, class_id).await?;
        }
        current.class_id = class_id;
    }
    if let Some(student_id) = req.student_id {
        current.student_id = student_id;
    }
    if key_changed {
        validate::ensure_unique(
            &mut tx,
            &ENROLLMENTS.unique_indexes[0],
            &[KeyPart::Int(current.class_id), KeyPart::Text(&current.student_id)],
            Some(id),
        )
        .await?;
    }
    if let Some(status) = status {
        current.status = status;
    }
    if let Some(enrolled_at) = req.enrolled_at {
        current.enrolled_at = Some(enrolled_at);
    }
    if let Some(completed_at) = req.completed_at {
        current.completed_at = Some(completed_at);
    }
    if let Some(final_grade) = req.final_grade {
        current.final_grade = Some(final_grade);
    }
    if let Some(notes) = req.notes {
        current.notes = Some(notes);
    }
    current.updated_at = touch(current.updated_at);

    sqlx::query(
        r#"
        UPDATE enrollments
        SET class_id = ?1,
            student_id = ?2,
            status = ?3,
            enrolled_at = ?4,
            completed_at = ?5,
            final_grade = ?6,
            notes = ?7,
            updated_at = ?8
        WHERE id = ?9
        "#,
    )
    .bind(current.class_id)
    .bind(&current.student_id)
    .bind(current.status)
    .bind(current.enrolled_at)
    .bind(current.completed_at)
    .bind(&current.final_grade)
    .bind(&current.notes)
    .bind(current.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(current))
}

pub async fn delete_enrollment(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let deleted = sqlx::query("DELETE FROM enrollments WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if deleted > 0 {
        info!("deleted enrollment {}", id);
    }
    Ok(deleted > 0)
}

#[cfg(test)]
pub(crate) fn sample_enrollment(class_id: i64, student_id: &str) -> NewEnrollment {
    NewEnrollment {
        class_id,
        student_id: student_id.to_string(),
        status: None,
        enrolled_at: None,
        notes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::classes::{delete_class, find_class_by_id, insert_class, sample_class};
    use crate::db::courses::{insert_course, sample_course};
    use crate::db::setup_test_db;

    async fn seed_class(pool: &SqlitePool) -> i64 {
        let course = insert_course(pool, sample_course("MATH101")).await.unwrap();
        insert_class(pool, sample_class(course.id, "MATH101-01")).await.unwrap().id
    }

    #[tokio::test]
    async fn test_insert_enrollment_defaults_to_waitlist() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;

        let enrollment = insert_enrollment(&pool, sample_enrollment(class_id, "student-1"))
            .await
            .expect("Failed to insert enrollment");
        assert_eq!(enrollment.status, EnrollmentStatus::Waitlist);
        assert!(enrollment.enrolled_at.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_class_student_pair_is_rejected() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;

        let mut req = sample_enrollment(class_id, "student-1");
        req.notes = Some("original".to_string());
        let original = insert_enrollment(&pool, req).await.unwrap();

        let mut dup = sample_enrollment(class_id, "student-1");
        dup.status = Some("enrolled".to_string());
        let err = insert_enrollment(&pool, dup).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation { ref index } if index == "enrollments_class_student_uidx"
        ));

        let rows = list_enrollments_by_class(&pool, class_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, original.id);
        assert_eq!(rows[0].status, EnrollmentStatus::Waitlist);
        assert_eq!(rows[0].notes.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn test_same_student_in_other_class_is_allowed() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;
        let class = find_class_by_id(&pool, class_id).await.unwrap().unwrap();
        let other = insert_class(&pool, sample_class(class.course_id, "MATH101-02"))
            .await
            .unwrap();

        insert_enrollment(&pool, sample_enrollment(class_id, "student-1")).await.unwrap();
        insert_enrollment(&pool, sample_enrollment(other.id, "student-1")).await.unwrap();

        let rows = list_enrollments_by_student(&pool, "student-1").await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_update_into_taken_pair_is_rejected() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;

        insert_enrollment(&pool, sample_enrollment(class_id, "student-1")).await.unwrap();
        let second = insert_enrollment(&pool, sample_enrollment(class_id, "student-2"))
            .await
            .unwrap();

        let err = update_enrollment(
            &pool,
            second.id,
            UpdateEnrollment {
                student_id: Some("student-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation { .. }));

        let stored = find_enrollment_by_id(&pool, second.id).await.unwrap().unwrap();
        assert_eq!(stored.student_id, "student-2");
    }

    #[tokio::test]
    async fn test_status_progression_and_lookup() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;
        let enrollment = insert_enrollment(&pool, sample_enrollment(class_id, "student-1"))
            .await
            .unwrap();

        let now = Utc::now();
        let updated = update_enrollment(
            &pool,
            enrollment.id,
            UpdateEnrollment {
                status: Some("enrolled".to_string()),
                enrolled_at: Some(now),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Enrolled);
        assert_eq!(updated.enrolled_at, Some(now));

        let enrolled = list_enrollments_by_status(&pool, EnrollmentStatus::Enrolled)
            .await
            .unwrap();
        assert_eq!(enrolled.len(), 1);

        let err = update_enrollment(
            &pool,
            enrollment.id,
            UpdateEnrollment {
                status: Some("graduated".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }

    #[tokio::test]
    async fn test_class_delete_restricted_by_enrollment() {
        let pool = setup_test_db().await;
        let class_id = seed_class(&pool).await;
        let enrollment = insert_enrollment(&pool, sample_enrollment(class_id, "student-1"))
            .await
            .unwrap();

        let err = delete_class(&pool, class_id).await.unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)));
        assert!(find_class_by_id(&pool, class_id).await.unwrap().is_some());

        assert!(delete_enrollment(&pool, enrollment.id).await.unwrap());
        assert!(delete_class(&pool, class_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_class_is_referential_error() {
        let pool = setup_test_db().await;

        let err = insert_enrollment(&pool, sample_enrollment(7, "student-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReferentialIntegrity(_)));
    }
}
