use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::db::{begin_write, touch};
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::{Lecturer, NewLecturer, UpdateLecturer};
use crate::schema::LECTURERS;

pub async fn find_lecturer_by_id(db: &SqlitePool, id: i64) -> Result<Option<Lecturer>, sqlx::Error> {
    sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_lecturer_by_user_id(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Option<Lecturer>, sqlx::Error> {
    sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_lecturer(db: &SqlitePool, req: NewLecturer) -> Result<Lecturer, StoreError> {
    let user_idx = &LECTURERS.unique_indexes[0];
    let employee_idx = &LECTURERS.unique_indexes[1];

    let mut tx = begin_write(db).await?;

    validate::ensure_unique(&mut tx, user_idx, &[KeyPart::Text(&req.user_id)], None).await?;
    validate::ensure_unique_optional(&mut tx, employee_idx, req.employee_code.as_deref(), None)
        .await?;

    let now = Utc::now();
    let lecturer = sqlx::query_as::<_, Lecturer>(
        r#"
        INSERT INTO lecturers
            (user_id, employee_code, department, title, specialization, phone_number,
            is_active, metadata, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
        RETURNING *
        "#,
    )
    .bind(&req.user_id)
    .bind(&req.employee_code)
    .bind(&req.department)
    .bind(&req.title)
    .bind(&req.specialization)
    .bind(&req.phone_number)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.metadata.map(Json))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(lecturer)
}

pub async fn update_lecturer(
    db: &SqlitePool,
    id: i64,
    req: UpdateLecturer,
) -> Result<Option<Lecturer>, StoreError> {
    let user_idx = &LECTURERS.unique_indexes[0];
    let employee_idx = &LECTURERS.unique_indexes[1];

    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, Lecturer>("SELECT * FROM lecturers WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(l) => l,
        None => return Ok(None),
    };

    if let Some(user_id) = req.user_id {
        if user_id != current.user_id {
            validate::ensure_unique(&mut tx, user_idx, &[KeyPart::Text(&user_id)], Some(id))
                .await?;
        }
        current.user_id = user_id;
    }
    if let Some(employee_code) = req.employee_code {
        validate::ensure_unique_optional(&mut tx, employee_idx, Some(&employee_code), Some(id))
            .await?;
        current.employee_code = Some(employee_code);
    }
    if let Some(department) = req.department {
        current.department = Some(department);
    }
    if let Some(title) = req.title {
        current.title = Some(title);
    }
    if let Some(specialization) = req.specialization {
        current.specialization = Some(specialization);
    }
    if let Some(phone_number) = req.phone_number {
        current.phone_number = Some(phone_number);
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
        UPDATE lecturers
        SET user_id = ?1,
            employee_code = ?2,
            department = ?3,
            title = ?4,
            specialization = ?5,
            phone_number = ?6,
            is_active = ?7,
            metadata = ?8,
            updated_at = ?9
        WHERE id = ?10
        "#,
    )
    .bind(&current.user_id)
    .bind(&current.employee_code)
    .bind(&current.department)
    .bind(&current.title)
    .bind(&current.specialization)
    .bind(&current.phone_number)
    .bind(current.is_active)
    .bind(&current.metadata)
    .bind(current.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(current))
}

/// Classes keep their `lecturer_id`; the reference simply dangles afterwards.
pub async fn delete_lecturer(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let deleted = sqlx::query("DELETE FROM lecturers WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_test_db;

    fn lecturer(user_id: &str, employee_code: Option<&str>) -> NewLecturer {
        NewLecturer {
            user_id: user_id.to_string(),
            employee_code: employee_code.map(str::to_string),
            department: Some("Toán".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_user_id() {
        let pool = setup_test_db().await;

        let created = insert_lecturer(&pool, lecturer("user-1", Some("GV001")))
            .await
            .expect("Failed to insert lecturer");
        assert!(created.is_active);

        let found = find_lecturer_by_user_id(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.employee_code.as_deref(), Some("GV001"));
    }

    #[tokio::test]
    async fn test_unique_user_and_employee_code() {
        let pool = setup_test_db().await;

        insert_lecturer(&pool, lecturer("user-1", Some("GV001"))).await.unwrap();

        let err = insert_lecturer(&pool, lecturer("user-1", None)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation { ref index } if index == "lecturers_userId_uidx"
        ));

        let err = insert_lecturer(&pool, lecturer("user-2", Some("GV001"))).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::ConstraintViolation { ref index } if index == "lecturers_employeeCode_uidx"
        ));
    }

    #[tokio::test]
    async fn test_absent_employee_codes_never_collide() {
        let pool = setup_test_db().await;

        insert_lecturer(&pool, lecturer("user-1", None)).await.unwrap();
        insert_lecturer(&pool, lecturer("user-2", None))
            .await
            .expect("two lecturers without employee code");
    }

    #[tokio::test]
    async fn test_deactivate_touches_updated_at() {
        let pool = setup_test_db().await;
        let created = insert_lecturer(&pool, lecturer("user-1", None)).await.unwrap();

        let updated = update_lecturer(
            &pool,
            created.id,
            UpdateLecturer {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert!(!updated.is_active);
        assert!(updated.updated_at > created.updated_at);
        assert!(delete_lecturer(&pool, created.id).await.unwrap());
        assert!(find_lecturer_by_id(&pool, created.id).await.unwrap().is_none());
    }
}
