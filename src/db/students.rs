use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::db::{begin_write, touch};
use crate::db::validate::{self, KeyPart};
use crate::error::StoreError;
use crate::models::student::DEFAULT_NATIONALITY;
use crate::models::{NewStudent, Student, UpdateStudent};
use crate::schema::STUDENTS;

pub async fn find_student_by_id(db: &SqlitePool, id: i64) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_student_by_user_id(
    db: &SqlitePool,
    user_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>("SELECT * FROM students WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn insert_student(db: &SqlitePool, req: NewStudent) -> Result<Student, StoreError> {
    let user_idx = &STUDENTS.unique_indexes[0];
    let code_idx = &STUDENTS.unique_indexes[1];

    let mut tx = begin_write(db).await?;

    validate::ensure_unique(&mut tx, user_idx, &[KeyPart::Text(&req.user_id)], None).await?;
    validate::ensure_unique_optional(&mut tx, code_idx, req.student_code.as_deref(), None).await?;

    let now = Utc::now();
    let nationality = req
        .nationality
        .unwrap_or_else(|| DEFAULT_NATIONALITY.to_string());

    let student = sqlx::query_as::<_, Student>(
        r#"
        INSERT INTO students
            (user_id, student_code, date_of_birth, place_of_birth, gender, ethnicity,
            nationality, id_number, phone_number, address, occupation, workplace,
            is_active, metadata, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        RETURNING *
        "#,
    )
    .bind(&req.user_id)
    .bind(&req.student_code)
    .bind(req.date_of_birth)
    .bind(&req.place_of_birth)
    .bind(&req.gender)
    .bind(&req.ethnicity)
    .bind(nationality)
    .bind(&req.id_number)
    .bind(&req.phone_number)
    .bind(&req.address)
    .bind(&req.occupation)
    .bind(&req.workplace)
    .bind(req.is_active.unwrap_or(true))
    .bind(req.metadata.map(Json))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(student)
}

pub async fn update_student(
    db: &SqlitePool,
    id: i64,
    req: UpdateStudent,
) -> Result<Option<Student>, StoreError> {
    let user_idx = &STUDENTS.unique_indexes[0];
    let code_idx = &STUDENTS.unique_indexes[1];

    let mut tx = begin_write(db).await?;

    let mut current = match sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
    {
        Some(s) => s,
        None => return Ok(None),
    };

    if let Some(user_id) = req.user_id {
        if user_id != current.user_id {
            validate::ensure_unique(&mut tx, user_idx, &[KeyPart::Text(&user_id)], Some(id))
                .await?;
        }
        current.user_id = user_id;
    }
    if let Some(student_code) = req.student_code {
        validate::ensure_unique_optional(&mut tx, code_idx, Some(&student_code), Some(id)).await?;
        current.student_code = Some(student_code);
    }
    if let Some(date_of_birth) = req.date_of_birth {
        current.date_of_birth = Some(date_of_birth);
    }
    if let Some(place_of_birth) = req.place_of_birth {
        current.place_of_birth = Some(place_of_birth);
    }
    if let Some(gender) = req.gender {
        current.gender = Some(gender);
    }
    if let Some(ethnicity) = req.ethnicity {
        current.ethnicity = Some(ethnicity);
    }
    if let Some(nationality) = req.nationality {
        current.nationality = Some(nationality);
    }
    if let Some(id_number) = req.id_number {
        current.id_number = Some(id_number);
    }
    if let Some(phone_number) = req.phone_number {
        current.phone_number = Some(phone_number);
    }
    if let Some(address) = req.address {
        current.address = Some(address);
    }
    if let Some(occupation) = req.occupation {
        current.occupation = Some(occupation);
    }
    if let Some(workplace) = req.workplace {
        current.workplace = Some(workplace);
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
        UPDATE students
        SET user_id = ?1,
            student_code = ?2,
            date_of_birth = ?3,
            place_of_birth = ?4,
            gender = ?5,
            ethnicity = ?6,
            nationality = ?7,
            id_number = ?8,
            phone_number = ?9,
            address = ?10,
            occupation = ?11,
            workplace = ?12,
            is_active = ?13,
            metadata = ?14,
            updated_at = ?15
        WHERE id = ?16
        "#,
    )
    .bind(&current.user_id)
    .bind(&current.student_code)
    .bind(current.date_of_birth)
    .bind(&current.place_of_birth)
    .bind(&current.gender)
    .bind(&current.ethnicity)
    .bind(&current.nationality)
    .bind(&current.id_number)
    .bind(&current.phone_number)
    .bind(&current.address)
    .bind(&current.occupation)
    .bind(&current.workplace)
    .bind(current.is_active)
    .bind(&current.metadata)
    .bind(current.updated_at)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some(current))
}

/// Enrollments and waitlist entries keep their `student_id`.
pub async fn delete_student(db: &SqlitePool, id: i64) -> Result<bool, StoreError> {
    let deleted = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}
