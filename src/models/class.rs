use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

use super::ClassStatus;

pub const DEFAULT_MIN_STUDENTS: i32 = 10;
pub const DEFAULT_MAX_STUDENTS: i32 = 40;

/// A scheduled offering of a course.
///
/// `lecturer_id` holds a lecturer's `user_id` and is not enforced by a
/// foreign key. `current_enrollment` is maintained by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: i64,
    pub course_id: i64,
    pub code: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_students: i32,
    pub max_students: i32,
    pub current_enrollment: i32,
    pub status: ClassStatus,
    pub lecturer_id: Option<String>,
    pub schedule_metadata: Option<Json<Value>>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `status` is checked against the `class_status` domain before writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClass {
    pub course_id: i64,
    pub code: String,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_students: Option<i32>,
    pub max_students: Option<i32>,
    pub current_enrollment: Option<i32>,
    pub status: Option<String>,
    pub lecturer_id: Option<String>,
    pub schedule_metadata: Option<Value>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClass {
    pub course_id: Option<i64>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_students: Option<i32>,
    pub max_students: Option<i32>,
    pub current_enrollment: Option<i32>,
    pub status: Option<String>,
    pub lecturer_id: Option<String>,
    pub schedule_metadata: Option<Value>,
    pub location: Option<String>,
}
