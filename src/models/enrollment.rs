use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::EnrollmentStatus;

/// A student's registration in a class. At most one row per
/// `(class_id, student_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: i64,
    pub class_id: i64,
    pub student_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub final_grade: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub class_id: i64,
    pub student_id: String,
    pub status: Option<String>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEnrollment {
    pub class_id: Option<i64>,
    pub student_id: Option<String>,
    pub status: Option<String>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub final_grade: Option<String>,
    pub notes: Option<String>,
}
