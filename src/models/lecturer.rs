use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lecturer {
    pub id: i64,
    pub user_id: String,
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: bool,
    pub metadata: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLecturer {
    pub user_id: String,
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateLecturer {
    pub user_id: Option<String>,
    pub employee_code: Option<String>,
    pub department: Option<String>,
    pub title: Option<String>,
    pub specialization: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub metadata: Option<Value>,
}
