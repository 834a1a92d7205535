use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use sqlx::types::Json;

pub const DEFAULT_NATIONALITY: &str = "Việt Nam";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub user_id: String,
    pub student_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub workplace: Option<String>,
    pub is_active: bool,
    pub metadata: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStudent {
    pub user_id: String,
    pub student_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub workplace: Option<String>,
    pub is_active: Option<bool>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStudent {
    pub user_id: Option<String>,
    pub student_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub occupation: Option<String>,
    pub workplace: Option<String>,
    pub is_active: Option<bool>,
    pub metadata: Option<Value>,
}
