use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Customer account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// One metered reading per user per calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ConsumptionRecord {
    pub id: i32,
    pub user_id: i32,
    pub year: i32,
    pub month: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub cubic_meters: Decimal,
    pub created_at: DateTime<Utc>,
}

pub const USER_COLUMNS: &str = "id, name, email, created_at";
pub const CONSUMPTION_COLUMNS: &str = "id, user_id, year, month, cubic_meters, created_at";
