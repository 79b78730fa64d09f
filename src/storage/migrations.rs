use log::info;
use sqlx::PgPool;

use crate::utils::error::StoreError;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name TEXT,
        email TEXT UNIQUE NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now()
    )
"#;

const CREATE_MONTHLY_CONSUMPTIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS monthly_consumptions (
        id SERIAL PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
        cubic_meters NUMERIC NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now(),
        UNIQUE (user_id, year, month)
    )
"#;

const CREATE_PERIOD_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_monthly_consumptions_period ON monthly_consumptions(year, month)";

pub struct SchemaBootstrap;

impl SchemaBootstrap {
    pub fn statements() -> [&'static str; 3] {
        [CREATE_USERS, CREATE_MONTHLY_CONSUMPTIONS, CREATE_PERIOD_INDEX]
    }

    // Extended-protocol statements cannot be batched, so each runs on its own
    pub async fn run(pool: &PgPool) -> Result<(), StoreError> {
        info!("🔧 Initializing database schema...");

        for statement in Self::statements() {
            sqlx::query(statement).execute(pool).await?;
        }

        info!("✅ Database schema ready");
        Ok(())
    }
}
