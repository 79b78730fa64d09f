//! Isolated PostgreSQL fixtures for integration tests.
//!
//! Store-backed tests are `#[ignore]`d and run with
//! `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`. Each fixture
//! gets its own freshly created schema, selected through the connection's
//! `search_path`.

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;

use water_consumption::Gateway;

pub struct TestDb {
    pub gateway: Gateway,
    admin: PgPool,
    schema: String,
}

pub async fn isolated_db() -> TestDb {
    let url = std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|u| !u.is_empty())
        .expect("TEST_DATABASE_URL must be set to run store-backed tests");
    let schema = format!("test_{}", uuid::Uuid::new_v4().simple());

    let admin = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    sqlx::query(&format!("CREATE SCHEMA {}", schema))
        .execute(&admin)
        .await
        .expect("create test schema");

    let options = PgConnectOptions::from_str(&url)
        .expect("parse TEST_DATABASE_URL")
        .options([("search_path", schema.as_str())]);
    let gateway = Gateway::connect_with(options, 5, Duration::from_secs(10))
        .await
        .expect("connect gateway");
    gateway.initialize().await.expect("initialize schema");

    TestDb { gateway, admin, schema }
}

impl TestDb {
    pub async fn teardown(self) {
        self.gateway.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("drop test schema");
        self.admin.close().await;
    }
}
