//! Water Consumption Service Library
//!
//! Tracks customers ("users") and their monthly water consumption readings
//! in PostgreSQL and exposes them over HTTP as JSON. The persistence
//! gateway owns the connection pool and schema bootstrap; the entity
//! service turns domain operations into parameterized statements.

pub mod cli;
pub mod config;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use services::EntityService;
#[cfg(feature = "api")]
pub use services::{ApiService, ApiServiceState};
pub use storage::{ConsumptionFilter, ConsumptionRecord, Gateway, User};
pub use utils::error::{ServiceError, StoreError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
