pub mod filter;
pub mod gateway;
pub mod migrations;
pub mod models;

pub use filter::{ConsumptionFilter, FilterQuery};
pub use gateway::{Gateway, SqlParam};
pub use migrations::SchemaBootstrap;
pub use models::{ConsumptionRecord, User};
