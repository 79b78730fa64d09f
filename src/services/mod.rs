pub mod entity_service;
#[cfg(feature = "api")]
pub mod api_service;

pub use entity_service::EntityService;
#[cfg(feature = "api")]
pub use api_service::{ApiService, ApiServiceState};
