pub mod error;

pub use error::{ServiceError, StoreError};
