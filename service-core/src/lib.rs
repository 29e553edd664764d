//! service-core: shared infrastructure for the billing services.
pub mod config;
pub mod error;
pub mod observability;
pub mod persistence;
pub mod utils;

pub use async_trait;
pub use serde;
pub use serde_json;
pub use sqlx;
pub use tokio;
pub use tracing;
