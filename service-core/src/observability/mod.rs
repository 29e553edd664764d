pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::DB_QUERY_DURATION;
