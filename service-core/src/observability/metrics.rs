//! Metrics shared by every repository built on the persistence layer.

use once_cell::sync::Lazy;
use prometheus::{HistogramVec, histogram_opts, register_histogram_vec};

/// Database statement duration, labelled by table and repository operation.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "db_query_duration_seconds",
            "Database query duration"
        ),
        &["table", "operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});
