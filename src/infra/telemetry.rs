use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache;
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            cache::METRIC_HIT,
            Unit::Count,
            "Total number of catalog query cache hits."
        );
        describe_counter!(
            cache::METRIC_MISS,
            Unit::Count,
            "Total number of catalog query cache misses."
        );
        describe_counter!(
            cache::METRIC_EVICT,
            Unit::Count,
            "Total number of query cache evictions due to capacity."
        );
        describe_counter!(
            cache::METRIC_EXPIRED,
            Unit::Count,
            "Total number of query cache entries dropped after their TTL."
        );
        describe_counter!(
            cache::METRIC_FLUSH,
            Unit::Count,
            "Total number of whole-namespace flushes triggered by writes."
        );
        describe_histogram!(
            cache::METRIC_COMPUTE_MS,
            Unit::Milliseconds,
            "Catalog query and shaping latency on cache miss in milliseconds."
        );
    });
}
