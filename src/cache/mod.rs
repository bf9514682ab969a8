//! Lexicon query cache.
//!
//! Caches shaped `GET /api/translations` responses keyed by the normalized
//! filter and output format. Any catalog write flushes the namespace.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 3600
//! max_entries = 1024
//! ```

mod config;
mod events;
mod keys;
mod lock;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use events::{CacheEvent, Epoch, EventKind};
pub use keys::{QUERY_NAMESPACE, QueryCacheKey};
pub use store::QueryCache;
pub use store::{
    METRIC_COMPUTE_MS, METRIC_EVICT, METRIC_EXPIRED, METRIC_FLUSH, METRIC_HIT, METRIC_MISS,
};
pub use trigger::{CacheTrigger, CatalogCache};
