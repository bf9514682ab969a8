//! Cache trigger service.
//!
//! Write services call the trigger after a commit. The trigger flushes the
//! query namespace immediately, so the next read observes the write.

use std::sync::Arc;

use tracing::{debug, info};

use crate::application::shape::ShapedTranslations;

use super::events::{CacheEvent, EventKind};
use super::store::QueryCache;

/// Store of shaped catalog responses keyed by normalized query.
pub type CatalogCache = QueryCache<Arc<ShapedTranslations>>;

/// Cache trigger for catalog writes.
///
/// ```ignore
/// // After a translation update commits:
/// trigger.translation_upserted(translation.id);
/// ```
#[derive(Clone)]
pub struct CacheTrigger {
    cache: Arc<CatalogCache>,
}

impl CacheTrigger {
    pub fn new(cache: Arc<CatalogCache>) -> Self {
        Self { cache }
    }

    /// Record a write and invalidate every cached query.
    pub fn trigger(&self, kind: EventKind) {
        if !self.cache.config().is_enabled() {
            debug!(event_kind = kind.label(), "Cache trigger skipped: cache disabled");
            return;
        }

        let event = CacheEvent::new(kind);
        let epoch = self.cache.flush_all();

        info!(
            event_id = %event.id,
            event_kind = event.kind.label(),
            epoch,
            "Query cache invalidated"
        );
    }

    pub fn locale_upserted(&self, locale_id: i64) {
        self.trigger(EventKind::LocaleUpserted { locale_id });
    }

    pub fn locale_deleted(&self, locale_id: i64) {
        self.trigger(EventKind::LocaleDeleted { locale_id });
    }

    pub fn tag_upserted(&self, tag_id: i64) {
        self.trigger(EventKind::TagUpserted { tag_id });
    }

    pub fn tag_deleted(&self, tag_id: i64) {
        self.trigger(EventKind::TagDeleted { tag_id });
    }

    pub fn translation_upserted(&self, translation_id: i64) {
        self.trigger(EventKind::TranslationUpserted { translation_id });
    }

    pub fn translation_deleted(&self, translation_id: i64) {
        self.trigger(EventKind::TranslationDeleted { translation_id });
    }

    pub fn translation_tags_replaced(&self, translation_id: i64) {
        self.trigger(EventKind::TranslationTagsReplaced { translation_id });
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }
}
