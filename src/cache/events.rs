//! Catalog write events.
//!
//! Every committed write produces one event. Any event invalidates the whole
//! query namespace; the kind is carried for logging.

use time::OffsetDateTime;
use uuid::Uuid;

/// Monotonic flush counter of the query cache.
pub type Epoch = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    LocaleUpserted { locale_id: i64 },
    LocaleDeleted { locale_id: i64 },
    TagUpserted { tag_id: i64 },
    TagDeleted { tag_id: i64 },
    TranslationUpserted { translation_id: i64 },
    TranslationDeleted { translation_id: i64 },
    TranslationTagsReplaced { translation_id: i64 },
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LocaleUpserted { .. } => "locale_upserted",
            Self::LocaleDeleted { .. } => "locale_deleted",
            Self::TagUpserted { .. } => "tag_upserted",
            Self::TagDeleted { .. } => "tag_deleted",
            Self::TranslationUpserted { .. } => "translation_upserted",
            Self::TranslationDeleted { .. } => "translation_deleted",
            Self::TranslationTagsReplaced { .. } => "translation_tags_replaced",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_get_distinct_ids() {
        let a = CacheEvent::new(EventKind::TagDeleted { tag_id: 1 });
        let b = CacheEvent::new(EventKind::TagDeleted { tag_id: 1 });

        assert_ne!(a.id, b.id);
        assert_eq!(a.kind, b.kind);
    }

    #[test]
    fn labels_are_snake_case() {
        let kind = EventKind::TranslationTagsReplaced { translation_id: 9 };
        assert_eq!(kind.label(), "translation_tags_replaced");
    }
}
