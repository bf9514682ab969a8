//! Read side of the catalog: normalize, query, shape, cache.

use std::sync::Arc;

use tracing::debug;

use crate::application::error::ServiceError;
use crate::application::repos::TranslationsRepo;
use crate::application::shape::{ResponseFormat, ShapedTranslations, shape};
use crate::cache::{CatalogCache, QueryCacheKey};
use crate::domain::error::ValidationErrors;
use crate::domain::filter::{RawTranslationQuery, TranslationFilter};

/// A validated catalog request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub filter: TranslationFilter,
    pub format: ResponseFormat,
}

impl CatalogQuery {
    pub fn from_raw(raw: &RawTranslationQuery) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let filter = TranslationFilter::from_raw(raw)
            .map_err(|err| errors.merge(err))
            .ok();
        let format = ResponseFormat::from_raw(raw.format.as_ref())
            .map_err(|err| errors.merge(err))
            .ok();

        match (filter, format) {
            (Some(filter), Some(format)) => Ok(Self { filter, format }),
            _ => Err(errors),
        }
    }

    pub fn cache_key(&self) -> QueryCacheKey {
        QueryCacheKey::for_query(&self.filter, self.format)
    }
}

#[derive(Clone)]
pub struct TranslationCatalogService {
    reader: Arc<dyn TranslationsRepo>,
    cache: Arc<CatalogCache>,
}

impl TranslationCatalogService {
    pub fn new(reader: Arc<dyn TranslationsRepo>, cache: Arc<CatalogCache>) -> Self {
        Self { reader, cache }
    }

    pub async fn query(
        &self,
        query: &CatalogQuery,
    ) -> Result<Arc<ShapedTranslations>, ServiceError> {
        let key = query.cache_key();
        debug!(cache_key = %key, format = query.format.as_str(), "Catalog query");

        self.cache
            .remember(key, || async {
                let rows = self.reader.find_matching(&query.filter).await?;
                Ok::<_, ServiceError>(Arc::new(shape(&rows, query.format)))
            })
            .await
    }
}
