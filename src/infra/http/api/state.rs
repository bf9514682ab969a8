use std::sync::Arc;

use crate::application::auth::TokenAuthenticator;
use crate::application::catalog::TranslationCatalogService;
use crate::application::locales::LocaleService;
use crate::application::tags::TagService;
use crate::application::translations::TranslationService;
use crate::infra::db::PostgresRepositories;

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<TokenAuthenticator>,
    pub catalog: Arc<TranslationCatalogService>,
    pub translations: Arc<TranslationService>,
    pub locales: Arc<LocaleService>,
    pub tags: Arc<TagService>,
    pub db: Arc<PostgresRepositories>,
}
