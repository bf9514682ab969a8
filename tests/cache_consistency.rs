use std::sync::Arc;

use sqlx::PgPool;

use lexicon::application::catalog::{CatalogQuery, TranslationCatalogService};
use lexicon::application::locales::{LocaleCommand, LocaleService};
use lexicon::application::shape::{ResponseFormat, ShapedTranslations};
use lexicon::application::translations::{TranslationCommand, TranslationService};
use lexicon::cache::{CacheConfig, CacheTrigger, CatalogCache};
use lexicon::infra::db::PostgresRepositories;

struct Harness {
    catalog: Arc<TranslationCatalogService>,
    translations: Arc<TranslationService>,
    locales: LocaleService,
    cache: Arc<CatalogCache>,
}

fn harness(pool: PgPool, config: CacheConfig) -> Harness {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let cache = Arc::new(CatalogCache::new(config));
    let trigger = Some(Arc::new(CacheTrigger::new(cache.clone())));

    Harness {
        catalog: Arc::new(TranslationCatalogService::new(repos.clone(), cache.clone())),
        translations: Arc::new(
            TranslationService::new(repos.clone(), repos.clone(), repos.clone(), repos.clone())
                .with_cache_trigger_opt(trigger.clone()),
        ),
        locales: LocaleService::new(repos.clone(), repos).with_cache_trigger_opt(trigger),
        cache,
    }
}

async fn seed_one(h: &Harness) -> i64 {
    let locale = h
        .locales
        .create(LocaleCommand {
            code: Some("fr".into()),
            name: Some("French".into()),
        })
        .await
        .expect("create locale");

    h.translations
        .create(TranslationCommand {
            key: Some("checkout.title".into()),
            content: Some("v0".into()),
            locale_id: Some(locale.id),
            tags: None,
        })
        .await
        .expect("create translation")
        .translation
        .id
}

fn first_content(shaped: &ShapedTranslations) -> String {
    match shaped {
        ShapedTranslations::Flat(rows) => rows[0].content.clone(),
        ShapedTranslations::Nested(_) => panic!("expected flat output"),
    }
}

async fn update_content(h: &Harness, id: i64, content: String) {
    h.translations
        .update(
            id,
            TranslationCommand {
                content: Some(content),
                ..Default::default()
            },
        )
        .await
        .expect("update translation");
}

#[sqlx::test(migrations = "./migrations")]
async fn read_after_write_sees_the_write(pool: PgPool) {
    let h = harness(pool, CacheConfig::default());
    let id = seed_one(&h).await;
    let query = CatalogQuery::default();

    for round in 1..=10 {
        // Warm the cache so the write has something to invalidate.
        h.catalog.query(&query).await.expect("query");

        let content = format!("v{round}");
        update_content(&h, id, content.clone()).await;

        let shaped = h.catalog.query(&query).await.expect("query");
        assert_eq!(first_content(&shaped), content);
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn racing_readers_do_not_pin_stale_results(pool: PgPool) {
    let h = harness(pool, CacheConfig::default());
    let id = seed_one(&h).await;

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let catalog = h.catalog.clone();
            tokio::spawn(async move {
                for _ in 0..25 {
                    catalog
                        .query(&CatalogQuery::default())
                        .await
                        .expect("query");
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for round in 1..=10 {
        update_content(&h, id, format!("v{round}")).await;
    }

    for reader in readers {
        reader.await.expect("reader task");
    }

    let shaped = h
        .catalog
        .query(&CatalogQuery::default())
        .await
        .expect("query");
    assert_eq!(first_content(&shaped), "v10");
}

#[sqlx::test(migrations = "./migrations")]
async fn disabled_cache_stores_nothing(pool: PgPool) {
    let h = harness(
        pool,
        CacheConfig {
            enabled: false,
            ..Default::default()
        },
    );
    seed_one(&h).await;

    h.catalog
        .query(&CatalogQuery::default())
        .await
        .expect("query");

    assert!(h.cache.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn flat_and_nested_share_the_flush(pool: PgPool) {
    let h = harness(pool, CacheConfig::default());
    let id = seed_one(&h).await;
    let nested = CatalogQuery {
        format: ResponseFormat::Nested,
        ..Default::default()
    };

    h.catalog.query(&CatalogQuery::default()).await.expect("flat");
    h.catalog.query(&nested).await.expect("nested");
    assert_eq!(h.cache.len(), 2);

    h.translations.delete(id).await.expect("delete");

    assert!(h.cache.is_empty());
    let shaped = h.catalog.query(&nested).await.expect("nested");
    assert!(shaped.is_empty());
}
