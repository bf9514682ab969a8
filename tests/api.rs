use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use lexicon::application::auth::TokenAuthenticator;
use lexicon::application::catalog::TranslationCatalogService;
use lexicon::application::locales::LocaleService;
use lexicon::application::tags::TagService;
use lexicon::application::translations::TranslationService;
use lexicon::cache::{CacheConfig, CacheTrigger, CatalogCache};
use lexicon::infra::db::PostgresRepositories;
use lexicon::infra::http::{self, ApiState};

const TOKEN: &str = "test-token";

fn build_app(pool: PgPool) -> Router {
    let repos = Arc::new(PostgresRepositories::new(pool));
    let cache = Arc::new(CatalogCache::new(CacheConfig::default()));
    let trigger = Some(Arc::new(CacheTrigger::new(cache.clone())));

    let state = ApiState {
        auth: Arc::new(TokenAuthenticator::new([TOKEN])),
        catalog: Arc::new(TranslationCatalogService::new(repos.clone(), cache)),
        translations: Arc::new(
            TranslationService::new(repos.clone(), repos.clone(), repos.clone(), repos.clone())
                .with_cache_trigger_opt(trigger.clone()),
        ),
        locales: Arc::new(
            LocaleService::new(repos.clone(), repos.clone())
                .with_cache_trigger_opt(trigger.clone()),
        ),
        tags: Arc::new(
            TagService::new(repos.clone(), repos.clone()).with_cache_trigger_opt(trigger),
        ),
        db: repos,
    };

    http::build_router(state)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    let body = match body {
        Some(body) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> Value {
    let (status, body) = send(app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::OK, "GET {uri}: {body}");
    body
}

async fn create(app: &Router, uri: &str, body: Value) -> Value {
    let (status, body) = send(app, Method::POST, uri, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri}: {body}");
    body
}

struct Fixture {
    en: i64,
    fr: i64,
    mobile: i64,
    web: i64,
}

async fn fixture(app: &Router) -> Fixture {
    let en = create(app, "/api/locales", json!({"code": "en", "name": "English"})).await["id"]
        .as_i64()
        .unwrap();
    let fr = create(app, "/api/locales", json!({"code": "fr", "name": "French"})).await["id"]
        .as_i64()
        .unwrap();
    let mobile = create(app, "/api/tags", json!({"name": "mobile"})).await["id"]
        .as_i64()
        .unwrap();
    let web = create(app, "/api/tags", json!({"name": "web"})).await["id"]
        .as_i64()
        .unwrap();

    create(
        app,
        "/api/translations",
        json!({"key": "checkout.title", "content": "Paiement", "locale_id": fr, "tags": [mobile]}),
    )
    .await;
    create(
        app,
        "/api/translations",
        json!({"key": "checkout.subtitle", "content": "Payer maintenant", "locale_id": fr, "tags": [mobile, web]}),
    )
    .await;
    create(
        app,
        "/api/translations",
        json!({"key": "checkout.title", "content": "Checkout", "locale_id": en, "tags": [web]}),
    )
    .await;
    create(
        app,
        "/api/translations",
        json!({"key": "home.greeting", "content": "Hello there", "locale_id": en}),
    )
    .await;

    Fixture {
        en,
        fr,
        mobile,
        web,
    }
}

fn keys(body: &Value) -> Vec<(String, String)> {
    body.as_array()
        .expect("flat response is an array")
        .iter()
        .map(|entry| {
            (
                entry["locale"]["code"].as_str().unwrap().to_string(),
                entry["key"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn api_requires_bearer_token(pool: PgPool) {
    let app = build_app(pool);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/translations")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/translations")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "./migrations")]
async fn unfiltered_query_returns_everything_with_full_tags(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;

    let body = get(&app, "/api/translations").await;

    assert_eq!(body.as_array().unwrap().len(), 4);
    let subtitle = &body[1];
    assert_eq!(subtitle["key"], "checkout.subtitle");
    assert_eq!(
        subtitle["locale"],
        json!({"id": fx.fr, "code": "fr", "name": "French"})
    );
    assert_eq!(
        subtitle["tags"],
        json!([{"id": fx.mobile, "name": "mobile"}, {"id": fx.web, "name": "web"}])
    );
    assert_eq!(body[3]["tags"], json!([]));
}

#[sqlx::test(migrations = "./migrations")]
async fn tag_filter_narrows_rows_and_their_tags(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;

    let body = get(&app, &format!("/api/translations?tag={}", fx.mobile)).await;

    assert_eq!(
        keys(&body),
        vec![
            ("fr".to_string(), "checkout.title".to_string()),
            ("fr".to_string(), "checkout.subtitle".to_string()),
        ]
    );
    for entry in body.as_array().unwrap() {
        assert_eq!(entry["tags"], json!([{"id": fx.mobile, "name": "mobile"}]));
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn locale_and_tag_filters_intersect(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;

    let body = get(&app, &format!("/api/translations?locale=en&tag%5B%5D={}", fx.web)).await;

    assert_eq!(
        keys(&body),
        vec![("en".to_string(), "checkout.title".to_string())]
    );
    assert_eq!(body[0]["locale"]["id"], fx.en);
}

#[sqlx::test(migrations = "./migrations")]
async fn substring_filters_ignore_case(pool: PgPool) {
    let app = build_app(pool);
    fixture(&app).await;

    let by_key = get(&app, "/api/translations?key=CHECKOUT&locale=en").await;
    assert_eq!(
        keys(&by_key),
        vec![("en".to_string(), "checkout.title".to_string())]
    );

    let either = get(&app, "/api/translations?content=hello,paiement").await;
    assert_eq!(
        keys(&either),
        vec![
            ("fr".to_string(), "checkout.title".to_string()),
            ("en".to_string(), "home.greeting".to_string()),
        ]
    );

    let both = get(&app, "/api/translations?content=hello&key=checkout").await;
    assert_eq!(both, json!([]));
}

#[sqlx::test(migrations = "./migrations")]
async fn nested_format_merges_dotted_keys(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;

    let body = get(
        &app,
        &format!("/api/translations?format=1&locale=fr&tag={}", fx.mobile),
    )
    .await;

    assert_eq!(
        body,
        json!({
            "fr": {
                "mobile": {
                    "checkout": {
                        "title": "Paiement",
                        "subtitle": "Payer maintenant"
                    }
                }
            }
        })
    );

    let untagged = get(&app, "/api/translations?format=nested&key=home").await;
    assert_eq!(
        untagged,
        json!({"en": {"all": {"home": {"greeting": "Hello there"}}}})
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn invalid_filters_are_rejected(pool: PgPool) {
    let app = build_app(pool);

    let (status, body) = send(&app, Method::GET, "/api/translations?tag=abc&format=xml", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_failed");
    assert!(body["error"]["fields"]["tag"].is_array());
    assert!(body["error"]["fields"]["format"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn writes_invalidate_cached_results(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;
    let uri = format!("/api/translations?format=1&locale=fr&tag={}", fx.mobile);

    let before = get(&app, &uri).await;
    assert_eq!(before["fr"]["mobile"]["checkout"]["title"], "Paiement");

    let id = get(&app, "/api/translations?locale=fr&key=checkout.title").await[0]["id"]
        .as_i64()
        .unwrap();
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/translations/{id}"),
        Some(json!({"content": "Caisse"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let after = get(&app, &uri).await;
    assert_eq!(after["fr"]["mobile"]["checkout"]["title"], "Caisse");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/tags/{}", fx.mobile),
        Some(json!({"name": "handheld"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let renamed = get(&app, &uri).await;
    assert!(renamed["fr"].get("handheld").is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn keys_are_unique_per_locale_only(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/translations",
        Some(json!({"key": "checkout.title", "content": "Again", "locale_id": fx.fr})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["fields"]["key"].is_array());

    let es = create(&app, "/api/locales", json!({"code": "es", "name": "Spanish"})).await["id"]
        .as_i64()
        .unwrap();
    create(
        &app,
        "/api/translations",
        json!({"key": "checkout.title", "content": "Pagar", "locale_id": es}),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/locales",
        Some(json!({"code": "es", "name": "Castellano"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["fields"]["code"][0], "The code has already been taken.");
}

#[sqlx::test(migrations = "./migrations")]
async fn create_validates_required_fields(pool: PgPool) {
    let app = build_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/translations",
        Some(json!({"locale_id": 999, "tags": [42]})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &body["error"]["fields"];
    assert!(fields["key"].is_array());
    assert!(fields["content"].is_array());
    assert_eq!(fields["locale_id"][0], "The selected locale id is invalid.");
    assert!(fields["tags"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_ids_return_not_found(pool: PgPool) {
    let app = build_app(pool);

    for (method, uri, body) in [
        (Method::GET, "/api/translations/404", None),
        (
            Method::PUT,
            "/api/translations/404",
            Some(json!({"content": "x"})),
        ),
        (Method::DELETE, "/api/translations/404", None),
        (
            Method::PUT,
            "/api/locales/404",
            Some(json!({"code": "xx", "name": "X"})),
        ),
        (Method::DELETE, "/api/tags/404", None),
    ] {
        let (status, response) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response["error"]["code"], "not_found");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn tag_sync_replaces_the_full_set(pool: PgPool) {
    let app = build_app(pool);
    let fx = fixture(&app).await;
    let id = get(&app, "/api/translations?locale=fr&key=subtitle").await[0]["id"]
        .as_i64()
        .unwrap();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/translations/{id}/tags"),
        Some(json!({"tags": [fx.web]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!([{"id": fx.web, "name": "web"}]));

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/translations/{id}"),
        Some(json!({"tags": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["content"], "Payer maintenant");

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/translations/{id}/tags"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]["fields"]["tags"].is_array());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_translation_removes_join_rows(pool: PgPool) {
    let app = build_app(pool.clone());
    fixture(&app).await;
    let id = get(&app, "/api/translations?locale=fr&key=subtitle").await[0]["id"]
        .as_i64()
        .unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/api/translations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Translation deleted"}));

    let remaining: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM taggables WHERE taggable_type = 'translation' AND taggable_id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await
    .expect("count join rows");
    assert_eq!(remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_locale_cascades_to_translations(pool: PgPool) {
    let app = build_app(pool.clone());
    let fx = fixture(&app).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/api/locales/{}", fx.fr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Locale deleted"}));

    let body = get(&app, "/api/translations").await;
    assert!(keys(&body).iter().all(|(code, _)| code == "en"));

    let orphans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM taggables tg WHERE tg.taggable_type = 'translation' \
         AND NOT EXISTS (SELECT 1 FROM translations t WHERE t.id = tg.taggable_id)",
    )
    .fetch_one(&pool)
    .await
    .expect("count orphans");
    assert_eq!(orphans, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn locale_and_tag_crud_round_trip(pool: PgPool) {
    let app = build_app(pool);

    let locale = create(&app, "/api/locales", json!({"code": "de", "name": "German"})).await;
    let id = locale["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/locales/{id}"),
        Some(json!({"code": "de", "name": "Deutsch"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Deutsch");

    let listed = get(&app, "/api/locales").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let tag = create(&app, "/api/tags", json!({"name": "tv"})).await;
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/tags/{}", tag["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Tag deleted"}));
    assert_eq!(get(&app, "/api/tags").await, json!([]));
}
