pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod state;

pub use state::ApiState;

use axum::{Router, middleware as axum_middleware, routing::get, routing::put};

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    Router::new()
        .route(
            "/api/translations",
            get(handlers::list_translations).post(handlers::create_translation),
        )
        .route(
            "/api/translations/{id}",
            get(handlers::get_translation)
                .put(handlers::update_translation)
                .delete(handlers::delete_translation),
        )
        .route(
            "/api/translations/{id}/tags",
            put(handlers::replace_translation_tags),
        )
        .route(
            "/api/locales",
            get(handlers::list_locales).post(handlers::create_locale),
        )
        .route(
            "/api/locales/{id}",
            get(handlers::get_locale)
                .put(handlers::update_locale)
                .delete(handlers::delete_locale),
        )
        .route(
            "/api/tags",
            get(handlers::list_tags).post(handlers::create_tag),
        )
        .route(
            "/api/tags/{id}",
            get(handlers::get_tag)
                .put(handlers::update_tag)
                .delete(handlers::delete_tag),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ))
}
