use std::{process, sync::Arc};

use lexicon::{
    application::{
        auth::TokenAuthenticator,
        catalog::TranslationCatalogService,
        error::{AppError, ServiceError},
        locales::LocaleService,
        seed::{CatalogSeeder, SeedPlan},
        tags::TagService,
        translations::TranslationService,
    },
    cache::{CacheConfig, CacheTrigger, CatalogCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(args) => run_seed(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let api_state = build_api_state(repositories, &settings);

    if !api_state.auth.has_tokens() {
        warn!(
            target = "lexicon::serve",
            "No API tokens configured; every /api request will be rejected"
        );
    }

    serve_http(&settings, api_state).await
}

async fn run_seed(settings: config::Settings, args: config::SeedArgs) -> Result<(), AppError> {
    let plan = SeedPlan::new(args.total, args.chunk)
        .map_err(|err| AppError::validation(err.to_string()))?;
    let repositories = init_repositories(&settings).await?;

    let report = CatalogSeeder::new(repositories)
        .run(&plan)
        .await
        .map_err(|err| AppError::from(ServiceError::from(err)))?;

    info!(
        target = "lexicon::seed",
        inserted = report.inserted,
        chunks = report.chunks,
        "Seed finished"
    );
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> ApiState {
    let cache = Arc::new(CatalogCache::new(CacheConfig::from(&settings.cache)));
    let cache_trigger = Some(Arc::new(CacheTrigger::new(cache.clone())));

    info!(
        target = "lexicon::serve",
        enabled = settings.cache.enabled,
        ttl_seconds = settings.cache.ttl_seconds.get(),
        max_entries = settings.cache.max_entries.get(),
        "Query cache configured"
    );

    let catalog = TranslationCatalogService::new(repositories.clone(), cache);
    let translations = TranslationService::new(
        repositories.clone(),
        repositories.clone(),
        repositories.clone(),
        repositories.clone(),
    )
    .with_cache_trigger_opt(cache_trigger.clone());
    let locales = LocaleService::new(repositories.clone(), repositories.clone())
        .with_cache_trigger_opt(cache_trigger.clone());
    let tags = TagService::new(repositories.clone(), repositories.clone())
        .with_cache_trigger_opt(cache_trigger);

    ApiState {
        auth: Arc::new(TokenAuthenticator::new(&settings.auth.tokens)),
        catalog: Arc::new(catalog),
        translations: Arc::new(translations),
        locales: Arc::new(locales),
        tags: Arc::new(tags),
        db: repositories,
    }
}

async fn serve_http(settings: &config::Settings, api_state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(api_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "lexicon::serve", addr = %settings.server.addr, "Listening");

    let drain = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service()).with_graceful_shutdown({
        let drain = drain.clone();
        async move { drain.notified().await }
    });
    let mut handle = tokio::spawn(async move { server.await });

    tokio::select! {
        joined = &mut handle => return server_result(joined),
        () = shutdown_signal() => {}
    }

    info!(target = "lexicon::serve", "Shutdown signal received; draining connections");
    drain.notify_one();

    match tokio::time::timeout(settings.server.graceful_shutdown, &mut handle).await {
        Ok(joined) => server_result(joined),
        Err(_) => {
            warn!(
                target = "lexicon::serve",
                grace_seconds = settings.server.graceful_shutdown.as_secs(),
                "Graceful shutdown timed out"
            );
            handle.abort();
            Ok(())
        }
    }
}

fn server_result(
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match joined {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "lexicon::serve", error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "lexicon::serve", error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
