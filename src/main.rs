use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feegov::app::Stores;
use feegov::config::database::run_migrations;
use feegov::config::{AppConfig, Config, LogFormat};
use feegov::middleware::{Authenticate, IdentityResolver, PgIdentityResolver, RequestId};
use feegov::modules::health;
use feegov::AppServices;

fn init_tracing(app: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("feegov={},actix_web=info", app.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn cors(origin: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header("X-Request-ID")
        .max_age(3600);

    match origin {
        Some(origin) => cors.allowed_origin(origin),
        None => cors,
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.app);
    config.validate().context("Configuration validation failed")?;

    tracing::info!(
        env = %config.app.env,
        bind = %config.server.bind_address(),
        fee_mode = %config.fees.mode,
        default_fee_percentage = %config.fees.default_percentage,
        "Starting fee governance service"
    );

    if config.gateway.webhook_secret.is_none() {
        tracing::warn!("WEBHOOK_SECRET is not set; payment callbacks are accepted unsigned");
    }

    let pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    tracing::info!(
        pool_size = config.database.pool_size,
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    if config.database.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database migrations applied");
    }

    let services = AppServices::new(Stores::postgres(&pool), &config.fees, &config.gateway);
    let resolver: Arc<dyn IdentityResolver> = Arc::new(PgIdentityResolver::new(pool.clone()));
    let cors_origin = config.security.cors_allowed_origin.clone();

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Authenticate::new(resolver.clone()))
            .wrap(cors(cors_origin.as_deref()))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(pool.clone()))
            .route("/", web::get().to(index))
            .configure(health::configure)
            .configure(|cfg| services.configure(cfg))
    })
    .workers(config.server.workers)
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await.context("HTTP server failed")?;
    Ok(())
}
