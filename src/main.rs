use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use auth_service::{auth::handlers, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn cors(config: &Settings) -> Cors {
    if !config.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors_config = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
    } else {
        config
            .cors
            .origins()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
    };

    cors_config.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new().context("Failed to load configuration")?;
    info!("Configuration loaded successfully ({} environment)", config.environment);

    let state = AppState::new(&config)
        .await
        .context("Failed to initialize application state")?;
    let state = web::Data::new(state);

    let cleanup = state.spawn_session_cleanup(Duration::from_secs(
        config.session.cleanup_interval_secs.max(1),
    ));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .with_context(|| format!("Failed to bind {}:{}", config.server.host, config.server.port))?;
    info!("Auth service listening on {}:{}", config.server.host, config.server.port);

    let server_config = config.clone();
    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(&server_config))
            .wrap(Logger::default())
            .app_data(server_state.clone())
            .configure(handlers::configure)
    })
    .listen(listener)?
    .workers(config.server.workers.max(1) as usize)
    .run()
    .await
    .context("HTTP server failed")?;

    info!("Shutting down");
    cleanup.abort();
    state.shutdown().await?;

    Ok(())
}
