use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chat_hub::websocket::WebSocketServer;
use chat_hub::{health_check, AppError, AppState, Settings};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> chat_hub::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging, RUST_LOG overrides the default level
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = AppState::new(config.clone())?;

    // Chat traffic runs on its own listener
    let listener = TcpListener::bind(config.websocket.bind_addr()).await?;
    let ws_server = Arc::new(WebSocketServer::new(state.hub.clone(), config.websocket.clone()));
    tokio::spawn(ws_server.run(listener));

    info!(
        "WebSocket server ready to accept connections at ws://{}{}",
        config.websocket.bind_addr(),
        config.websocket.path
    );
    info!("Starting health server at {}:{}", config.server.host, config.server.port);

    let state = web::Data::new(state);
    let cors_settings = config.cors.clone();

    HttpServer::new(move || {
        let cors = if cors_settings.enabled {
            let cors_config = Cors::default();

            let cors_config = if cors_settings.allow_any_origin {
                cors_config
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
            } else {
                cors_settings
                    .allowed_origins
                    .iter()
                    .fold(cors_config, |cors, origin| cors.allowed_origin(origin))
                    .allowed_methods(vec!["GET"])
            };

            cors_config.max_age(cors_settings.max_age as usize)
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
