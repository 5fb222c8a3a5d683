pub mod config;
pub mod error;
pub mod hub;
pub mod identity;
pub mod websocket;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use hub::{ChatHub, ConnectionId, ServerEvent};
pub use identity::{Identity, IdentityPool};

/// Health check endpoint handler
/// Returns server status, timestamp and who is currently online
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let connections = state.hub.connection_count().await;
    let online = state.hub.online_users().await;

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "connections": connections,
        "online": online,
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub hub: Arc<ChatHub>,
}

impl AppState {
    pub fn new(config: Settings) -> Result<Self> {
        config.validate()?;

        let identities = match &config.identity.names {
            Some(names) => IdentityPool::with_names(names.iter().cloned())?,
            None => IdentityPool::new(),
        };

        Ok(Self {
            config: Arc::new(config),
            hub: Arc::new(ChatHub::new(identities)),
        })
    }
}
