//! Shopping Canvas - conversation and state sync for an AI shopping assistant
//!
//! Keeps conversations, the product canvas, and the user's wishlist in step
//! with a remote shopping agent, and serves them to the canvas UI.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod actions;
mod catalog;
mod config;
mod conversation;
mod core;
mod routes;
mod storage;
mod transport;

use actions::ActionRegistry;
use config::{Config, StorageBackend};
use crate::core::{ChatRelay, SharedSession, ShoppingSession};
use storage::{MemoryStorage, PersistenceBridge, SqliteStorage};
use transport::HttpTransport;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<ChatRelay>,
}

async fn open_storage(config: &Config) -> PersistenceBridge {
    match config.storage {
        StorageBackend::Sqlite => {
            let path = config.data_dir.join("shopping.db");
            match SqliteStorage::new(&path).await {
                Ok(storage) => PersistenceBridge::new(Arc::new(storage)),
                Err(e) => {
                    tracing::warn!("Storage at {} unavailable, running without it: {}", path.display(), e);
                    PersistenceBridge::unavailable()
                }
            }
        }
        StorageBackend::Memory => PersistenceBridge::new(Arc::new(MemoryStorage::new())),
        StorageBackend::None => PersistenceBridge::unavailable(),
    }
}

async fn shutdown_signal(session: SharedSession) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down, saving conversation history");
    session.lock().await.persist_history().await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shopping_canvas=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let bridge = open_storage(&config).await;
    let session = ShoppingSession::load(bridge, config.assistant.proposal)
        .await
        .shared();

    let transport = HttpTransport::new(
        config.agent_url.clone(),
        Duration::from_secs(config.assistant.assistant.request_timeout_secs),
    )?;

    let actions = ActionRegistry::with_builtin();
    tracing::info!("Registered {} action(s)", actions.len());

    let relay = Arc::new(ChatRelay::new(
        config.agent_name.clone(),
        session.clone(),
        Arc::new(transport),
        Arc::new(actions),
    ));

    tracing::info!("Relaying to agent {} at {}", config.agent_name, config.agent_url);

    let state = AppState {
        config: Arc::new(config),
        relay,
    };

    let app = Router::new()
        .merge(routes::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Shopping canvas running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(session))
        .await?;

    Ok(())
}
