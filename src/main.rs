//! Bakebot - conversation relay for a baking recipe assistant
//!
//! Bridges a web chat transcript to a managed dialog-understanding service.
//! One conversation per client session, one upstream dependency, and no
//! server-side state between requests.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod config;
pub mod conversation;
pub mod core;
pub mod dialog;
pub mod routes;
pub mod session;

use crate::config::{BotProfile, Config};
use crate::core::ExchangeEngine;
use crate::dialog::DialogRuntimeClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<ExchangeEngine>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bakebot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let profile = BotProfile::from_file(Path::new(&config.bot_profile_path))?;
    tracing::info!(
        bot = %profile.bot_id,
        locale = %profile.locale_id,
        "loaded bot profile"
    );

    let dialog = Arc::new(DialogRuntimeClient::new(profile));
    let engine = Arc::new(ExchangeEngine::new(dialog));

    let state = AppState {
        config: config.clone(),
        engine,
    };

    // Unmatched paths fall through to the client application so its own
    // routing keeps working on hard reloads.
    let spa = ServeDir::new(&config.web_root)
        .fallback(ServeFile::new(Path::new(&config.web_root).join("index.html")));

    let app = Router::new()
        .merge(routes::router())
        .fallback_service(spa)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Relay listening at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
