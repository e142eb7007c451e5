//! NeuroDrive Console - operator backend for a biosignal-driven interface
//!
//! A Rust backend implementing a session state machine that coordinates
//! calibration recording, model training and live inference against a
//! remote signal-processing service.

mod api;
mod config;
mod remote;
mod runtime;
mod session;

use api::{create_router, AppState};
use config::Config;
use remote::HttpSignalService;
use runtime::spawn_session;
use session::SessionContext;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neurodrive=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env()?;
    tracing::info!(
        service_url = %config.service_url,
        motions = ?config.motions,
        record_secs = config.record_secs,
        "Configuration loaded"
    );

    // Session runtime against the remote service
    let service = HttpSignalService::new(config.service_url.as_str(), config.request_timeout);
    let ctx = SessionContext::new(
        config.motions.clone(),
        config.record_secs,
        config.poll_interval,
    );
    let handle = spawn_session(ctx, service);

    // Create router
    let state = AppState::new(handle);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("NeuroDrive console listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
