// bitflix - Movie catalog gateway and cached data-fetch client
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use bitflix::cli::Args;
use bitflix::config::AppConfig;
use bitflix::server::{create_router, AppState};
use bitflix::utils::logging::{self, presence};
use clap::Parser;
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, flags win over every other source
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting bitflix v{}", env!("CARGO_PKG_VERSION"));
    info!("Upstream URL: {}", presence(&config.upstream.base_url));
    info!("Upstream key: {}", presence(&config.upstream.api_key));
    info!(
        "Rate limit: {} requests per {}ms",
        config.rate_limit.max_requests, config.rate_limit.window_ms
    );
    info!("Max request size: {}", config.limits.max_request_size);
    info!("Upstream timeout: {}ms", config.upstream.timeout_ms);

    // Phase 3: Build shared state. A missing upstream URL or key does not
    // stop startup; proxied routes answer with a configuration error instead.
    let state = AppState::new(config.clone())?;
    let pruner = state.rate_limiter.clone().spawn_pruner();

    // Phase 4: Build and start HTTP server
    let app = create_router(state)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 5: Run server with graceful shutdown. Connect info feeds the
    // rate limiter's client identity.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    pruner.abort();
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
