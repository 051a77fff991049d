// This file is part of bin-lookup. Copyright © 2026 bin-lookup contributors.
// bin-lookup is licensed under the GNU AGPL v3.0 or any later version. See LICENSE file for full text.

use bin_lookup::cache::CacheManager;
use bin_lookup::cli_args::BinLookupArgs;
use bin_lookup::config::Config;
use bin_lookup::nemo::NemoClient;
use bin_lookup::web;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let args = BinLookupArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bin_lookup=debug")),
        )
        .init();

    let config = match Config::from_env(&args) {
        Ok(config) => config,
        Err(error) => {
            error!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    info!("starting {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("server: {}:{}", config.host, config.port);
    info!("NEMO user URL: {}", config.user_url);
    info!("NEMO bin URL: {}", config.bin_url);
    info!("cache refresh interval: {}s", config.cache_ttl.as_secs());
    info!("API timeout: {}", config.timeout_label());

    let client = match NemoClient::new(&config) {
        Ok(client) => client,
        Err(error) => {
            error!("failed to build NEMO client: {error}");
            return ExitCode::FAILURE;
        }
    };
    let cache = Arc::new(CacheManager::new(client, config.cache_ttl));

    // lookups must never serve from a cache that has not completed a load, so
    // the first refresh is mandatory and failure here is fatal
    match cache.refresh().await {
        Ok(summary) => info!("initial cache load: {} users, {} bins", summary.users, summary.bins),
        Err(error) => {
            error!("initial cache load failed: {error}");
            return ExitCode::FAILURE;
        }
    }

    let listener = match TcpListener::bind((config.host.as_str(), config.port)).await {
        Ok(listener) => listener,
        Err(error) => {
            error!("failed to bind {}:{}: {error}", config.host, config.port);
            return ExitCode::FAILURE;
        }
    };
    info!("listening on http://{}:{}", config.host, config.port);
    info!("endpoints: GET /bin/<bin_id>, GET /refresh, GET /health");

    let app = web::router(cache);
    match axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        Ok(()) => {
            info!("shutting down now");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("server error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {error}");
    }
}
