//! Task Tracker API server
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `RUST_LOG`: Logging level (e.g., `debug`, `info`, `task_tracker=debug`)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `5000`)
//! - `CORS_ALLOWED_ORIGINS`: comma-separated allowed origins
//! - `SEED_SAMPLE_DATA`: seed three sample tasks into an empty store
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::process::ExitCode;

use chrono::Utc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use task_tracker::api::{AppState, cors_layer, router};
use task_tracker::config::{LogFormat, ServerConfig, parse_worker_threads};
use task_tracker::infrastructure::{RepositoryConfig, RepositoryFactory, seed_sample_tasks};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let max_threads = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get().saturating_mul(4))
        .unwrap_or(64);
    let worker_threads =
        parse_worker_threads(env::var("WORKER_THREADS").ok().as_deref(), max_threads);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if let Some(warning) = &worker_threads.warning {
        eprintln!("Warning: {warning}");
    }
    if let Some(threads) = worker_threads.threads {
        builder.worker_threads(threads);
    }

    let runtime = match builder.build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Failed to create tokio runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async_main())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "task_tracker=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn async_main() -> ExitCode {
    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            init_tracing(LogFormat::default());
            tracing::error!("Configuration error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(server_config.log_format);
    tracing::info!("Starting Task Tracker API");

    let repository_config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        storage_mode = ?repository_config.storage_mode,
        "Repository configuration loaded"
    );

    let task_repository = match RepositoryFactory::new(repository_config).create().await {
        Ok(repository) => {
            tracing::info!("Repository initialized successfully");
            repository
        }
        Err(error) => {
            tracing::error!("Failed to initialize repository: {}", error);
            return ExitCode::FAILURE;
        }
    };

    if server_config.seed_sample_data
        && let Err(error) = seed_sample_tasks(task_repository.as_ref(), Utc::now()).await
    {
        tracing::error!(%error, "Failed to seed sample tasks");
        return ExitCode::FAILURE;
    }

    let cors = cors_layer(&server_config.cors_allowed_origins);
    let application =
        router(AppState::new(task_repository), cors).layer(TraceLayer::new_for_http());

    let host = server_config.host.as_str();
    let port = server_config.port;
    let listener = match TcpListener::bind((host, port)).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}:{}", host, port);
            return ExitCode::FAILURE;
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    if let Err(error) = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(%error, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shutdown complete");
    ExitCode::SUCCESS
}

/// Completes on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
