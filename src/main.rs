//! Task Manager API
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DB_NAME`: Database name, overrides the one in `DATABASE_URL`
//! - `RUST_LOG`: Logging filter (e.g., `debug`, `task_manager_api=debug`)
//! - `LOG_FORMAT`: `text` (default) | `json`
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3000`)
//! - `WORKER_THREADS`: Number of tokio worker threads (default: logical CPU count)

use std::env;
use std::fmt;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_manager_api::api::{self, AppState};
use task_manager_api::infrastructure::{RepositoryConfig, RepositoryFactory, TaskRepository};

/// Outcome of reading `WORKER_THREADS`.
#[derive(Debug, PartialEq, Eq)]
enum WorkerThreads {
    /// Unset or blank: tokio picks the logical CPU count.
    Default,
    Fixed(usize),
    /// Rejected or capped; the message is printed before tracing starts.
    Adjusted {
        threads: Option<usize>,
        warning: String,
    },
}

fn parse_worker_threads(value: Option<&str>) -> WorkerThreads {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return WorkerThreads::Default;
    }

    let limit = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get().saturating_mul(4))
        .unwrap_or(64);

    match trimmed.parse::<usize>() {
        Ok(0) => WorkerThreads::Adjusted {
            threads: None,
            warning: "WORKER_THREADS=0 is invalid (must be > 0), using default".to_string(),
        },
        Ok(requested) if requested > limit => WorkerThreads::Adjusted {
            threads: Some(limit),
            warning: format!("WORKER_THREADS={requested} exceeds limit ({limit}), capping"),
        },
        Ok(requested) => WorkerThreads::Fixed(requested),
        Err(error) => WorkerThreads::Adjusted {
            threads: None,
            warning: format!("WORKER_THREADS='{trimmed}' is not a valid number ({error}), using default"),
        },
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    match parse_worker_threads(env::var("WORKER_THREADS").ok().as_deref()) {
        WorkerThreads::Default => {
            eprintln!("Tokio worker_threads: using default (logical CPU count)");
        }
        WorkerThreads::Fixed(threads) => {
            builder.worker_threads(threads);
            eprintln!("Tokio worker_threads set to: {threads}");
        }
        WorkerThreads::Adjusted { threads, warning } => {
            eprintln!("Warning: {warning}");
            if let Some(threads) = threads {
                builder.worker_threads(threads);
            }
        }
    }

    let runtime = builder.build().expect("Failed to create tokio runtime");
    runtime.block_on(async_main());
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "task_manager_api=debug,tower_http=debug".into());
    let json = env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn async_main() {
    init_tracing();

    tracing::info!("Starting Task Manager API");

    let config = match RepositoryConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    tracing::info!(
        storage_mode = ?config.storage_mode,
        database_name = ?config.database_name,
        "Repository configuration loaded"
    );

    let factory = RepositoryFactory::new(config);
    let repository = match factory.create().await {
        Ok(repository) => {
            tracing::info!("Repository initialized successfully");
            repository
        }
        Err(error) => {
            tracing::error!("Failed to initialize repository: {}", error);
            std::process::exit(1);
        }
    };

    let application = api::router(AppState::new(Arc::clone(&repository)));

    let listener = match bind_listener().await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to open listener");
            std::process::exit(1);
        }
    };

    let shutdown = async {
        let signal = shutdown_signal().await;
        tracing::info!(%signal, "Shutdown requested, draining in-flight requests");
    };
    if let Err(error) = serve(listener, application, repository, shutdown).await {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Binds `HOST`:`PORT` (default `0.0.0.0:3000`).
async fn bind_listener() -> std::io::Result<TcpListener> {
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|port| port.parse::<u16>().ok())
        .unwrap_or(3000);

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening");
    Ok(listener)
}

/// Serves until `shutdown` resolves, then closes task storage once in-flight
/// requests have drained. Storage is closed even if serving failed.
async fn serve(
    listener: TcpListener,
    application: Router,
    repository: Arc<dyn TaskRepository>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let served = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown)
        .await;

    repository.close().await;
    tracing::info!("Task storage closed");
    served
}

/// The signal that ended the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => write!(formatter, "SIGINT"),
            Self::Terminate => write!(formatter, "SIGTERM"),
        }
    }
}

/// Waits for SIGINT or, on Unix, SIGTERM. A handler that cannot be
/// installed never fires.
async fn shutdown_signal() -> ShutdownSignal {
    let interrupt = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
        ShutdownSignal::Interrupt
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                ShutdownSignal::Terminate
            }
            Err(error) => {
                tracing::warn!(%error, "SIGTERM handler unavailable");
                std::future::pending::<ShutdownSignal>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownSignal>();

    tokio::select! {
        signal = interrupt => signal,
        signal = terminate => signal,
    }
}
