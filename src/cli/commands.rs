//! Command dispatch: bootstrap, serve, shutdown
//!
//! `serve` loads the schema table, opens one log per resource, and runs the
//! store lifecycle and the HTTP server until a termination signal arrives.
//! Both workers share one stop channel; shutdown waits for their drains
//! with an outer deadline slightly above the store's own grace window.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time;

use crate::http_server::{AppState, HttpConfig, HttpServer};
use crate::observability::{Logger, Severity};
use crate::schema::{load_schemas, open_logs, SchemaError};
use crate::storage::LogError;
use crate::store::{Store, StoreError};

use super::args::Command;

/// Outer shutdown deadline; the store's own drain window is 10 s.
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(12);

/// Errors surfaced by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid --addr \"{0}\", expected host:port")]
    BadAddr(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("worker terminated abnormally: {0}")]
    Join(String),
}

/// Dispatches a parsed CLI command.
pub fn run_command(command: Command) -> Result<(), CliError> {
    match command {
        Command::Serve { data_dir, addr } => serve(&data_dir, &addr),
    }
}

fn serve(data_dir: &Path, addr: &str) -> Result<(), CliError> {
    let config = HttpConfig::from_addr(addr).ok_or_else(|| CliError::BadAddr(addr.to_string()))?;

    let schemas = load_schemas(data_dir)?;
    let logs = open_logs(data_dir, &schemas)?;
    let store = Arc::new(Store::new(schemas, logs));

    Logger::log(
        Severity::Info,
        "rowdb.starting",
        &[
            ("data_dir", &data_dir.display().to_string()),
            ("addr", &config.socket_addr()),
        ],
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve_until_shutdown(store, config))
}

async fn serve_until_shutdown(store: Arc<Store>, config: HttpConfig) -> Result<(), CliError> {
    let (stop_tx, stop_rx) = watch::channel(());

    let state = Arc::new(AppState {
        store: Arc::clone(&store),
    });
    let server = HttpServer::new(config, state);

    let mut store_task = tokio::spawn(Arc::clone(&store).run(stop_rx.clone()));
    let mut http_task = tokio::spawn(server.start(stop_rx));

    tokio::select! {
        sig = shutdown_signal() => {
            sig?;
            Logger::log(Severity::Info, "rowdb.shutdown.requested", &[]);
            let _ = stop_tx.send(());

            let drain = async { (store_task.await, http_task.await) };
            match time::timeout(SHUTDOWN_DEADLINE, drain).await {
                Ok((store_res, http_res)) => {
                    report_worker("store", flatten_store(store_res));
                    report_worker("http", flatten_http(http_res));
                    Logger::log(Severity::Info, "rowdb.shutdown.complete", &[]);
                    Ok(())
                }
                Err(_) => {
                    Logger::log_stderr(Severity::Error, "rowdb.shutdown.timed_out", &[]);
                    Ok(())
                }
            }
        }
        res = &mut store_task => {
            // The store died on its own; take the server down with it.
            let _ = stop_tx.send(());
            let _ = http_task.await;
            flatten_store(res)
        }
        res = &mut http_task => {
            let _ = stop_tx.send(());
            let _ = store_task.await;
            flatten_http(res)
        }
    }
}

async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res,
            _ = terminate.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}

fn flatten_store(
    res: Result<Result<(), StoreError>, tokio::task::JoinError>,
) -> Result<(), CliError> {
    match res {
        Ok(inner) => inner.map_err(CliError::from),
        Err(join) => Err(CliError::Join(join.to_string())),
    }
}

fn flatten_http(res: Result<io::Result<()>, tokio::task::JoinError>) -> Result<(), CliError> {
    match res {
        Ok(inner) => inner.map_err(CliError::from),
        Err(join) => Err(CliError::Join(join.to_string())),
    }
}

fn report_worker(worker: &str, res: Result<(), CliError>) {
    if let Err(e) = res {
        Logger::log_stderr(
            Severity::Error,
            "rowdb.shutdown.worker_failed",
            &[("worker", worker), ("error", &e.to_string())],
        );
    }
}
