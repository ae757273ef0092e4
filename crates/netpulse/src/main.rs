//! `netpulse`: polls a UniFi controller and serves the latest stats.
//!
//! Entry point: CLI parsing, tracing setup, and wiring of the refresh
//! pipeline (scheduler → refresher → cache → notifier) to the HTTP layer.

mod cli;
mod error;
mod http;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder as RollingBuilder, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use netpulse_config::{FileSettings, ServerConfig, config_path, load_config};
use netpulse_core::{BroadcastNotifier, Cache, LegacyConnector, Refresher, Scheduler};

use crate::cli::{Cli, Command};
use crate::error::AppError;
use crate::http::{AppState, RefreshTrigger};

type Pulse = Refresher<FileSettings, LegacyConnector, BroadcastNotifier>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match init_tracing(&cli) {
        Ok(guard) => {
            let result = run(cli).await;
            // Flush buffered file logs before a possible `exit`.
            drop(guard);
            result
        }
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `-v`.
///
/// Returns the appender guard when logging to a file; it must live until
/// the process is done logging.
fn init_tracing(cli: &Cli) -> Result<Option<WorkerGuard>, AppError> {
    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,netpulse={level},netpulse_core={level},netpulse_api={level},tower_http={level}"
        ))
    });

    let (writer, guard) = match &cli.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("netpulse.log");

            let appender = RollingBuilder::new()
                .rotation(Rotation::NEVER)
                .filename_prefix(name)
                .build(dir)
                .map_err(|source| AppError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(cli.log_file.is_none());

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }

    Ok(guard)
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let path = cli.config.unwrap_or_else(config_path);
    let path_display = path.display().to_string();

    let config = load_config(&path).map_err(|source| AppError::Config {
        path: path_display.clone(),
        source,
    })?;

    let mut server = config.server;
    if let Some(bind) = cli.bind {
        server.bind = bind;
    }
    if let Some(secs) = cli.interval {
        server.refresh_interval_secs = secs;
    }
    server.validate().map_err(|source| AppError::Config {
        path: path_display.clone(),
        source,
    })?;

    let cache = Arc::new(Cache::new());
    let notifier = BroadcastNotifier::new();
    let refresher = Refresher::new(
        FileSettings::new(path),
        LegacyConnector,
        notifier.clone(),
        Arc::clone(&cache),
        server.refresh_interval(),
        server.top_clients,
    );

    match cli.command {
        Some(Command::Check) => check(&refresher, &path_display).await,
        None => serve(refresher, cache, notifier, &server, &path_display).await,
    }
}

/// One cycle, printed as a short summary.
async fn check(refresher: &Pulse, config_path: &str) -> Result<(), AppError> {
    let snapshot = refresher
        .run()
        .await
        .map_err(|e| AppError::from_refresh(e, config_path))?;

    let devices = &snapshot.devices;
    println!(
        "Controller OK: {} clients ({} wired, {} wireless), {} APs, {} switches",
        devices.clients,
        devices.wired_clients,
        devices.wireless_clients,
        devices.aps,
        devices.switches
    );
    if let Some(model) = &snapshot.gateway.model {
        println!(
            "Gateway: {model} (WAN {})",
            snapshot.gateway.wan_status.as_deref().unwrap_or("unknown")
        );
    }
    println!(
        "Throughput: {} B/s up, {} B/s down",
        snapshot.current_tx_rate, snapshot.current_rx_rate
    );
    Ok(())
}

async fn serve(
    refresher: Pulse,
    cache: Arc<Cache>,
    notifier: BroadcastNotifier,
    server: &ServerConfig,
    config_path: &str,
) -> Result<(), AppError> {
    let addr = server.bind_addr().map_err(|source| AppError::Config {
        path: config_path.to_owned(),
        source,
    })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    let scheduler = Arc::new(Scheduler::new(
        Arc::new(refresher),
        server.refresh_interval(),
    ));

    // The first cycle runs in the background so reads answer 503 instead
    // of hanging while the controller is slow.
    let starter = Arc::clone(&scheduler);
    tokio::spawn(async move { starter.start().await });

    let trigger: Arc<dyn RefreshTrigger> = Arc::<Scheduler<_>>::clone(&scheduler);
    let state = AppState::new(cache, notifier, trigger, server.refresh_interval());

    info!(%addr, "serving network stats");
    let served = axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    scheduler.stop().await;
    served.map_err(AppError::Serve)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown requested");
}
