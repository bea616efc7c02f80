// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use app_operator::{
    constants::{
        DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_RETRY_PERIOD_SECS, KIND_APP,
        METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PATH, METRICS_SERVER_PORT,
        TOKIO_WORKER_THREADS,
    },
    context::Context,
    crd::App,
    metrics,
    reconcilers::reconcile_app,
    settings::Settings,
};
use axum::{routing::get, Router};
use futures::StreamExt;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] app_operator::errors::Error);

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("app-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting App Operator");
}

/// Start the Prometheus metrics HTTP server
///
/// Serves metrics on the configured port and path (default: 0.0.0.0:8080/metrics)
fn start_metrics_server() -> tokio::task::JoinHandle<()> {
    info!(
        bind_address = METRICS_SERVER_BIND_ADDRESS,
        port = METRICS_SERVER_PORT,
        path = METRICS_SERVER_PATH,
        "Starting Prometheus metrics HTTP server"
    );

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match metrics::gather_metrics() {
                Ok(metrics_text) => metrics_text,
                Err(e) => {
                    error!("Failed to gather metrics: {}", e);
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

        let bind_addr = format!("{METRICS_SERVER_BIND_ADDRESS}:{METRICS_SERVER_PORT}");
        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind metrics server to {bind_addr}: {e}");
                return;
            }
        };

        info!("Metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {e}");
        }
    })
}

/// Leader election configuration
struct LeaderElectionConfig {
    enabled: bool,
    lease_name: String,
    lease_namespace: String,
    identity: String,
    lease_duration: u64,
    retry_period: u64,
}

/// Load leader election configuration from environment variables
fn load_leader_election_config() -> LeaderElectionConfig {
    let enabled = std::env::var("APP_OPERATOR_ENABLE_LEADER_ELECTION")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let lease_name = std::env::var("APP_OPERATOR_LEASE_NAME")
        .unwrap_or_else(|_| "app-operator-leader".to_string());

    let lease_namespace = std::env::var("APP_OPERATOR_LEASE_NAMESPACE")
        .or_else(|_| std::env::var("POD_NAMESPACE"))
        .unwrap_or_else(|_| "giantswarm".to_string());

    let lease_duration = std::env::var("APP_OPERATOR_LEASE_DURATION_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_DURATION_SECS);

    let retry_period = std::env::var("APP_OPERATOR_LEASE_RETRY_PERIOD_SECONDS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_LEASE_RETRY_PERIOD_SECS);

    let identity = std::env::var("POD_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| format!("app-operator-{}", rand::random::<u32>()));

    LeaderElectionConfig {
        enabled,
        lease_name,
        lease_namespace,
        identity,
        lease_duration,
        retry_period,
    }
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let settings = Settings::from_env().map_err(|e| anyhow::anyhow!("fatal: {e}"))?;

    info!(
        chart_namespace = %settings.chart_namespace,
        resync_period_secs = settings.resync_period.as_secs(),
        unique_app = settings.unique_app,
        selector = %settings.version_selector(),
        "Settings loaded"
    );

    let config = kube::Config::infer().await?;
    let client = Client::try_from(config)?;

    let context = Arc::new(Context::new(client.clone(), settings));

    let _metrics_handle = start_metrics_server();

    let leader_election_config = load_leader_election_config();

    if leader_election_config.enabled {
        info!(
            lease_name = %leader_election_config.lease_name,
            lease_namespace = %leader_election_config.lease_namespace,
            identity = %leader_election_config.identity,
            "Leader election enabled, waiting to acquire leadership..."
        );

        let lease_manager =
            LeaseManagerBuilder::new(client.clone(), &leader_election_config.lease_name)
                .with_namespace(&leader_election_config.lease_namespace)
                .with_identity(&leader_election_config.identity)
                .with_duration(leader_election_config.lease_duration)
                .with_grace(leader_election_config.retry_period)
                .build()
                .await?;

        let (leader_rx, lease_handle) = lease_manager.watch().await;

        // Wait until we become leader
        let mut rx = leader_rx.clone();
        while !*rx.borrow_and_update() {
            rx.changed().await?;
        }

        info!("Leadership acquired, starting controller...");

        run_operator_with_leader_election(context, leader_rx, lease_handle).await?;
    } else {
        warn!("Leader election DISABLED - running without high availability");
        run_operator_with_signals(context).await?;
    }

    Ok(())
}

/// Monitor leadership status - returns when leadership is lost or an error occurs
async fn monitor_leadership(
    mut leader_rx: tokio::sync::watch::Receiver<bool>,
) -> Result<(), anyhow::Error> {
    loop {
        leader_rx.changed().await?;
        if !*leader_rx.borrow() {
            // Leadership lost
            return Ok(());
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
            result.map_err(anyhow::Error::from)
        }
        result = async {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                sigterm.recv().await;
                Ok::<(), anyhow::Error>(())
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
                Ok::<(), anyhow::Error>(())
            }
        } => {
            info!("Received SIGTERM (pod termination), initiating graceful shutdown...");
            result
        }
    }
}

/// Run the App controller until a shutdown signal arrives.
async fn run_operator_with_signals(context: Arc<Context>) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = shutdown_signal() => result,
        result = run_app_operator(context) => {
            error!("CRITICAL: App operator exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("App operator exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully");
    Ok(())
}

/// Run the App controller while monitoring leadership and signals.
async fn run_operator_with_leader_election(
    context: Arc<Context>,
    leader_rx: tokio::sync::watch::Receiver<bool>,
    _lease_handle: tokio::task::JoinHandle<
        Result<LeaseManager, kube_lease_manager::LeaseManagerError>,
    >,
) -> Result<()> {
    let shutdown_result: Result<()> = tokio::select! {
        result = shutdown_signal() => {
            info!("Stopping controller and releasing leader election lease...");
            result
        }
        result = monitor_leadership(leader_rx) => {
            match result {
                Ok(()) => {
                    warn!("Leadership lost! Stopping controller...");
                    anyhow::bail!("Leadership lost - stepping down")
                }
                Err(e) => {
                    error!("Leadership monitor error: {:?}", e);
                    anyhow::bail!("Leadership monitoring failed: {e}")
                }
            }
        }
        result = run_app_operator(context) => {
            error!("CRITICAL: App operator exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("App operator exited unexpectedly without error")
        }
    };

    shutdown_result?;
    info!("Graceful shutdown completed successfully, leader election lease released");
    Ok(())
}

/// Run the `App` controller.
///
/// The watch is bound to the operator version label, so one process owns a
/// disjoint slice of the App population and two operator versions can
/// coexist during an upgrade.
async fn run_app_operator(context: Arc<Context>) -> Result<()> {
    info!("Starting App operator");

    let client = context.client.clone();
    let api = Api::<App>::all(client);

    let watcher_config = watcher::Config::default().labels(&context.settings.version_selector());

    Controller::new(api, watcher_config)
        .run(reconcile_app_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `App`
async fn reconcile_app_wrapper(
    app: Arc<App>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = std::time::Instant::now();
    let object_key = format!(
        "{}/{}",
        app.namespace().unwrap_or_default(),
        app.name_any()
    );

    debug!(app = %object_key, "Reconcile wrapper called for App");

    let result = Box::pin(reconcile_app(&ctx, &app)).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            info!(app = %object_key, "Successfully reconciled App");
            metrics::record_reconciliation_success(KIND_APP, duration);
            ctx.reset_error_backoff(&object_key);

            // Converged; the resync tick guarantees eventual convergence
            // against drift the watch never surfaces.
            Ok(Action::requeue(ctx.settings.resync_period))
        }
        Err(e) => {
            error!(app = %object_key, "Failed to reconcile App: {}", e);
            metrics::record_reconciliation_error(KIND_APP, duration);
            Err(e.into())
        }
    }
}

/// Error policy for the controller.
///
/// Requeues the App with bounded exponential backoff tracked per object key;
/// the counter resets on the next successful sweep.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy(app: Arc<App>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    let object_key = format!(
        "{}/{}",
        app.namespace().unwrap_or_default(),
        app.name_any()
    );
    let delay = ctx.next_error_backoff(&object_key);

    error!(
        error = %err,
        app = %object_key,
        "Reconciliation error - will retry in {}s",
        delay.as_secs()
    );
    Action::requeue(delay)
}
