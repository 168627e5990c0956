use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use loaneval::api::routes::{create_router, AppState};
use loaneval::config::Config;
use loaneval::engine::DecisionEngine;
use loaneval::narrative::{NarrativeService, OpenAiClient};
use loaneval::observability::{init_tracing, MetricsRegistry};
use loaneval::policy::load_ruleset;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration
    let config = Config::parse();

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        "Starting loan evaluation service"
    );

    // The rule table is fixed for the life of the process
    let (policy, ruleset) =
        load_ruleset(config.policy_path.as_deref()).context("failed to load lending policy")?;
    let ruleset = Arc::new(ruleset);
    info!(
        rule_version = %policy.version,
        rules = ruleset.len(),
        "Rule table ready"
    );

    let metrics = Arc::new(MetricsRegistry::new());

    let narrative = match &config.openai_api_key {
        Some(key) => {
            let client = OpenAiClient::new(
                key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
                config.openai_max_tokens,
                config.narrative_timeout(),
            )
            .context("failed to build narrative client")?;
            info!(model = client.model(), "Narrative generation enabled");
            Some(NarrativeService::new(
                Arc::new(client),
                ruleset.clone(),
                metrics.clone(),
                config.narrative_max_attempts,
            ))
        }
        None => {
            warn!("No OpenAI API key configured, narrative endpoints disabled");
            None
        }
    };

    if config.api_key.is_none() {
        warn!("No API key configured, evaluation endpoints are unauthenticated");
    }

    // Create application state
    let state = Arc::new(AppState {
        engine: DecisionEngine::new(ruleset),
        narrative,
        metrics,
        environment: config.environment,
        public_domain: config.public_domain.clone(),
        api_key: config.api_key.clone(),
        start_time: Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        latency_budget_ms: config.latency_budget_ms,
        request_timeout: config.request_timeout(),
        max_concurrency: config.max_concurrency,
    });

    // Create router
    let app = create_router(state);

    // Parse listen address
    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", config.listen_addr))?;

    info!(addr = %addr, "Starting HTTP server");

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    if config.graceful_shutdown {
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();
        let shutdown_timeout = config.shutdown_timeout();
        tokio::select! {
            result = server => result?,
            _ = drain_deadline(shutdown_timeout) => {
                error!(timeout_secs = shutdown_timeout.as_secs(), "In-flight requests did not drain in time");
            }
        }
    } else {
        axum::serve(listener, app).await?;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Completes `timeout` after the shutdown signal, bounding the drain.
async fn drain_deadline(timeout: std::time::Duration) {
    shutdown_signal().await;
    tokio::time::sleep(timeout).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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

    info!("Received shutdown signal");
}
