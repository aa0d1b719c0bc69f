//! Paper maker
//!
//! Reads the normalized market feed as newline-delimited JSON on stdin,
//! runs the quoting engine against a simulated venue and publishes produced
//! events to other system components.

use axum::{routing::get, Json, Router};
use tokio::io::{AsyncBufReadExt, BufReader};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paper_maker::{Config, Engine, EngineHandle, EngineMetrics, ParsedMessage, Publisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Starting paper maker");

    let config = Config::load()?;
    info!(
        risk_factor = %config.risk_factor,
        spread_margin = %config.spread_margin,
        latency_min_ms = config.latency_min_ms,
        latency_max_ms = config.latency_max_ms,
        "Configuration loaded"
    );

    let metrics = EngineMetrics::new()?;
    metrics.register(prometheus::default_registry())?;

    let (engine, handle) = Engine::new(&config, metrics.clone());

    // Start health check server
    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(health_port).await {
            warn!(error = %e, "Health server error");
        }
    });

    // Forward produced events over IPC
    let publisher = Publisher::new(&config.ipc_socket_path).await?;
    let events = handle.subscribe();
    tokio::spawn(async move {
        if let Err(e) = publisher.run(events).await {
            warn!(error = %e, "Publisher stopped");
        }
    });

    let engine_task = tokio::spawn(engine.run());

    tokio::select! {
        result = read_feed(&handle, &metrics) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    handle.shutdown()?;
    engine_task.await??;

    Ok(())
}

/// Submit every parsable stdin line to the engine until EOF
async fn read_feed(handle: &EngineHandle, metrics: &EngineMetrics) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match ParsedMessage::parse(&line) {
            Ok(ParsedMessage::Event { event, dropped }) => {
                metrics.reject_inputs(dropped as u64);
                handle.submit(event)?;
            }
            Ok(ParsedMessage::Ignored(kind)) => {
                tracing::trace!(kind = %kind, "Ignoring feed message");
            }
            Err(e) => {
                metrics.reject_inputs(1);
                warn!(error = %e, "Failed to parse feed message");
            }
        }
    }

    info!("Feed ended");
    Ok(())
}

/// Start HTTP server for health checks and metrics
async fn start_health_server(port: u16) -> anyhow::Result<()> {
    use std::net::SocketAddr;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "Starting health check server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "component": "paper-maker",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn metrics() -> String {
    use prometheus::{Encoder, TextEncoder};
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
