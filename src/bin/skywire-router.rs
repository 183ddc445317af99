//! Skywire router daemon
//!
//! Loads configuration, builds the routing table and runs the router and
//! its garbage collector until interrupted.

use clap::Parser;
use skywire::{
    app_channel, outbound_channel, packet_channel, spawn_gc, Config, MemoryTable, Router,
    RoutingTable,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

/// Skywire routing daemon
#[derive(Parser, Debug)]
#[command(name = "skywire-router", version, about)]
struct Args {
    /// Path to configuration file (overrides default search paths)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    info!("Skywire router starting");

    let (config, loaded_paths) = if let Some(config_path) = &args.config {
        match Config::load_file(config_path) {
            Ok(config) => (config, vec![config_path.clone()]),
            Err(e) => {
                error!("Failed to load configuration from {}: {}", config_path.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        match Config::load() {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        }
    };

    if loaded_paths.is_empty() {
        info!("No config files found, using defaults");
    } else {
        for path in &loaded_paths {
            info!(path = %path.display(), "Loaded config file");
        }
    }

    if !config.has_identity() {
        warn!("No identity configured, generating ephemeral keypair");
    }
    let identity = match config.create_identity() {
        Ok(identity) => identity,
        Err(e) => {
            error!("Failed to create identity: {}", e);
            std::process::exit(1);
        }
    };
    info!(pk = %identity.pubkey(), "Visor identity");

    let table_config = config.node.routing.table_config();
    info!(
        keep_alive_secs = table_config.keep_alive.as_secs(),
        gc_interval_secs = table_config.gc_interval.as_secs(),
        gc_batch_size = table_config.gc_batch_size,
        "Creating routing table"
    );
    let gc_interval = table_config.gc_interval;
    let table = Arc::new(MemoryTable::new(table_config));
    let gc = spawn_gc(Arc::clone(&table), gc_interval);

    let buffers = &config.node.buffers;
    let (packet_tx, packet_rx) = packet_channel(buffers.packet_channel());
    let (outbound_tx, mut outbound_rx) = outbound_channel(buffers.packet_channel());
    let (app_tx, mut app_rx) = app_channel(buffers.app_channel());

    // No transports or apps are attached; drain what the router emits.
    let drain = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(out) = outbound_rx.recv() => {
                    debug!(transport_id = %out.transport_id, len = out.data.len(), "Outbound packet discarded");
                }
                Some(msg) = app_rx.recv() => {
                    debug!(route_id = %msg.route_id, local_port = %msg.local_port, "App message discarded");
                }
                else => break,
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let router = Router::new(table.clone(), outbound_tx, app_tx);
    let router_task = tokio::spawn(async move { router.run(packet_rx, shutdown_rx).await });

    info!("Skywire router running, press Ctrl+C to exit");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    info!("Skywire router shutting down");

    let _ = shutdown_tx.send(true);
    match router_task.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("Router exited with error: {}", e),
        Err(e) => warn!("Router task failed: {}", e),
    }
    drop(packet_tx);
    let _ = drain.await;

    gc.stop().await;

    info!(rules = table.count(), "Skywire router shutdown complete");
}
