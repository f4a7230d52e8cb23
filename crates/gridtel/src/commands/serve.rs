//! `gridtel serve`: run the collector and the HTTP API until Ctrl-C.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};

use gridtel_core::Collector;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::error::CliError;
use crate::server;

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load(global)?;
    let listen: SocketAddr = match args.listen {
        Some(raw) => raw.parse().map_err(|e| CliError::Validation {
            field: "--listen".into(),
            reason: format!("{raw}: {e}"),
        })?,
        None => config.listen_addr()?,
    };
    let roster = config.roster()?;

    // Bind before spawning sessions so a busy port fails fast.
    let listener = TcpListener::bind(listen).await?;

    let mut collector = Collector::gnmi(config.collector_config(), roster);
    collector.start()?;

    let served = server::serve(listener, collector.snapshot_api(), shutdown_signal()).await;
    collector.shutdown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_interrupt(tokio::signal::ctrl_c()).await;
}

/// Resolves once the interrupt arrives. A handler that cannot be
/// installed never resolves, so the server keeps running.
async fn wait_for_interrupt(signal: impl Future<Output = std::io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(e) => {
            error!(error = %e, "cannot listen for Ctrl-C, stop the process another way");
            std::future::pending::<()>().await;
        }
    }
}
