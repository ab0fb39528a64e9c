use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use coinstats_core::{PollScheduler, ReqwestHttpClient};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Context;
use crate::cli::ServeArgs;
use crate::error::CliError;

/// Run the poll loop and the query API side by side until Ctrl-C.
pub async fn run(args: &ServeArgs, context: &Context) -> Result<(), CliError> {
    let store = context.open_store()?;
    let port = args
        .port
        .unwrap_or_else(|| context.config.snapshot().server.port);

    let scheduler = PollScheduler::with_default_adapters(
        Arc::new(ReqwestHttpClient::new()),
        store.clone(),
        Arc::clone(&context.config),
    );
    let shutdown = CancellationToken::new();
    let poller = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { scheduler.run(shutdown).await }
    });

    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(address).await?;
    info!(%address, "query service listening");

    let served = axum::serve(listener, coinstats_web::create_router(store))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;

    shutdown.cancel();
    if let Err(error) = poller.await {
        warn!(%error, "poll scheduler task failed");
    }
    served?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                warn!(%error, "cannot listen for ctrl-c");
                shutdown.cancelled().await;
            }
        }
        _ = shutdown.cancelled() => {}
    }
    info!("shutting down");
    shutdown.cancel();
}
