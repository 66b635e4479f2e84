use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::compat::TokioAsyncWriteCompatExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tictac::{KeyTable, Server, SessionConfig, StaticCredentials};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // the standard port needs privileges, so listen somewhere else by default
    let address: SocketAddr = std::env::var("TACACS_LISTEN")
        .ok()
        .and_then(|address| address.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5555)));

    let keys = KeyTable::with_default("this shouldn't be hardcoded");

    let mut credentials = StaticCredentials::new();
    credentials.add_user("someuser", "hunter2");

    let server = Server::new(keys, credentials, SessionConfig::default());
    let listener = TcpListener::bind(address).await?;
    tracing::info!(%address, "listening for TACACS+ clients");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        tracing::warn!(error = %err, "failed to accept connection");
                        continue;
                    }
                };

                // tokio has its own AsyncRead/AsyncWrite traits, so we need a compatibility shim
                let session = server.accept_session(stream.compat_write(), peer.ip());
                tokio::spawn(async move {
                    match session.run().await {
                        Ok(outcome) => tracing::info!(
                            %peer,
                            status = ?outcome.status,
                            user = %String::from_utf8_lossy(&outcome.user),
                            "authentication finished"
                        ),
                        Err(err) => tracing::warn!(%peer, error = %err, "authentication failed"),
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                server.shutdown();
                return Ok(());
            }
        }
    }
}
