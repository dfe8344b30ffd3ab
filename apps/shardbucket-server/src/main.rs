//! Shardbucket server - one virtual S3 bucket over many physical buckets.
//!
//! The binary verifies inbound SigV4 signatures against the client-facing
//! credential pair, hash-routes object operations to one physical bucket,
//! re-signs them with the backend pair, and merges ListObjectsV2 results
//! across every bucket.
//!
//! # Usage
//!
//! ```text
//! BACKEND_ACCOUNT_ID=acct BUCKETS=shard-0,shard-1 ... shardbucket-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `VIRTUAL_BUCKET_NAME` | `shardbucket` | Bucket name in list responses |
//! | `BACKEND_DOMAIN` | `r2.cloudflarestorage.com` | Backend storage domain |
//! | `BACKEND_ACCOUNT_ID` | *(required)* | Backend account identifier |
//! | `BUCKETS` | *(required)* | Comma-separated physical bucket ids |
//! | `CLIENT_ACCESS_KEY_ID` | *(required)* | Key id clients sign with |
//! | `CLIENT_SECRET_ACCESS_KEY` | *(required)* | Secret clients sign with |
//! | `BACKEND_ACCESS_KEY_ID` | *(required)* | Key id for backend requests |
//! | `BACKEND_SECRET_ACCESS_KEY` | *(required)* | Secret for backend requests |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use shardbucket_core::ProxyConfig;
use shardbucket_proxy::{HttpsTransport, ProxyService};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: ProxyService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    // Wait for in-flight requests to complete.
    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the
/// health endpoint.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = ProxyConfig::from_env()?;
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = Arc::new(ProxyConfig::from_env()?);

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        virtual_bucket = %config.virtual_bucket,
        backend_host = %config.backend_host(),
        buckets = config.buckets.len(),
        version = VERSION,
        "starting Shardbucket server",
    );

    let transport = Arc::new(HttpsTransport::new());
    let service = ProxyService::new(Arc::clone(&config), transport);

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
