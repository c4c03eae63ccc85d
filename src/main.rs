use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codemall_api::{config::AppConfig, db, routes, state::AppState};

/// How many ports after the configured one are tried before falling back to
/// an ephemeral port.
const PORT_ATTEMPTS: u16 = 10;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,codemall_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %format!("{err:#}"), "server failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let orm = db::bootstrap(&config.database).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let host: IpAddr = config.host.parse()?;
    let listener = bind_with_fallback(host, config.port).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let state = AppState::new(orm.clone(), config);
    let app = routes::app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down, closing database pool");
    orm.close().await?;
    Ok(())
}

/// Binds the configured port, then the next few ports, then any free port.
async fn bind_with_fallback(host: IpAddr, port: u16) -> anyhow::Result<TcpListener> {
    let candidates = (0..=PORT_ATTEMPTS)
        .filter_map(|offset| port.checked_add(offset))
        .chain(std::iter::once(0));

    let mut last_error = None;
    for candidate in candidates {
        match TcpListener::bind(SocketAddr::new(host, candidate)).await {
            Ok(listener) => {
                if candidate != port {
                    tracing::warn!(requested = port, "port busy, using a fallback port");
                }
                return Ok(listener);
            }
            Err(err) => {
                tracing::debug!(port = candidate, error = %err, "bind failed");
                last_error = Some(err);
            }
        }
    }
    Err(match last_error {
        Some(err) => err.into(),
        None => anyhow::anyhow!("no port available"),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
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
}
