//! `link-to-social` HTTP server.
//!
//! ```bash
//! VENICE_API_KEY=... link-to-social --port 8000
//! curl -X POST localhost:8000/process -H 'content-type: application/json' \
//!      -d '{"url": "https://example.com/article"}'
//! ```

use anyhow::Context;
use clap::Parser;
use link_to_social::config::{self, Settings};
use link_to_social::server::{build_router, AppState};
use link_to_social::{ExecCtx, Pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Article URL to social posts and images
#[derive(Parser, Debug)]
#[command(name = "link-to-social", version)]
#[command(about = "Turn an article URL into LinkedIn/X posts and two generated images")]
struct Args {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "link_to_social=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    config::load_env(args.env_file.as_deref())?;
    let mut settings = Settings::from_env().context("loading configuration")?;
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    let ctx = ExecCtx::from_settings(&settings).context("building provider client")?;
    info!(
        base_url = %settings.provider.base_url,
        text_model = %settings.text_model,
        image_model = %settings.image_model,
        timeout_secs = settings.provider.request_timeout.as_secs(),
        "provider configured"
    );

    let state = Arc::new(AppState::new(Pipeline::new(ctx)));
    let app = build_router(state);

    let addr = settings.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(addr = %addr, "link-to-social listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
