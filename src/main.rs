mod config;
mod handoff;
mod operator;
mod persist;
mod serve;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Receive files from a remote client, one armed name at a time: type a
/// file name at the prompt, the client discovers it over HTTP and PUTs
/// the bytes, which land in the upload directory under that name.
#[derive(Parser, Debug)]
#[command(name = "pagedrop", version, about)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "pagedrop.toml")]
    config: PathBuf,

    /// Listen port (overrides the PORT env var and config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides config)
    #[arg(long)]
    bind: Option<String>,

    /// Directory uploads are written into (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Extension appended to armed names that lack it (overrides config)
    #[arg(long)]
    extension: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let mut config = match config::DropConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };
    config.apply_env();
    config.apply_overrides(config::Overrides {
        port: cli.port,
        bind: cli.bind,
        dir: cli.dir,
        extension: cli.extension,
    });

    let (handoff, consumed) = handoff::handoff();
    let handoff = Arc::new(handoff);
    let state = serve::AppState {
        handoff: Arc::clone(&handoff),
        upload_dir: config.upload.dir.clone(),
    };

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "failed to bind");
            std::process::exit(1);
        }
    };
    if let Ok(local_addr) = listener.local_addr() {
        tracing::info!("pagedrop listening on {local_addr}");
    }

    let server = tokio::spawn(serve::run(listener, state));

    operator::run(handoff, consumed, &config.upload.extension).await;

    // The prompt loop is done (stdin closed or unreadable). The
    // listener stays up; nothing can be armed anymore, so polls report
    // idle and deliveries get 304.
    tracing::info!("prompt loop ended, server continues without an armed name");
    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "server error");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "server task failed");
            std::process::exit(1);
        }
    }
}
