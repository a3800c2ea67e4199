//! Vista host — entry point.
//!
//! ```text
//! vista-host                    Run in the foreground
//! vista-host --config <path>    Load a custom config TOML
//! vista-host --listen <addr>    Override the listen address
//! vista-host --gen-config       Write default config to stdout
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vista_core::{PlatformInjector, ProtocolEngine, Registry};
use vista_host::config::HostConfig;
use vista_host::server::{self, AppState};

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vista-host", about = "Vista screen sharing host")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "vista-host.toml")]
    config: PathBuf,

    /// Listen address, overriding the configured one.
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&HostConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config.
    let mut config = HostConfig::load(&cli.config);
    if let Some(listen) = cli.listen {
        config.network.listen = listen;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("vista-host v{}", env!("CARGO_PKG_VERSION"));
    info!("listening on: {}", config.network.listen);
    info!("target FPS: {}", config.screen.fps);

    let capture = config.open_capture();
    match capture.surface_size() {
        Ok((width, height)) => info!("capture surface: {width}x{height}"),
        Err(e) => tracing::warn!("capture surface unknown: {e}"),
    }

    let registry = Registry::with_code_length(config.code_length());
    info!("access code: {}", registry.current_code());

    let engine = ProtocolEngine::new(
        registry,
        capture,
        Arc::new(PlatformInjector::new()),
        config.to_engine_config(),
    );

    let listener = tokio::net::TcpListener::bind(config.network.listen).await?;
    server::serve(listener, AppState::new(engine), async {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received, shutting down");
    })
    .await?;

    Ok(())
}
