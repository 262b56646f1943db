use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use luxe_backend::{
    config::{LogFormat, Settings, DEFAULT_CONFIG_FILE},
    router,
    store::FlatFileUserStore,
    AppState,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Luxe rental marketplace auth server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match settings.log_format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // warnings raised while loading go to a minimal stderr logger
    let startup_logger = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .finish();
    let settings = tracing::subscriber::with_default(startup_logger, || {
        Settings::load_from(&cli.config)
    })
    .with_context(|| format!("loading {}", cli.config.display()))?;

    init_tracing(&settings);
    tracing::info!(mode = ?settings.mode, data_dir = %settings.data_dir.display(), "configuration loaded");

    // Create storage
    let store = FlatFileUserStore::new(&settings.data_dir)
        .with_context(|| format!("opening user store at {}", settings.data_dir.display()))?;

    // Create application state
    let bootstrap_admin = settings.bootstrap_admin.clone();
    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(Arc::new(store), settings)?);

    if let Some(admin) = bootstrap_admin {
        state
            .auth
            .ensure_admin(&admin)
            .await
            .context("seeding bootstrap admin")?;
    }
    if state.federation.is_none() {
        tracing::info!("Google sign-in disabled (no [google] section)");
    }

    let app = router::create_router(state);

    // Start the server
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
