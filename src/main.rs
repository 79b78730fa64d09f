use anyhow::{Context, Result};
use log::info;

use water_consumption::cli::{build_cli, handle_commands};
use water_consumption::{ApiService, Config, EntityService, Gateway, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = build_cli().get_matches();
    let config = Config::load(&matches).context("failed to load configuration")?;

    if handle_commands(&matches, &config)? {
        return Ok(());
    }

    info!("🚀 Water Consumption Service v{}", VERSION);

    let gateway = Gateway::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    gateway
        .initialize()
        .await
        .context("failed to initialize database schema")?;

    let mut api = ApiService::new(EntityService::new(gateway.clone()));
    api.start(&config.server.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address()))?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("📴 Shutdown signal received");

    api.stop().await;
    gateway.close().await;

    info!("👋 Goodbye!");
    Ok(())
}
