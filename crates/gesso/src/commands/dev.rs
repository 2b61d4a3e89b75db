//! Development server command.

use std::path::Path;

use anyhow::Result;
use gesso_server::{DevServer, DevServerConfig};
use gesso_static::SiteConfig;

/// Run the dev server.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let site = SiteConfig::load(config_path)?;
    let config = DevServerConfig {
        site,
        port,
        open,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
