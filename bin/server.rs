// Catering Backend - Web Server

use anyhow::Result;
use catering::{logging::init_logging, server, Config, VERSION};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    info!("Catering backend v{VERSION}");

    let config = Config::load()?;
    server::serve(config).await
}
