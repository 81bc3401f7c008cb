//! Cubic server binary.
use std::path::Path;

use cubic::CubicServer;
use cubic::config::{CONFIG_PATH, CubicConfig};
use cubic::logger;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init()?;
    let config = CubicConfig::load_or_create(Path::new(CONFIG_PATH))?;

    let mut server = CubicServer::new(config)?;
    server.prepare_spawn()?;

    let cancel_token = server.cancel_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            log::info!("Shutting down");
            cancel_token.cancel();
        }
    });

    server.run().await
}
