//! Standalone relay server binary.
//!
//! Usage: `relay-server [bind-addr]` (default 0.0.0.0:7777). The relay is
//! pure fan-out with identity tagging; run one per play session.

use anyhow::Result;
use net::RelayServer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "0.0.0.0:7777".to_string());

    let server = RelayServer::bind(&addr).await?;
    log::info!("relay listening on {}", server.local_addr()?);
    server.serve().await;
    Ok(())
}
