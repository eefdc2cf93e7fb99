use std::error::Error;
use std::path::Path;

use api::{BridgeClient, BridgeConfig, BridgeService};

/// Start a bridge on an ephemeral port and a client pointed at it.
pub fn start_bridge() -> Result<(BridgeService, BridgeClient), Box<dyn Error>> {
    let service = BridgeService::new(BridgeConfig::ephemeral());
    let addr = service.start()?;
    let client = BridgeClient::with_addr(addr)?;
    Ok((service, client))
}

/// Write a small fixture file and return its path as sent over the wire.
pub fn write_model(dir: &Path, name: &str) -> Result<String, std::io::Error> {
    let path = dir.join(name);
    std::fs::write(&path, b"glTF")?;
    Ok(path.display().to_string())
}
