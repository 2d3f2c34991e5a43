//! Lists the files on the default disk with their sizes.
//!
//! ```bash
//! GRAPH_CLIENT_ID=... GRAPH_CLIENT_SECRET=... GRAPH_TENANT_ID=contoso \
//! SHAREPOINT_DRIVE_ID=b!... FILESYSTEM_LOG_FORMAT=compact cargo run --example sharepoint_disk -- Reports
//! ```

use core_runtime::logging::{init_logging, strip_path, LoggingConfig};
use core_service::StorageManager;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(LoggingConfig::from_env())?;

    let directory = std::env::args().nth(1).unwrap_or_default();
    let manager = StorageManager::from_env()?;
    let disk = manager.default_disk()?;

    for path in disk.files(&directory, true).await? {
        let size = disk.size(&path).await?.unwrap_or_default();
        info!(file = strip_path(&path), size, "Found file");
    }

    Ok(())
}
