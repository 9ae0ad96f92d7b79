//! CLI command implementations.

pub mod cache;
pub mod regions;
pub mod scan;

use anyhow::{Result, anyhow};
use shopscan::{ProcessHandle, ScannerConfig};
use tracing::debug;

use crate::display::first_chars;

/// Open the target process, turning failures into the two user-facing messages
pub fn open_process(config: &ScannerConfig) -> Result<ProcessHandle> {
    match ProcessHandle::find_by_name(&config.process_name) {
        Ok(process) => {
            debug!("Attached to {} (PID: {})", process.name, process.pid);
            Ok(process)
        }
        Err(e) if e.is_process_not_found() => Err(anyhow!(
            "{} not running! Start the game first.",
            config.process_name
        )),
        Err(e) => Err(anyhow!("Error: {}", first_chars(&e.to_string(), 50))),
    }
}
