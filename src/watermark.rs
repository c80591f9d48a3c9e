//! Analysis watermark: a single float of epoch seconds in a plain-text
//! file. Absence means "never analyzed"; unreadable contents are treated
//! the same way, with a logged warning.

use anyhow::Result;
use std::path::Path;
use tracing::warn;

pub fn read(path: &Path) -> Option<f64> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("could not read watermark file {}: {}", path.display(), e);
            return None;
        }
    };

    match raw.trim().parse::<f64>() {
        Ok(ts) => Some(ts),
        Err(e) => {
            warn!("ignoring unparsable watermark in {}: {}", path.display(), e);
            None
        }
    }
}

pub fn write(path: &Path, timestamp: f64) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, timestamp.to_string())?;
    Ok(())
}
