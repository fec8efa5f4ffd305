pub mod client;

pub use client::*;

use std::path::PathBuf;

/// Returns the global config directory path: `~/.config/tms/`
///
/// `TMS_CONFIG_DIR` takes precedence when set.
pub fn dirs_global() -> PathBuf {
    if let Ok(dir) = std::env::var("TMS_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("tms")
}
