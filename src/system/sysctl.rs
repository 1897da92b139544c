//! Kernel socket backlog limit.

use std::fs;
use std::path::Path;

/// nginx's default listen backlog on Linux.
pub const DEFAULT_BACKLOG: u32 = 511;

/// Read `net.core.somaxconn` from `path`, falling back to [`DEFAULT_BACKLOG`].
pub fn read_somaxconn(path: &Path) -> u32 {
    match fs::read_to_string(path) {
        Ok(content) => match content.trim().parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => {
                tracing::warn!(
                    path = %path.display(),
                    value = %content.trim(),
                    default = DEFAULT_BACKLOG,
                    "Invalid somaxconn value, using default"
                );
                DEFAULT_BACKLOG
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                default = DEFAULT_BACKLOG,
                "Failed to read somaxconn, using default"
            );
            DEFAULT_BACKLOG
        }
    }
}
