//! Committed configuration persistence.
//!
//! # Design Decisions
//! - Whole-file replacement via rename: the proxy never reads a
//!   half-written configuration
//! - The temp file lives next to the target so the rename stays on one
//!   filesystem

use std::io::{self, Write};
use std::path::Path;

use tokio::task;

/// Read the committed configuration.
pub async fn read_committed(path: &Path) -> io::Result<Vec<u8>> {
    tokio::fs::read(path).await
}

/// [`persist`] on the blocking pool; `sync_all` can stall on slow disks.
pub async fn write_committed(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    task::spawn_blocking(move || persist(&path, &bytes))
        .await
        .map_err(io::Error::other)?
}

/// Atomically replace the file at `path` with `bytes`.
pub fn persist(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::Builder::new()
        .prefix(".nginx-cfg")
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
