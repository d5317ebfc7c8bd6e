use std::io;
use std::path::Path;

/// Whether `path` exists. A missing path is `Ok(false)`; only real I/O failures
/// such as a permission error on a parent directory are returned as errors.
pub async fn exists(path: &Path) -> io::Result<bool> {
    tokio::fs::try_exists(path).await
}
