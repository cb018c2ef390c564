// ABOUTME: Packages a build-context directory into a tar archive for the engine.
// ABOUTME: Runs on the blocking pool since tar walks the filesystem synchronously.

use bytes::Bytes;
use std::io;
use std::path::Path;

/// Tar the contents of `dir`, rooted at the archive's top level.
pub async fn archive_context(dir: &Path) -> io::Result<Bytes> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut builder = tar::Builder::new(Vec::new());
        builder.append_dir_all(".", &dir)?;
        builder.into_inner().map(Bytes::from)
    })
    .await
    .map_err(io::Error::other)?
}
