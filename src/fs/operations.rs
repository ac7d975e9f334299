use std::path::Path;

use anyhow::Result;
use fs4::tokio::AsyncFileExt;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::debug;

/// Replaces the content of the file at `path` with `content`. Artifacts are regenerated from
/// scratch on every report, so there is no append mode.
///
/// The file is locked exclusively while it is written, so a reader picking up the previous
/// report never sees a half written one. The lock and the handle are released before returning,
/// whether the write succeeded or not.
pub async fn overwrite_file(path: &Path, content: &[u8]) -> Result<()> {
    debug!("Overwriting {path:?}");
    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await?;

    file.lock_exclusive()?;
    let result = write_locked(&mut file, content).await;
    file.unlock_async().await?;
    result
}

async fn write_locked(file: &mut File, content: &[u8]) -> Result<()> {
    // Truncation happens under the lock, opening with truncate would race with readers.
    file.set_len(0).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}
