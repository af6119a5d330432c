//! Output files are written to a temporary sibling first and renamed into
//! place only once complete, so a failed run never leaves a partial file.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::contract::ResultStream;
use crate::error::{Error, Result};

fn temp_file_beside(destination: &Path) -> Result<NamedTempFile> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tempfile::Builder::new()
        .prefix(".iofxml-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| {
            error!(error = ?e, dir = %dir.display(), "Failed to create temporary file");
            Error::io(dir, e)
        })
}

fn persist(temp: NamedTempFile, destination: &Path) -> Result<()> {
    temp.persist(destination).map_err(|e| {
        error!(error = ?e.error, path = %destination.display(), "Failed to move file into place");
        Error::io(destination, e.error)
    })?;
    Ok(())
}

/// Write `contents` to `destination` in one all-or-nothing step.
pub fn write_atomic(destination: &Path, contents: &str) -> Result<()> {
    let mut temp = temp_file_beside(destination)?;
    temp.write_all(contents.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| Error::io(temp.path(), e))?;
    persist(temp, destination)?;
    info!(path = %destination.display(), bytes = contents.len(), "Wrote output file");
    Ok(())
}

/// Stream `body` into `destination` chunk by chunk.
///
/// On a mid-stream failure the temporary file is removed and `destination` is
/// left as it was.
pub async fn save_stream(mut body: ResultStream, destination: &Path) -> Result<PathBuf> {
    let temp = temp_file_beside(destination)?;
    let handle = temp
        .as_file()
        .try_clone()
        .map_err(|e| Error::io(temp.path(), e))?;
    let mut file = tokio::fs::File::from_std(handle);

    let mut written = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            error!(error = %e, path = %destination.display(), "Download interrupted");
            e
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io(temp.path(), e))?;
        written += chunk.len();
        debug!(bytes = written, "Wrote chunk");
    }
    file.flush().await.map_err(|e| Error::io(temp.path(), e))?;
    file.sync_all().await.map_err(|e| Error::io(temp.path(), e))?;
    drop(file);

    persist(temp, destination)?;
    info!(path = %destination.display(), bytes = written, "Saved download");
    Ok(destination.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    fn entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn save_stream_writes_all_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.xml");
        let body: ResultStream = stream::iter(vec![
            Ok(Bytes::from_static(b"<a>")),
            Ok(Bytes::from_static(b"</a>")),
        ])
        .boxed();

        let path = save_stream(body, &dest).await.unwrap();

        assert_eq!(path, dest);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "<a></a>");
        assert_eq!(entries(dir.path()), vec!["out.xml"]);
    }

    #[tokio::test]
    async fn failed_stream_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.xml");
        let body: ResultStream = stream::iter(vec![
            Ok(Bytes::from_static(b"<a>")),
            Err(Error::Network("connection reset".into())),
        ])
        .boxed();

        let err = save_stream(body, &dest).await.unwrap_err();

        assert!(matches!(err, Error::Network(_)));
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("merged.xml");
        std::fs::write(&dest, "old").unwrap();

        write_atomic(&dest, "<new/>").unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "<new/>");
        assert_eq!(entries(dir.path()), vec!["merged.xml"]);
    }
}
