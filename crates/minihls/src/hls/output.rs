// Output file for assembled segments.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::hls::HlsError;

/// Destination file. Opened once with truncation; every append goes to the
/// current end of file and covers exactly one segment.
pub struct OutputStream {
    path: PathBuf,
    file: File,
    bytes_written: u64,
    segments_written: usize,
}

impl OutputStream {
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, HlsError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        debug!(path = %path.display(), "Opened output file");
        Ok(Self {
            path,
            file,
            bytes_written: 0,
            segments_written: 0,
        })
    }

    /// Append one segment's plaintext at the end of the file.
    pub async fn append(&mut self, data: &[u8]) -> Result<(), HlsError> {
        let offset = self.file.seek(SeekFrom::End(0)).await?;
        self.file.write_all(data).await?;
        let end = self.file.stream_position().await?;

        let expected = offset + data.len() as u64;
        if end != expected {
            return Err(HlsError::Io {
                source: std::sync::Arc::new(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!(
                        "short write to {}: expected end offset {expected}, got {end}",
                        self.path.display()
                    ),
                )),
            });
        }

        self.bytes_written += data.len() as u64;
        self.segments_written += 1;
        Ok(())
    }

    /// Flush buffered data and close the file.
    pub async fn finish(mut self) -> Result<u64, HlsError> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.bytes_written)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn segments_written(&self) -> usize {
        self.segments_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_in_order_and_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ts");
        tokio::fs::write(&path, b"stale content from an earlier run")
            .await
            .unwrap();

        let mut output = OutputStream::create(&path).await.unwrap();
        output.append(b"first-").await.unwrap();
        output.append(b"").await.unwrap();
        output.append(b"second").await.unwrap();
        assert_eq!(output.segments_written(), 3);
        let written = output.finish().await.unwrap();

        assert_eq!(written, 12);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"first-second");
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.ts");
        assert!(matches!(
            OutputStream::create(&path).await,
            Err(HlsError::Io { .. })
        ));
    }
}
