//! Scoped temporary storage for accepted uploads

use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::types::UploadedFile;

/// An accepted upload persisted to a uniquely named temporary file.
///
/// The file is removed when the guard is dropped, whichever way the request
/// ends. Removal failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct StagedUpload {
    file: Option<NamedTempFile>,
    upload: UploadedFile,
}

impl StagedUpload {
    pub(crate) fn new(file: NamedTempFile, upload: UploadedFile) -> Self {
        Self {
            file: Some(file),
            upload,
        }
    }

    /// Path of the staged bytes
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Descriptor of the staged upload
    pub fn upload(&self) -> &UploadedFile {
        &self.upload
    }

    /// Remove the staged file now instead of at drop
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed staged upload"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove staged upload"
            ),
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Streams an upload into staging, enforcing the size cap chunk by chunk.
///
/// Dropping the writer before [`StagingWriter::finish`] discards the partial file.
pub struct StagingWriter {
    staged: StagedUpload,
    sink: tokio::fs::File,
    written: u64,
    max_bytes: u64,
}

impl StagingWriter {
    pub(crate) fn new(staged: StagedUpload, sink: tokio::fs::File, max_bytes: u64) -> Self {
        Self {
            staged,
            sink,
            written: 0,
            max_bytes,
        }
    }

    /// Append a chunk, failing as soon as the total crosses the cap
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.written += chunk.len() as u64;
        if self.written > self.max_bytes {
            tracing::warn!(
                filename = %self.staged.upload.filename,
                received = self.written,
                max_bytes = self.max_bytes,
                "Upload exceeds size limit, aborting"
            );
            return Err(Error::FileTooLarge {
                max_bytes: self.max_bytes,
            });
        }
        self.sink.write_all(chunk).await?;
        Ok(())
    }

    /// Flush the staged bytes and hand over the cleanup guard
    pub async fn finish(mut self) -> Result<StagedUpload> {
        self.sink.flush().await?;
        self.staged.upload.size_bytes = self.written;
        tracing::debug!(
            filename = %self.staged.upload.filename,
            size_bytes = self.written,
            "Upload staged"
        );
        Ok(self.staged)
    }
}
