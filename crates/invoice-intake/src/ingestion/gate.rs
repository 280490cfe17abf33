//! Upload gate: type and size checks ahead of any processing

use std::path::PathBuf;

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::types::upload::extension_of;
use crate::types::UploadedFile;

use super::staging::{StagedUpload, StagingWriter};

/// Validates incoming files and stages the accepted ones
#[derive(Debug, Clone)]
pub struct UploadGate {
    max_bytes: u64,
    allowed_extensions: Vec<String>,
    allowed_mime_types: Vec<String>,
    staging_dir: PathBuf,
}

impl UploadGate {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_file_size,
            allowed_extensions: config
                .allowed_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            allowed_mime_types: config
                .allowed_mime_types
                .iter()
                .map(|m| m.trim().to_lowercase())
                .collect(),
            staging_dir: config.staging_dir.clone(),
        }
    }

    /// Size cap in bytes
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Accept when either the extension or the declared MIME type is allowed
    pub fn check_type(&self, filename: &str, mime_type: Option<&str>) -> Result<()> {
        let ext_ok = extension_of(filename)
            .map(|ext| self.allowed_extensions.contains(&ext))
            .unwrap_or(false);

        let mime_ok = mime_type
            .map(|m| {
                let essence = m.split(';').next().unwrap_or("").trim().to_lowercase();
                self.allowed_mime_types.contains(&essence)
            })
            .unwrap_or(false);

        if ext_ok || mime_ok {
            Ok(())
        } else {
            tracing::info!(filename, mime_type, "Rejected upload with unsupported type");
            Err(Error::UnsupportedFileType {
                filename: filename.to_string(),
                mime_type: mime_type.map(str::to_string),
            })
        }
    }

    /// Reject anything strictly larger than the cap
    pub fn check_size(&self, size_bytes: u64) -> Result<()> {
        if size_bytes > self.max_bytes {
            Err(Error::FileTooLarge {
                max_bytes: self.max_bytes,
            })
        } else {
            Ok(())
        }
    }

    /// Run both checks against a fully described upload
    pub fn validate(&self, upload: &UploadedFile) -> Result<()> {
        self.check_type(&upload.filename, upload.mime_type.as_deref())?;
        self.check_size(upload.size_bytes)
    }

    /// Type-check an upload from its headers and open a staging file for its bytes
    pub async fn open(&self, filename: &str, mime_type: Option<String>) -> Result<StagingWriter> {
        self.check_type(filename, mime_type.as_deref())?;

        let dir = self.staging_dir.clone();
        let suffix = extension_of(filename).unwrap_or_default();
        let (file, sink) = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
            std::fs::create_dir_all(&dir)?;
            let file = tempfile::Builder::new()
                .prefix("invoice-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            let sink = file.as_file().try_clone()?;
            Ok((file, sink))
        })
        .await
        .map_err(|e| Error::internal(format!("staging task failed: {}", e)))??;
        let sink = tokio::fs::File::from_std(sink);

        tracing::debug!(
            filename,
            path = %file.path().display(),
            "Staging upload"
        );

        let staged = StagedUpload::new(file, UploadedFile::new(filename, mime_type, 0));
        Ok(StagingWriter::new(staged, sink, self.max_bytes))
    }

    /// Stage an in-memory upload in one go
    pub async fn stage_bytes(
        &self,
        filename: &str,
        mime_type: Option<String>,
        data: &[u8],
    ) -> Result<StagedUpload> {
        self.check_type(filename, mime_type.as_deref())?;
        self.check_size(data.len() as u64)?;
        let mut writer = self.open(filename, mime_type).await?;
        writer.write_chunk(data).await?;
        writer.finish().await
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn gate_in(dir: &std::path::Path) -> UploadGate {
        let config = UploadConfig {
            staging_dir: dir.to_path_buf(),
            ..UploadConfig::default()
        };
        UploadGate::new(&config)
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn extension_or_mime_is_enough() {
        let gate = UploadGate::new(&UploadConfig::default());

        assert!(gate.check_type("Invoice.PDF", None).is_ok());
        assert!(gate.check_type("usage.xls", Some("application/octet-stream")).is_ok());
        assert!(gate.check_type("download", Some("text/csv")).is_ok());
        assert!(gate
            .check_type("export.bin", Some("application/vnd.ms-excel"))
            .is_ok());
    }

    #[test]
    fn unsupported_extension_and_mime_rejected() {
        let gate = UploadGate::new(&UploadConfig::default());
        let err = gate
            .check_type("notes.docx", Some("application/msword"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported file type. Please upload PDF, CSV, XLSX, or XLS."
        );
        assert!(gate.check_type("README", None).is_err());
    }

    #[test]
    fn size_cap_is_inclusive() {
        let gate = UploadGate::new(&UploadConfig::default());
        assert!(gate.check_size(20 * MIB).is_ok());
        assert!(gate.check_size(0).is_ok());

        let err = gate.check_size(20 * MIB + 1).unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 20MB.");
    }

    #[test]
    fn validate_checks_type_before_size() {
        let gate = UploadGate::new(&UploadConfig::default());
        let upload = UploadedFile::new("huge.exe", None, 30 * MIB);
        assert!(matches!(
            gate.validate(&upload),
            Err(Error::UnsupportedFileType { .. })
        ));

        let upload = UploadedFile::new("huge.csv", Some("text/csv".into()), 30 * MIB);
        assert!(matches!(gate.validate(&upload), Err(Error::FileTooLarge { .. })));
    }

    #[test]
    fn config_extensions_without_dot_are_normalized() {
        let config = UploadConfig {
            allowed_extensions: vec!["PDF".into()],
            allowed_mime_types: vec![],
            ..UploadConfig::default()
        };
        let gate = UploadGate::new(&config);
        assert!(gate.check_type("a.pdf", None).is_ok());
        assert!(gate.check_type("a.csv", Some("text/csv")).is_err());
    }

    #[tokio::test]
    async fn rejected_type_stages_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("staging");
        let gate = gate_in(&staging);

        let result = gate.open("malware.exe", None).await;
        assert!(result.is_err());
        assert_eq!(entries(&staging), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn open_creates_missing_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("nested").join("staging");
        let gate = gate_in(&staging);

        let mut writer = gate.open("usage.XLSX", None).await.unwrap();
        writer.write_chunk(b"PK").await.unwrap();
        let staged = writer.finish().await.unwrap();

        let path = staged.path().unwrap().to_path_buf();
        assert!(path.starts_with(&staging));
        assert!(path.extension().is_some_and(|e| e == "xlsx"));
        assert_eq!(staged.upload().size_bytes, 2);
        assert_eq!(entries(&staging), 1);

        drop(staged);
        assert_eq!(entries(&staging), 0);
    }

    #[tokio::test]
    async fn oversized_stream_aborts_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig {
            max_file_size: 10,
            staging_dir: dir.path().to_path_buf(),
            ..UploadConfig::default()
        };
        let gate = UploadGate::new(&config);

        let mut writer = gate.open("bill.csv", None).await.unwrap();
        writer.write_chunk(b"0123456789").await.unwrap();
        assert_eq!(entries(dir.path()), 1);

        let err = writer.write_chunk(b"x").await.unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { max_bytes: 10 }));
        drop(writer);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn staged_bytes_land_on_disk_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let gate = gate_in(dir.path());

        let staged = gate
            .stage_bytes("report.csv", Some("text/csv".into()), b"a,b\n1,2\n")
            .await
            .unwrap();
        assert_eq!(staged.upload().size_bytes, 8);

        let path = staged.path().unwrap().to_path_buf();
        assert!(path.extension().is_some_and(|e| e == "csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");

        drop(staged);
        assert_eq!(entries(dir.path()), 0);
    }
}
