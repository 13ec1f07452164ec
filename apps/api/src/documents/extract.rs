//! Text extraction for uploaded files.
//!
//! PDF goes through `pdf-extract` on a blocking thread. Word files are
//! converted with `pandoc` from a temp file. Every failure yields an empty
//! string; callers treat empty text as "could not extract".

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use tokio::process::Command;
use tracing::warn;

const PANDOC_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
    Doc,
}

impl FileKind {
    /// Detects the kind from a filename extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Option<FileKind> {
        let (_, ext) = filename.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "doc" => Some(FileKind::Doc),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => ".pdf",
            FileKind::Docx => ".docx",
            FileKind::Doc => ".doc",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Docx | FileKind::Doc => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Extracts plain text, or returns an empty string on any failure.
pub async fn extract_text(bytes: Bytes, kind: FileKind) -> String {
    let result = match kind {
        FileKind::Pdf => extract_pdf(bytes).await,
        FileKind::Docx | FileKind::Doc => extract_word(bytes, kind).await,
    };

    match result {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("Text extraction failed for {kind:?}: {e:#}");
            String::new()
        }
    }
}

async fn extract_pdf(bytes: Bytes) -> Result<String> {
    tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("PDF extraction task failed")?
        .map_err(|e| anyhow!("PDF extraction error: {e:?}"))
}

async fn extract_word(bytes: Bytes, kind: FileKind) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(kind.extension())
        .tempfile()
        .context("Failed to create temp file")?;
    file.write_all(&bytes).context("Failed to write temp file")?;
    file.flush()?;

    let mut cmd = Command::new("pandoc");
    cmd.arg("-f")
        .arg("docx")
        .arg("-t")
        .arg("plain")
        .arg("--wrap=none")
        .arg(file.path());

    let output = tokio::time::timeout(PANDOC_TIMEOUT, cmd.output())
        .await
        .map_err(|_| anyhow!("pandoc timed out after {}s", PANDOC_TIMEOUT.as_secs()))?
        .context("Failed to execute pandoc")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!(
            "pandoc failed (exit {}): {}",
            output.status,
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_filename() {
        assert_eq!(FileKind::from_filename("cv.pdf"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_filename("CV.PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_filename("jd.final.docx"), Some(FileKind::Docx));
        assert_eq!(FileKind::from_filename("old.doc"), Some(FileKind::Doc));
        assert_eq!(FileKind::from_filename("notes.txt"), None);
        assert_eq!(FileKind::from_filename("no_extension"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(FileKind::Pdf.content_type(), "application/pdf");
        assert!(FileKind::Docx.content_type().contains("wordprocessingml"));
    }

    #[tokio::test]
    async fn test_garbage_pdf_yields_empty_text() {
        let text = extract_text(Bytes::from_static(b"definitely not a pdf"), FileKind::Pdf).await;
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_docx_yields_empty_text() {
        let text = extract_text(Bytes::from_static(b"not a zip archive"), FileKind::Docx).await;
        assert!(text.is_empty());
    }
}
