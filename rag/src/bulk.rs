//! Bulk ingestion of a directory of writing samples.
//!
//! Text files are read as-is; images are transcribed by the generation
//! backend first. Every sample then goes through
//! [`LetterPipeline::ingest_sample`].

use std::path::{Path, PathBuf};

use inkwell_providers::{Attachment, GenerationRequest, SOURCE_KEY, metadata};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;
use crate::outcome::IngestOutcome;
use crate::pipeline::LetterPipeline;

const TRANSCRIBE_INSTRUCTION: &str = "You are an expert transcriber. Transcribe the text in this image exactly as written. Do not add commentary.";
const TRANSCRIBE_REQUEST: &str = "Transcribe this letter.";

/// Metadata value of `ingest_method` for bulk-ingested samples.
pub const BULK_INGEST_METHOD: &str = "bulk_script";

/// Kind of sample file recognised by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleFile {
    Text,
    Image { mime_type: &'static str },
}

impl SampleFile {
    fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::Text),
            "jpg" | "jpeg" => Some(Self::Image {
                mime_type: "image/jpeg",
            }),
            "png" => Some(Self::Image {
                mime_type: "image/png",
            }),
            _ => None,
        }
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Stored under `id`.
    Ingested { id: String },
    /// Content too short to be a useful sample.
    SkippedTooShort,
    /// Reading, transcription, embedding or storage failed.
    Failed { reason: String },
}

/// Per-file report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    /// Path of the file.
    pub path: PathBuf,

    /// Outcome.
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Report for a whole directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkReport {
    /// One entry per recognised file, sorted by path.
    pub files: Vec<FileReport>,
}

impl BulkReport {
    /// Number of files that ended up in the store.
    pub fn ingested(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Ingested { .. }))
            .count()
    }

    /// Number of recognised files.
    pub fn total(&self) -> usize {
        self.files.len()
    }
}

/// Ingests every sample file in a directory.
pub struct BulkIngestor<'a> {
    pipeline: &'a LetterPipeline,
}

impl<'a> BulkIngestor<'a> {
    /// Create a new bulk ingestor.
    pub fn new(pipeline: &'a LetterPipeline) -> Self {
        Self { pipeline }
    }

    /// List `.txt`, `.jpg`, `.jpeg` and `.png` files directly inside `dir`.
    pub fn scan(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file() && SampleFile::from_path(entry.path()).is_some() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Ingest every sample file in `dir`.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<BulkReport> {
        fs::metadata(dir).await?;
        let files = Self::scan(dir)?;
        info!("Found {} samples in {}", files.len(), dir.display());

        let mut report = BulkReport::default();
        for path in files {
            let status = self.ingest_file(&path).await;
            if let FileStatus::Failed { reason } = &status {
                warn!("Failed to ingest {}: {reason}", path.display());
            }
            report.files.push(FileReport { path, status });
        }

        info!(
            "Ingestion complete: {}/{} samples added",
            report.ingested(),
            report.total()
        );
        Ok(report)
    }

    /// Ingest a single file.
    pub async fn ingest_file(&self, path: &Path) -> FileStatus {
        let content = match self.read_content(path).await {
            Ok(content) => content,
            Err(reason) => return FileStatus::Failed { reason },
        };

        if content.trim().chars().count() < self.pipeline.config().min_sample_chars {
            return FileStatus::SkippedTooShort;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let meta = metadata([
            (SOURCE_KEY, file_name),
            ("ingest_method", BULK_INGEST_METHOD.to_string()),
            ("original_path", path.display().to_string()),
        ]);

        match self.pipeline.ingest_sample(&content, Some(meta)).await {
            IngestOutcome::Stored { id } => FileStatus::Ingested { id },
            IngestOutcome::Unindexed { reason, .. } => FileStatus::Failed { reason },
            IngestOutcome::Rejected { .. } => FileStatus::SkippedTooShort,
        }
    }

    async fn read_content(&self, path: &Path) -> std::result::Result<String, String> {
        let kind = SampleFile::from_path(path)
            .ok_or_else(|| format!("unsupported file type: {}", path.display()))?;

        match kind {
            SampleFile::Text => fs::read_to_string(path)
                .await
                .map_err(|e| format!("read error: {e}")),
            SampleFile::Image { mime_type } => {
                let data = fs::read(path)
                    .await
                    .map_err(|e| format!("image error: {e}"))?;
                let request = GenerationRequest::new(TRANSCRIBE_INSTRUCTION, TRANSCRIBE_REQUEST)
                    .with_attachment(Attachment::new(mime_type, data));

                let timeout = self.pipeline.config().capability_timeout();
                match tokio::time::timeout(timeout, self.pipeline.generation().generate_text(request))
                    .await
                {
                    Ok(Ok(text)) => Ok(text),
                    Ok(Err(err)) => Err(format!("transcription failed: {err}")),
                    Err(_) => Err(format!("transcription timed out after {timeout:?}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_sample_file_kinds() {
        assert_eq!(
            SampleFile::from_path(Path::new("a/Letter.TXT")),
            Some(SampleFile::Text)
        );
        assert_eq!(
            SampleFile::from_path(Path::new("scan.JPeg")),
            Some(SampleFile::Image {
                mime_type: "image/jpeg"
            })
        );
        assert_eq!(SampleFile::from_path(Path::new("notes.pdf")), None);
        assert_eq!(SampleFile::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_scan_is_flat_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("b.txt"), "second").unwrap();
        std::fs::write(root.join("a.png"), [0u8; 4]).unwrap();
        std::fs::write(root.join("ignored.md"), "# no").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested/c.txt"), "deep").unwrap();

        let files = BulkIngestor::scan(root).unwrap();

        assert_eq!(files, vec![root.join("a.png"), root.join("b.txt")]);
    }
}
