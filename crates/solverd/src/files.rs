//! File staging and extraction utilities.
//!
//! Uploads live in a per-request temp directory that is removed when the
//! guard drops - on success, error, or panic alike. Nothing here persists
//! past the request.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Marker appended when embedded file content is cut short.
pub const TRUNCATION_MARKER: &str = "\n...[content truncated]...";

/// Coarse file classification used by the pre-processing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Archive,
    Csv,
    Json,
    Text,
    Binary,
}

/// An uploaded file staged on disk under its original name.
///
/// Dropping the guard deletes the backing directory unconditionally.
pub struct StagedUpload {
    _dir: TempDir,
    path: PathBuf,
    name: String,
}

impl StagedUpload {
    /// Write uploaded bytes into a fresh temp directory, keeping the
    /// original file name (path components stripped) so commands that
    /// care about extensions see the right one.
    pub fn new(file_name: &str, bytes: &[u8]) -> Result<Self> {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        let dir = tempfile::tempdir().context("failed to create upload directory")?;
        let path = dir.path().join(&name);
        fs::write(&path, bytes)
            .with_context(|| format!("failed to stage upload {}", name))?;

        Ok(Self { _dir: dir, path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Classify a file by extension first, then by content sniffing.
pub fn detect_kind(path: &Path) -> FileKind {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "zip" | "gz" | "tar" => return FileKind::Archive,
        "csv" => return FileKind::Csv,
        "json" => return FileKind::Json,
        "txt" | "md" => return FileKind::Text,
        _ => {}
    }

    // Ambiguous extension: sniff the content
    if let Ok(bytes) = fs::read(path) {
        if bytes.starts_with(b"PK\x03\x04") {
            return FileKind::Archive;
        }
        let sample = &bytes[..bytes.len().min(1024)];
        let text = String::from_utf8_lossy(sample);
        if text.contains(',') && text.contains('\n') {
            return FileKind::Csv;
        }
    }

    FileKind::Binary
}

/// Extract a ZIP archive into a fresh temp directory.
pub fn extract_zip(zip_path: &Path) -> Result<TempDir> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("failed to open {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file).context("not a readable ZIP archive")?;

    let dir = tempfile::tempdir()?;
    archive
        .extract(dir.path())
        .context("failed to extract ZIP archive")?;
    Ok(dir)
}

/// First file under `dir` whose name ends with `extension`, in directory
/// walk order. Walk order is the documented tie-break - results are not
/// sorted.
pub fn find_file_by_extension(dir: &Path, extension: &str) -> Option<PathBuf> {
    let extension = extension.to_lowercase();
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.to_lowercase().ends_with(&extension))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
}

/// Read a file as text, trying encodings in fixed priority order:
/// strict UTF-8 first, then Windows-1252 (which also covers Latin-1 and
/// never fails to decode).
pub fn read_text(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(err.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

/// Read text content capped at `max_len` characters with an explicit
/// truncation marker appended.
pub fn read_text_truncated(path: &Path, max_len: usize) -> Result<String> {
    let text = read_text(path)?;
    Ok(truncate_marked(&text, max_len))
}

/// Cut `text` at a char boundary no later than `max_len` bytes and mark
/// the cut.
pub fn truncate_marked(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{}", &text[..end], TRUNCATION_MARKER)
}
