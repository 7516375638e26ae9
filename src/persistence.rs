//! Artifact persistence
//!
//! Writes the final figure under the output root. The file extension and mime
//! type come from magic-byte sniffing; names are
//! `<stem>-<YYYYmmdd-HHMMSS>-<8 hex of blake3(bytes)>.<ext>`.

use crate::error::PersistenceError;
use crate::media::{sniff_format, RasterFormat};
use crate::qa::QaReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

pub const MAX_STEM_CHARS: usize = 64;
const FALLBACK_STEM: &str = "figure";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Naming input for one saved artifact.
#[derive(Debug, Clone)]
pub struct FilenameHint {
    /// Caller-supplied name; directories and extension are ignored.
    pub filename: Option<String>,
    /// Slug source when no filename is given.
    pub prompt: String,
    /// Relative sub-directory under the output root.
    pub sub_dir: Option<String>,
    /// Mime type reported by the backend, used when sniffing fails.
    pub backend_mime: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FilenameHint {
    pub fn for_prompt(prompt: impl Into<String>) -> Self {
        Self {
            filename: None,
            prompt: prompt.into(),
            sub_dir: None,
            backend_mime: None,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub mime_type: String,
    pub bytes: usize,
}

pub trait ArtifactStore: Send + Sync {
    fn save(&self, bytes: &[u8], hint: &FilenameHint) -> Result<SavedArtifact, PersistenceError>;

    /// Write the QA report next to a saved artifact. `None` when sidecars are off.
    fn save_report(
        &self,
        _artifact: &SavedArtifact,
        _report: &QaReport,
    ) -> Result<Option<PathBuf>, PersistenceError> {
        Ok(None)
    }
}

/// Filesystem store rooted at the configured output directory.
pub struct FsArtifactStore {
    root: PathBuf,
    write_qa_sidecar: bool,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_qa_sidecar: false,
        }
    }

    pub fn with_qa_sidecar(mut self, enabled: bool) -> Self {
        self.write_qa_sidecar = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, bytes: &[u8], hint: &FilenameHint) -> Result<SavedArtifact, PersistenceError> {
        let dir = match &hint.sub_dir {
            Some(sub_dir) => self.root.join(sanitize_relative_dir(sub_dir)?),
            None => self.root.clone(),
        };
        fs::create_dir_all(&dir)?;
        let dir = dunce::canonicalize(&dir)?;

        let (extension, mime_type) = resolve_format(bytes, hint.backend_mime.as_deref());
        let stem = hint
            .filename
            .as_deref()
            .map(filename_stem)
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| slugify(&hint.prompt));
        let digest = blake3::hash(bytes);
        let name = format!(
            "{}-{}-{}.{}",
            stem,
            hint.timestamp.format("%Y%m%d-%H%M%S"),
            hex::encode(&digest.as_bytes()[..4]),
            extension
        );

        let path = dir.join(name);
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), mime_type = %mime_type, "Saved figure");
        Ok(SavedArtifact {
            path,
            mime_type,
            bytes: bytes.len(),
        })
    }

    fn save_report(
        &self,
        artifact: &SavedArtifact,
        report: &QaReport,
    ) -> Result<Option<PathBuf>, PersistenceError> {
        if !self.write_qa_sidecar {
            return Ok(None);
        }
        let mut sidecar = artifact.path.clone().into_os_string();
        sidecar.push(".qa.json");
        let sidecar = PathBuf::from(sidecar);
        fs::write(&sidecar, serde_json::to_vec_pretty(report)?)?;
        Ok(Some(sidecar))
    }
}

fn resolve_format(bytes: &[u8], backend_mime: Option<&str>) -> (&'static str, String) {
    if let Some(format) = sniff_format(bytes) {
        return (format.extension(), format.mime_type().to_string());
    }
    if let Some(format) = backend_mime.and_then(RasterFormat::from_mime) {
        return (format.extension(), format.mime_type().to_string());
    }
    warn!(
        backend_mime = backend_mime.unwrap_or("none"),
        "Unrecognized image format; saving as .bin"
    );
    (
        "bin",
        backend_mime
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(FALLBACK_MIME)
            .to_string(),
    )
}

/// Validate a caller-supplied output sub-directory. Only plain relative
/// components are accepted.
pub fn sanitize_relative_dir(value: &str) -> Result<PathBuf, PersistenceError> {
    let mut clean = PathBuf::new();
    for component in Path::new(value.trim()).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(PersistenceError::InvalidPath(format!(
                    "'{}' must not contain '..'",
                    value
                )))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PersistenceError::InvalidPath(format!(
                    "'{}' must be a relative path",
                    value
                )))
            }
        }
    }
    Ok(clean)
}

/// File-name-safe slug: NFKD-folded ASCII alphanumerics, `-` and `_`.
pub fn slugify(value: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for ch in value.nfkd() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch.is_whitespace() || ch.is_ascii_punctuation() {
            pending_dash = true;
        }
        // Combining marks and other non-ASCII characters are dropped.
        if slug.len() >= MAX_STEM_CHARS {
            break;
        }
    }
    slug.truncate(MAX_STEM_CHARS);
    let slug = slug.trim_matches(|c| c == '-' || c == '_').to_string();
    if slug.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        slug
    }
}

fn filename_stem(filename: &str) -> String {
    let stem = Path::new(filename.trim())
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    if stem.is_empty() {
        return stem;
    }
    slugify(&stem)
}
