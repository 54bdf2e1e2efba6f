//! Local upload storage for listing attachments
//!
//! Files are first written to a staging directory inside the upload root and
//! only moved to their final name once the owning database row is in place.
//! Staged files that never get promoted are removed again, so a failed listing
//! creation leaves nothing behind.

use chrono::Utc;
use regex::Regex;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{info, warn};
use uuid::Uuid;

/// Ceiling for a whole request body, attachments included
pub const MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// Extensions accepted for listing attachments
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "mp4", "mov"];

const STAGING_DIR: &str = ".staging";

/// Longest file name most filesystems accept (NAME_MAX)
const MAX_STORED_NAME_LEN: usize = 255;

/// Lower-cased extension of `filename`, if it has one
fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Check a filename against the attachment allow-list
pub fn is_allowed(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Content type served for a stored file
pub fn content_type(filename: &str) -> &'static str {
    match extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Reduce a client-supplied filename to a safe single path component
///
/// Only the last path component is kept, whitespace becomes `_`, anything
/// outside `[A-Za-z0-9._-]` is dropped and leading/trailing dots and
/// underscores are trimmed. The result may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    static UNSAFE_CHARS: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE_CHARS
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("Failed to compile filename regex"));

    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let spaced = base.split_whitespace().collect::<Vec<_>>().join("_");

    unsafe_chars
        .replace_all(&spaced, "")
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

/// Attachment written to staging but not yet visible under its final name
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub stored_name: String,
    staged_path: PathBuf,
}

/// Upload directory handle
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open the upload directory, creating it (and its staging area) if absent
    ///
    /// Anything left in staging by an earlier process is removed.
    pub async fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let staging = root.join(STAGING_DIR);

        match tokio::fs::remove_dir_all(&staging).await {
            Ok(()) => info!("Cleared upload staging area at {}", staging.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tokio::fs::create_dir_all(&staging).await?;
        info!("Upload directory ready at {}", root.display());
        Ok(Self { root })
    }

    /// Collision-resistant stored name for an upload, or `None` if rejected
    ///
    /// The name combines the owner id, the upload time, a random tag and the
    /// sanitized original filename. Long originals lose the end of their stem
    /// so the whole name stays within 255 bytes.
    pub fn stored_name(owner_id: i64, original: &str) -> Option<String> {
        let sanitized = sanitize_filename(original);
        if !is_allowed(original) || !is_allowed(&sanitized) {
            return None;
        }

        let tag = Uuid::new_v4().simple().to_string();
        let prefix = format!(
            "{}_{}_{}_",
            owner_id,
            Utc::now().format("%Y%m%d_%H%M%S"),
            &tag[..8]
        );

        let budget = MAX_STORED_NAME_LEN.saturating_sub(prefix.len());
        if sanitized.len() <= budget {
            return Some(prefix + &sanitized);
        }

        // Sanitized names are ASCII, so any byte offset is a char boundary
        let (stem, ext) = sanitized.rsplit_once('.')?;
        let keep = budget.checked_sub(ext.len() + 1).filter(|keep| *keep > 0)?;
        Some(format!("{}{}.{}", prefix, &stem[..keep.min(stem.len())], ext))
    }

    /// Write an attachment to staging
    ///
    /// Returns `Ok(None)` when the filename fails validation; such files are
    /// skipped rather than treated as errors.
    pub async fn stage(
        &self,
        owner_id: i64,
        original: &str,
        bytes: &[u8],
    ) -> io::Result<Option<StagedFile>> {
        let Some(stored_name) = Self::stored_name(owner_id, original) else {
            warn!("Skipping upload with disallowed filename {:?}", original);
            return Ok(None);
        };

        let staged_path = self.root.join(STAGING_DIR).join(&stored_name);
        tokio::fs::write(&staged_path, bytes).await?;

        Ok(Some(StagedFile {
            stored_name,
            staged_path,
        }))
    }

    /// Move staged files to their final names
    pub async fn promote(&self, staged: &[StagedFile]) -> io::Result<()> {
        for file in staged {
            tokio::fs::rename(&file.staged_path, self.root.join(&file.stored_name)).await?;
        }
        Ok(())
    }

    /// Remove staged files, promoted or not
    pub async fn discard(&self, staged: &[StagedFile]) {
        for file in staged {
            for path in [file.staged_path.clone(), self.root.join(&file.stored_name)] {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
                }
            }
        }
    }

    /// Path of a stored file, if `filename` is a name this store could have produced
    ///
    /// Anything that is not already in sanitized form (separators, `..`,
    /// hidden names) is refused without touching the filesystem.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || filename.starts_with('.') {
            return None;
        }
        if sanitize_filename(filename) != filename || !is_allowed(filename) {
            return None;
        }
        Some(self.root.join(filename))
    }

    /// Read a stored file, `Ok(None)` when absent or not servable
    pub async fn retrieve(&self, filename: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(path) = self.resolve(filename) else {
            warn!("Refusing to serve upload {:?}", filename);
            return Ok(None);
        };

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
