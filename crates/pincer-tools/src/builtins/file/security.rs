use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// File names that are never read or written, wherever they live
const SENSITIVE_FILE_NAMES: &[&str] = &[
    ".env",
    ".env.local",
    ".env.production",
    "credentials",
    "credentials.json",
    "secrets",
    "id_rsa",
    "id_ed25519",
    ".netrc",
    ".npmrc",
    ".pypirc",
    ".htpasswd",
    "shadow",
    "passwd",
];

/// Default read cap (50 KB)
pub const DEFAULT_MAX_READ_BYTES: usize = 50_000;

/// Directory sandbox for the file manager
#[derive(Debug, Clone)]
pub struct FileSandbox {
    allowed_dirs: Vec<PathBuf>,
    max_read_bytes: usize,
}

impl FileSandbox {
    /// Create a sandbox confined to `allowed_dirs`.
    ///
    /// Directories that do not exist yet are kept as given; they are compared
    /// lexically until they exist.
    #[must_use]
    pub fn new(allowed_dirs: Vec<PathBuf>) -> Self {
        let allowed_dirs = allowed_dirs
            .into_iter()
            .map(|d| d.canonicalize().unwrap_or(d))
            .collect();
        Self {
            allowed_dirs,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Set the read cap
    #[must_use]
    pub fn with_max_read_bytes(mut self, max: usize) -> Self {
        self.max_read_bytes = max;
        self
    }

    /// The configured directories
    #[must_use]
    pub fn allowed_dirs(&self) -> &[PathBuf] {
        &self.allowed_dirs
    }

    /// The read cap in bytes
    #[must_use]
    pub fn max_read_bytes(&self) -> usize {
        self.max_read_bytes
    }

    /// Resolve `path` and make sure it lies inside an allowed directory.
    ///
    /// Relative paths are taken relative to the first allowed directory.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let raw = PathBuf::from(path.trim());
        if raw.as_os_str().is_empty() {
            return Err(Error::InvalidInput("missing 'path' parameter".to_string()));
        }

        if raw.components().any(|c| matches!(c, Component::ParentDir)) {
            warn!(path = %path, "Path traversal attempt detected");
            return Err(Error::PermissionDenied(
                "path traversal (..) is not allowed".to_string(),
            ));
        }

        let joined = if raw.is_absolute() {
            raw
        } else {
            let base = self
                .allowed_dirs
                .first()
                .ok_or_else(|| Error::PermissionDenied("no directories are allowed".to_string()))?;
            base.join(raw)
        };

        let resolved = canonicalize_lenient(&joined)?;

        if !self.allowed_dirs.iter().any(|dir| resolved.starts_with(dir)) {
            warn!(path = %path, resolved = %resolved.display(), "Path outside allowed directories");
            return Err(Error::PermissionDenied(
                "path is outside the allowed directories".to_string(),
            ));
        }

        if is_sensitive_file(&resolved) {
            warn!(path = %path, "Access to sensitive file refused");
            return Err(Error::PermissionDenied(
                "access to this file is restricted".to_string(),
            ));
        }

        debug!(original = %path, resolved = %resolved.display(), "Path validated");
        Ok(resolved)
    }
}

/// Canonicalize an existing path, or the parent of a path that does not exist
/// yet, so symlinks cannot point outside the sandbox.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.canonicalize()?);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(parent.canonicalize()?.join(name)),
        _ => Ok(path.to_path_buf()),
    }
}

/// Check if a file name is on the sensitive list
#[must_use]
pub fn is_sensitive_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| {
            let lower = name.to_lowercase();
            SENSITIVE_FILE_NAMES.contains(&lower.as_str())
        })
        .unwrap_or(false)
}
