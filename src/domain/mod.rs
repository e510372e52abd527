//! Strongly-typed domain structures for stored photos.
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Absolute path to the upload root (e.g. `/srv/upload/photos`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UploadRoot(PathBuf);

impl UploadRoot {
    /// Resolve a possibly relative directory against the current working directory.
    pub fn resolve(path: impl AsRef<Path>) -> std::io::Result<Self> {
        std::path::absolute(path).map(Self)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Resolve a file name directly inside the root.
    pub fn resolve_file(&self, name: &FileName) -> PathBuf {
        self.0.join(name.as_str())
    }
}

impl From<PathBuf> for UploadRoot {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

/// Extension of a client supplied file name, leading dot included.
///
/// Only the last path segment is considered, with both `/` and `\` treated as
/// separators. A name without a dot, a dot-file such as `.bashrc`, `.` and
/// `..` have no extension.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extension(String);

impl Extension {
    pub fn from_original_name(original: &str) -> Self {
        let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
        if base == "." || base == ".." {
            return Self::default();
        }

        match base.rfind('.') {
            Some(0) | None => Self::default(),
            Some(idx) => Self(base[idx..].to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sanitized file name (single path component).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn try_new(value: String) -> Result<Self, TypeConstraintError> {
        let path = Path::new(&value);
        let mut components = path.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(component)), None)
                if component.len() == value.len() =>
            {
                Ok(Self(value))
            }
            _ => Err(TypeConstraintError::InvalidFileName),
        }
    }

    /// Storage name for an upload: `{field}-{stamp}{extension}`.
    pub fn generated(
        field: &str,
        stamp: i64,
        extension: &Extension,
    ) -> Result<Self, TypeConstraintError> {
        Self::try_new(format!("{field}-{stamp}{}", extension.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A photo that has been written to the upload root.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SavedPhoto {
    name: FileName,
    path: PathBuf,
    size: usize,
}

impl SavedPhoto {
    pub fn new(name: FileName, path: PathBuf, size: usize) -> Self {
        Self { name, path, size }
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}


#[derive(Debug, Error)]
pub enum TypeConstraintError {
    #[error("invalid file name")]
    InvalidFileName,
}
