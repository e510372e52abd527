//! Application services orchestrating domain logic and side effects.
pub mod photos;

/// Convenience alias for service results.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by service operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no file uploaded")]
    MissingFile,
    #[error("invalid file name")]
    InvalidFileName,
    #[error("failed to prepare storage")]
    StorageSetup(#[source] std::io::Error),
    #[error("failed to save file")]
    SaveFile(#[source] std::io::Error),
    #[error("no free file name after {0} attempts")]
    NameExhausted(usize),
}
