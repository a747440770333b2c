use std::io;

use thiserror::Error;

pub type AuditResult<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("The SHA-256 self-check produced {0}. The digest primitive is unusable on this build")]
    SelfCheck(String),

    #[error(
        "Unable to access the file at the given path. Make sure the right permissions are available"
    )]
    Io(#[from] io::Error),

    #[error("Failed to build the worker thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to serialize the prehash cache")]
    Serialize,

    #[error("Failed to deserialize the prehash cache. Is the file corrupted?")]
    Deserialize,
}
