use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Stream(#[from] git_fast_export::Error),

    #[error("blob spool directory creation failed: {0}")]
    SpoolDir(std::io::Error),

    #[error("blob subdir creation of {path} failed: {err}")]
    SpoolSubdir { path: String, err: std::io::Error },

    #[error("snapshot sequence number too large, widen Serial")]
    SerialOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
