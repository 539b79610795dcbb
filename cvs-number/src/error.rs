use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("a revision number needs at least one component")]
    Empty,

    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}
