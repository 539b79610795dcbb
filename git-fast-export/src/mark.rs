use std::fmt::Display;

use derive_more::{From, Into};

/// A 1-based label used to forward-reference blobs and commits within
/// the stream. Mark 0 is reserved and never written by a well-formed
/// exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct Mark(u32);

impl Display for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}", self.0)
    }
}
