//! Dotted CVS revision numbers (`1.2`, `1.2.2.1`, …) and the branch
//! topology that can be stitched together from a set of them.
//!
//! A number with an even count of components names a revision; an odd
//! count names a branch. CVS also writes "magic" branch numbers with a
//! zero in the next-to-last position (`1.2.0.3` for branch `1.2.3`);
//! [`CvsNumber::normalize`] collapses that form so both spellings intern
//! to the same node.

use std::{cmp::Ordering, convert::TryFrom, fmt::Display, str::FromStr};

use itertools::Itertools;

mod error;
pub use error::Error;

mod node;
pub use node::{DeltaId, Node, NodeId, NodeStore};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CvsNumber(Vec<u64>);

impl CvsNumber {
    pub fn new(components: Vec<u64>) -> Result<Self, Error> {
        if components.is_empty() {
            return Err(Error::Empty);
        }

        Ok(Self(components))
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Branch numbers have an odd component count.
    pub fn is_branch(&self) -> bool {
        self.0.len() % 2 == 1
    }

    /// Collapses the magic CVS branch form: a zero in the next-to-last
    /// position is removed, so `1.2.0.3` becomes `1.2.3`.
    pub fn normalize(&self) -> Self {
        let c = self.0.len();
        if c > 2 && self.0[c - 2] == 0 {
            let mut components = self.0.clone();
            components.remove(c - 2);
            Self(components)
        } else {
            self.clone()
        }
    }

    /// The number shortened by `depth` trailing components, or `None` if
    /// nothing would remain.
    pub fn prefix(&self, depth: usize) -> Option<Self> {
        if depth == 0 || depth >= self.0.len() {
            return None;
        }

        Some(Self(self.0[..self.0.len() - depth].to_vec()))
    }
}

/// Numbers order by depth first, then lexicographically by component.
/// This is the order branch stitching relies on: all trunk revisions sort
/// before any branch number, which sorts before its own revisions.
impl Ord for CvsNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CvsNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for CvsNumber {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(
            s.split('.')
                .map(|part| part.parse::<u64>())
                .collect::<Result<Vec<u64>, _>>()?,
        )
    }
}

impl TryFrom<&[u8]> for CvsNumber {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_str(std::str::from_utf8(value)?)
    }
}

impl Display for CvsNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().map(|part| part.to_string()).join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        assert_eq!(num("1.1").components(), &[1, 1]);
        assert_eq!(num("1.2.2.1").components(), &[1, 2, 2, 1]);
        assert_eq!(num("1.2.0.3").components(), &[1, 2, 0, 3]);
        assert_eq!(num("1.2.2.1").to_string(), "1.2.2.1");

        assert!(CvsNumber::from_str("").is_err());
        assert!(CvsNumber::from_str("1.x").is_err());
        assert!(CvsNumber::new(Vec::new()).is_err());
    }

    #[test]
    fn test_parity() {
        assert!(!num("1.2").is_branch());
        assert!(num("1.2.3").is_branch());
        assert!(!num("1.2.3.4").is_branch());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(num("1.2.0.3").normalize(), num("1.2.3"));
        assert_eq!(num("1.2.3").normalize(), num("1.2.3"));
        // Only the next-to-last position is magic.
        assert_eq!(num("1.0.2.3").normalize(), num("1.0.2.3"));
        // A two-component number is never collapsed.
        assert_eq!(num("0.1").normalize(), num("0.1"));
    }

    #[test]
    fn test_order() {
        // Depth dominates.
        assert!(num("9.9") < num("1.1.1"));
        assert!(num("1.2.2") < num("1.1.1.1"));
        // Lexicographic within a depth.
        assert!(num("1.1") < num("1.2"));
        assert!(num("1.2.2.1") < num("1.2.2.2"));
    }

    #[test]
    fn test_prefix() {
        assert_eq!(num("1.2.2.1").prefix(1), Some(num("1.2.2")));
        assert_eq!(num("1.2.2.1").prefix(2), Some(num("1.2")));
        assert_eq!(num("1.2").prefix(2), None);
        assert_eq!(num("1.2").prefix(0), None);
    }

    fn num(s: &str) -> CvsNumber {
        CvsNumber::from_str(s).unwrap()
    }
}
