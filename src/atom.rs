//! File-name interning.
//!
//! Every path seen during parsing is interned once; the cheap `Copy`
//! handle makes name equality a single integer comparison, which the
//! parent diff leans on heavily. Each atom also gets a Bloom signature
//! computed at intern time, and a commit carries the union of its
//! files' signatures so membership probes can fail fast.

use std::collections::HashMap;

const BLOOM_WORDS: usize = 4;
const BLOOM_BITS: u64 = (BLOOM_WORDS * 64) as u64;
const BLOOM_HASHES: u64 = 3;

/// An interned file name; two atoms are equal exactly when the strings
/// they were interned from are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Atom(u32);

/// A fixed-size bit vector summarizing a set of atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bloom([u64; BLOOM_WORDS]);

impl Bloom {
    /// The signature of a single name.
    fn signature(name: &str) -> Self {
        let mut bloom = Self::default();
        for i in 0..BLOOM_HASHES {
            bloom.set(fnv1a(name.as_bytes(), i) % BLOOM_BITS);
        }
        bloom
    }

    fn set(&mut self, bit: u64) {
        self.0[(bit / 64) as usize] |= 1 << (bit % 64);
    }

    /// Folds another signature into this one.
    pub fn unite(&mut self, other: &Bloom) {
        for (el, word) in self.0.iter_mut().zip(other.0.iter()) {
            *el |= word;
        }
    }

    /// Whether every bit of `sig` is present. A `false` result is
    /// definitive: the name behind `sig` was never united into this
    /// filter. `true` may be a false positive.
    pub fn contains_sig(&self, sig: &Bloom) -> bool {
        self.0
            .iter()
            .zip(sig.0.iter())
            .all(|(el, word)| word & !el == 0)
    }
}

fn fnv1a(bytes: &[u8], salt: u64) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325 ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[derive(Debug, Default)]
pub struct AtomTable {
    names: Vec<String>,
    blooms: Vec<Bloom>,
    index: HashMap<String, Atom>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Atom {
        if let Some(&atom) = self.index.get(name) {
            return atom;
        }

        let atom = Atom(self.names.len() as u32);
        self.names.push(name.to_string());
        self.blooms.push(Bloom::signature(name));
        self.index.insert(name.to_string(), atom);
        atom
    }

    pub fn name(&self, atom: Atom) -> &str {
        &self.names[atom.0 as usize]
    }

    pub fn bloom(&self, atom: Atom) -> &Bloom {
        &self.blooms[atom.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
