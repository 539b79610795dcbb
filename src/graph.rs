//! The assembled, frozen commit graph handed to the exporter.
//!
//! Commits live in an arena owned by [`RevList`] and refer to each
//! other by [`CommitId`]. Directory buckets and file entries are
//! reference-counted because consecutive commits usually share most of
//! their trees; nothing here is mutated once export begins.

use std::rc::Rc;

use cvs_number::CvsNumber;
use derive_more::{Display, From, Into};

use crate::atom::{Atom, AtomTable, Bloom};

/// Identifies one spooled blob, and later one commit, in the shared
/// serial namespace. Serials are dense and 1-based; 0 is reserved.
pub type Serial = u32;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
pub struct CommitId(usize);

/// A file at a specific revision within a commit.
#[derive(Debug, Clone)]
pub struct RevFile {
    pub name: Atom,
    pub number: CvsNumber,
    pub mode: u32,
    pub serial: Serial,
}

/// A directory bucket of files, kept in canonical order by the graph
/// builder.
#[derive(Debug, Default)]
pub struct RevDir {
    pub files: Vec<Rc<RevFile>>,
}

#[derive(Debug)]
pub struct GitCommit {
    pub parent: Option<CommitId>,
    /// Commit time in unix seconds.
    pub date: i64,
    pub author: String,
    pub log: String,
    pub dirs: Vec<Rc<RevDir>>,
    /// Union of the Bloom signatures of every file name in the commit.
    pub bloom: Bloom,
    /// Marks the boundary of this branch's span: traversal must not
    /// follow `parent` past a tail commit.
    pub tail: bool,
}

impl GitCommit {
    /// Builds a commit, deriving its Bloom filter from the file names in
    /// `dirs`.
    pub fn new<A, L>(
        atoms: &AtomTable,
        parent: Option<CommitId>,
        date: i64,
        author: A,
        log: L,
        dirs: Vec<Rc<RevDir>>,
        tail: bool,
    ) -> Self
    where
        A: Into<String>,
        L: Into<String>,
    {
        let mut bloom = Bloom::default();
        for dir in dirs.iter() {
            for file in dir.files.iter() {
                bloom.unite(atoms.bloom(file.name));
            }
        }

        Self {
            parent,
            date,
            author: author.into(),
            log: log.into(),
            dirs,
            bloom,
            tail,
        }
    }
}

/// A named branch tip.
#[derive(Debug)]
pub struct RevRef {
    pub ref_name: String,
    pub commit: CommitId,
    /// Tail heads are shared spans of other branches; they are skipped
    /// during emission but still get a closing `reset`.
    pub tail: bool,
}

/// A symbolic name pinned to a commit.
#[derive(Debug)]
pub struct Tag {
    pub name: String,
    pub commit: CommitId,
}

#[derive(Debug, Default)]
pub struct RevList {
    commits: Vec<GitCommit>,
    pub heads: Vec<RevRef>,
    pub tags: Vec<Tag>,
}

impl RevList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_commit(&mut self, commit: GitCommit) -> CommitId {
        self.commits.push(commit);
        CommitId::from(self.commits.len() - 1)
    }

    pub fn add_head<S>(&mut self, ref_name: S, commit: CommitId, tail: bool)
    where
        S: Into<String>,
    {
        self.heads.push(RevRef {
            ref_name: ref_name.into(),
            commit,
            tail,
        });
    }

    pub fn add_tag<S>(&mut self, name: S, commit: CommitId)
    where
        S: Into<String>,
    {
        self.tags.push(Tag {
            name: name.into(),
            commit,
        });
    }

    pub fn commit(&self, id: CommitId) -> &GitCommit {
        &self.commits[usize::from(id)]
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }
}
