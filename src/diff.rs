//! Pairing a commit's files against its parent's.
//!
//! Both file lists are flattened in the same canonical order, so the
//! nested scan below is expected near-linear: the parent-side cursor
//! only ever moves forward, resuming just past the previous match, and
//! a commit-level Bloom probe rejects most names that were never in
//! the parent before any scanning happens.

use std::rc::Rc;

use crate::{
    atom::AtomTable,
    graph::{GitCommit, RevDir, RevFile},
};

/// A cursor over the files of a commit, flattening
/// `dirs[*].files[*]` into one sequence and skipping empty directory
/// buckets. Yields each file with its flat position.
#[derive(Debug, Clone)]
pub(crate) struct FileIter<'a> {
    dirs: &'a [Rc<RevDir>],
    dir: usize,
    file: usize,
    pos: usize,
}

impl<'a> FileIter<'a> {
    pub(crate) fn new(commit: &'a GitCommit) -> Self {
        Self {
            dirs: &commit.dirs,
            dir: 0,
            file: 0,
            pos: 0,
        }
    }
}

impl<'a> Iterator for FileIter<'a> {
    type Item = (usize, &'a RevFile);

    fn next(&mut self) -> Option<Self::Item> {
        while self.dir < self.dirs.len() {
            let files = &self.dirs[self.dir].files;
            if self.file < files.len() {
                let item = (self.pos, files[self.file].as_ref());
                self.file += 1;
                self.pos += 1;
                return Some(item);
            }

            self.dir += 1;
            self.file = 0;
        }

        None
    }
}

/// Reciprocal pairing between a commit's files and its parent's,
/// indexed by flat file position. Rebuilt for every exported commit.
#[derive(Debug)]
pub(crate) struct ParentLinks {
    /// For each file of the commit, the flat position of the matching
    /// parent file, if any.
    pub(crate) commit_to_parent: Vec<Option<usize>>,
    /// For each file of the parent, whether the commit still carries
    /// it; unmatched parent files were deleted.
    pub(crate) parent_matched: Vec<bool>,
}

pub(crate) fn compute_parent_links(
    atoms: &AtomTable,
    commit: &GitCommit,
    parent: &GitCommit,
) -> ParentLinks {
    let ncommit = FileIter::new(commit).count();
    let nparent = FileIter::new(parent).count();

    let mut links = ParentLinks {
        commit_to_parent: vec![None; ncommit],
        parent_matched: vec![false; nparent],
    };

    let mut maxmatch = ncommit.min(nparent);
    if maxmatch == 0 {
        return links;
    }

    let mut parent_iter = FileIter::new(parent);
    for (ci, cf) in FileIter::new(commit) {
        if !parent.bloom.contains_sig(atoms.bloom(cf.name)) {
            // Definitely not in the parent.
            continue;
        }

        // Because the file lists share an order, the scan can restart
        // after the last successful match.
        let mut it = parent_iter.clone();
        while let Some((pi, pf)) = it.next() {
            if cf.name == pf.name {
                links.commit_to_parent[ci] = Some(pi);
                links.parent_matched[pi] = true;
                maxmatch -= 1;
                if maxmatch == 0 {
                    return links;
                }
                parent_iter = it.clone();
                break;
            }
        }
    }

    links
}
