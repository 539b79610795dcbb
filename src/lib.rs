//! The export core of a CVS-to-git converter: file contents seen while
//! reading RCS master files are spooled to out-of-core storage as
//! numbered blobs, and once the commit graph has been assembled the
//! whole history is written out as a git fast-import command stream in
//! the canonical order git fast-export itself produces, so the result
//! can be compared byte-for-byte against other tools.
//!
//! The crate deliberately stops at the stream: parsing master files,
//! assembling changesets and driving `git fast-import` are the caller's
//! concern.

mod atom;
pub use atom::{Atom, AtomTable, Bloom};

mod diff;

mod error;
pub use error::{Error, Result};

mod export;
pub use export::{AuthorInfo, AuthorMap, ExportOptions, Exporter, CVS_IGNORES};

mod graph;
pub use graph::{CommitId, GitCommit, RevDir, RevFile, RevList, RevRef, Serial, Tag};

mod path;
pub use path::{export_filename, path_deep_compare};

mod spool;

pub use cvs_number::CvsNumber;
