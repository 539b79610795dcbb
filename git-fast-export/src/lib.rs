//! A writer for the [git-fast-import
//! format](https://git-scm.com/docs/git-fast-import), aimed at producing
//! an export stream rather than driving a live `git fast-import`
//! process.
//!
//! Marks are supplied by the caller with every record: an exporter that
//! replays a repository deterministically needs its mark numbering to be
//! stable across runs, so this writer never allocates marks itself.

use std::io::{self, Read, Write};

mod commit;
pub use commit::{Commit, CommitBuilder, FileOp, Mode};

mod error;
pub use error::Error;

mod identity;
pub use identity::Identity;

mod mark;
pub use mark::Mark;

/// A writer that writes records in the git-fast-import command format to
/// the underlying writer.
///
/// The caller is responsible for sending [`done`](Writer::done) once the
/// stream is complete; nothing is written on drop.
#[derive(Debug)]
pub struct Writer<W>
where
    W: Write,
{
    writer: W,
}

impl<W> Writer<W>
where
    W: Write,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes a `blob` record whose payload already carries its own
    /// `data` framing, streaming it from the given reader.
    pub fn blob_from<R>(&mut self, mark: Mark, payload: &mut R) -> Result<(), Error>
    where
        R: Read,
    {
        write!(self.writer, "blob\nmark {}\n", mark)?;
        io::copy(payload, &mut self.writer)?;

        Ok(())
    }

    /// Writes a `commit` record.
    pub fn commit(&mut self, commit: &Commit) -> Result<(), Error> {
        commit.write(&mut self.writer)
    }

    /// Writes a `reset` record pointing a ref at a mark.
    pub fn reset(&mut self, ref_name: &str, from: Mark) -> Result<(), Error> {
        Ok(write!(self.writer, "reset {}\nfrom {}\n\n", ref_name, from)?)
    }

    /// Writes the closing `done` command.
    pub fn done(&mut self) -> Result<(), Error> {
        Ok(writeln!(self.writer, "done")?)
    }

    /// Access to the underlying writer, for the rare record fragment the
    /// typed methods do not cover.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }
}
