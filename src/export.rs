//! Commit emission and stream orchestration.
//!
//! This code is somewhat involved because the natural order of
//! operations generated by file traversal in the rest of the pipeline
//! is not even remotely like the canonical order generated by git
//! fast-export. We emulate the latter so that regression testing and
//! comparisons with other tools are as easy as possible.

use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use chrono::FixedOffset;
use git_fast_export::{CommitBuilder, FileOp, Identity, Mark, Mode, Writer};

use crate::{
    atom::{Atom, AtomTable},
    diff::{compute_parent_links, FileIter},
    error::{Error, Result},
    graph::{CommitId, GitCommit, RevFile, RevList, Serial},
    path::{export_filename, path_deep_compare},
    spool::BlobSpool,
};

/// GNU CVS default ignores. Patterns CVS ignores by default but which
/// are highly unlikely to turn up outside an actual CVS repository are
/// omitted so they stay conspicuous if they do: RCS SCCS CVS CVS.adm
/// RCSLOG cvslog.*
pub const CVS_IGNORES: &str = "# CVS default ignores begin\n\
tags\n\
TAGS\n\
.make.state\n\
.nse_depinfo\n\
*~\n\
#*\n\
.#*\n\
,*\n\
_$*\n\
*$\n\
*.old\n\
*.bak\n\
*.BAK\n\
*.orig\n\
*.rej\n\
.del-*\n\
*.a\n\
*.olb\n\
*.o\n\
*.obj\n\
*.so\n\
*.exe\n\
*.Z\n\
*.elc\n\
*.ln\n\
core\n\
# CVS default ignores end\n";

/// A resolved author identity. Building the map from a CVS authors
/// file is the caller's job; the timezone arrives pre-resolved so
/// emission never has to consult a timezone database.
#[derive(Debug, Clone)]
pub struct AuthorInfo {
    pub full: String,
    pub email: String,
    pub timezone: FixedOffset,
}

/// Maps CVS user names to resolved identities. Names without an entry
/// fall back to the bare CVS name with a UTC offset.
pub type AuthorMap = HashMap<String, AuthorInfo>;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Prepended to branch names in `commit` and `reset` records.
    pub branch_prefix: String,
    /// Suppress records for commits older than this unix time; marks
    /// are still consumed so numbering stays stable across incremental
    /// runs.
    pub from_time: Option<i64>,
    /// Write a `path revision :mark` map of emitted file revisions.
    pub revision_map: Option<PathBuf>,
    /// Attach a `cvs-revision` property to every commit record.
    pub reposurgeon: bool,
    /// Replace commit dates with marks scaled into fake timestamps, for
    /// reproducible regression output.
    pub force_dates: bool,
    /// Emit branch by branch instead of in canonical date order.
    pub branch_order: bool,
    /// The changeset coalescing window, only used to scale forced
    /// dates.
    pub commit_time_window: i64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            branch_prefix: String::from("refs/heads/"),
            from_time: None,
            revision_map: None,
            reposurgeon: false,
            force_dates: false,
            branch_order: false,
            commit_time_window: 300,
        }
    }
}

/// One slot of the serial-indexed mark table. `external` is the mark
/// visible in the stream; 0 means not yet assigned.
#[derive(Debug, Clone, Copy, Default)]
struct MarkSlot {
    external: u32,
    emitted: bool,
}

/// A fileop before mark resolution; sorted into canonical order, then
/// turned into stream ops.
#[derive(Debug)]
enum PendingOp {
    Modify {
        mode: Mode,
        serial: Serial,
        path: String,
    },
    Delete {
        path: String,
    },
}

impl PendingOp {
    fn path(&self) -> &str {
        match self {
            PendingOp::Modify { path, .. } => path,
            PendingOp::Delete { path } => path,
        }
    }
}

/// Per-run emission state, created and torn down by
/// [`Exporter::export_commits`].
struct Session<'a> {
    markmap: Vec<MarkSlot>,
    /// Serial assigned to each commit as it is exported, by commit id.
    commit_serials: Vec<Serial>,
    /// One-shot latch for the synthesized `.gitignore`.
    need_ignores: bool,
    revmap: Option<BufWriter<File>>,
    atoms: &'a AtomTable,
    authors: &'a AuthorMap,
    opts: &'a ExportOptions,
}

#[derive(Debug)]
struct CommitSeq {
    commit: CommitId,
    head: usize,
    realized: bool,
}

/// The export core. Created before parsing begins so blobs can be
/// spooled as they are seen; consumed by
/// [`export_commits`](Self::export_commits), which tears the spool
/// down again.
#[derive(Debug)]
pub struct Exporter {
    spool: BlobSpool,
    seqno: Serial,
    mark: u32,
    striplen: usize,
}

impl Exporter {
    /// Sets up the blob spool. `striplen` is the length of the
    /// repository path prefix to drop from every file name.
    pub fn new(striplen: usize) -> Result<Self> {
        Ok(Self {
            spool: BlobSpool::new()?,
            seqno: 0,
            mark: 0,
            striplen,
        })
    }

    /// Spools one blob, assigning it the next serial number.
    ///
    /// A `.cvsignore` master gets the CVS default ignore block
    /// prepended, so the converted `.gitignore` keeps the semantics the
    /// file had under CVS.
    pub fn export_blob(&mut self, atoms: &AtomTable, name: Atom, content: &[u8]) -> Result<Serial> {
        let stripped = atoms.name(name).get(self.striplen..).unwrap_or("");
        let prefix = if stripped == ".cvsignore,v" || stripped.ends_with("/.cvsignore,v") {
            Some(CVS_IGNORES.as_bytes())
        } else {
            None
        };

        if self.seqno == Serial::MAX {
            return Err(Error::SerialOverflow);
        }
        self.seqno += 1;
        self.spool.write(self.seqno, prefix, content)?;

        Ok(self.seqno)
    }

    /// Exports the whole revision list as a fast-import stream in
    /// canonical order, consuming the exporter and its blob spool.
    pub fn export_commits<W>(
        mut self,
        out: W,
        rl: &RevList,
        atoms: &AtomTable,
        authors: &AuthorMap,
        opts: &ExportOptions,
    ) -> Result<()>
    where
        W: Write,
    {
        let total = export_ncommit(rl);
        log::debug!("exporting {} commits on {} heads", total, rl.heads.len());

        let mut sess = Session {
            // Mark indices are 1-origin; slot 0 stays empty.
            markmap: vec![MarkSlot::default(); self.seqno as usize + total + 1],
            commit_serials: vec![0; rl.commit_count()],
            need_ignores: true,
            revmap: match opts.revision_map.as_ref() {
                Some(path) => Some(BufWriter::new(File::create(path)?)),
                None => None,
            },
            atoms,
            authors,
            opts,
        };
        let mut out = Writer::new(out);

        if opts.branch_order {
            // Dump by branch order, not by commit date. Slightly faster
            // and less memory-intensive, but incremental cutoffs cannot
            // work and the result is not canonical, so it cannot be
            // compared directly against other tools.
            for head in rl.heads.iter().filter(|h| !h.tail) {
                let history: Vec<CommitId> = chain(rl, head.commit).collect();
                for &id in history.iter().rev() {
                    self.export_commit(&mut sess, &mut out, rl, id, &head.ref_name, true)?;
                    self.emit_tags(&sess, &mut out, rl, id)?;
                }
            }
        } else {
            // Branches must ship in their head order or ancestor marks
            // would go unresolved, and each branch's span must run
            // oldest first. Laying the reversed spans into one array
            // gives an order that is already valid, and that can then
            // be date-sorted whenever topology agrees with time.
            let mut history: Vec<CommitSeq> = Vec::with_capacity(total);
            for (hi, head) in rl.heads.iter().enumerate() {
                if head.tail {
                    continue;
                }
                let ids: Vec<CommitId> = chain(rl, head.commit).collect();
                history.extend(ids.iter().rev().map(|&commit| CommitSeq {
                    commit,
                    head: hi,
                    realized: false,
                }));
            }

            let mut sortable = true;
            for seq in history.iter() {
                let commit = rl.commit(seq.commit);
                if let Some(pid) = commit.parent {
                    if rl.commit(pid).date > commit.date {
                        sortable = false;
                        log::warn!("some parent commits are younger than children");
                        break;
                    }
                }
            }
            if sortable {
                history.sort_by_key(|seq| rl.commit(seq.commit).date);
            }

            for i in 0..history.len() {
                let id = history[i].commit;
                let hi = history[i].head;
                let mut report = true;

                if let Some(fromtime) = opts.from_time {
                    let commit = rl.commit(id);
                    if fromtime >= display_date(commit, self.mark + 1, opts) {
                        report = false;
                    } else if !history[i].realized {
                        // The first reported commit of a head whose
                        // parent was cut off needs an anchor onto the
                        // branch produced by the previous run.
                        if let Some(pid) = commit.parent {
                            let pserial = sess.commit_serials[usize::from(pid)];
                            let pmark = sess.markmap[pserial as usize].external;
                            if display_date(rl.commit(pid), pmark, opts) < fromtime {
                                write!(
                                    out.get_mut(),
                                    "from {}{}^0\n\n",
                                    opts.branch_prefix, rl.heads[hi].ref_name
                                )?;
                            }
                        }
                        for seq in history[i..].iter_mut() {
                            if seq.head == hi {
                                seq.realized = true;
                            }
                        }
                    }
                }

                self.export_commit(&mut sess, &mut out, rl, id, &rl.heads[hi].ref_name, report)?;
                self.emit_tags(&sess, &mut out, rl, id)?;
            }
        }

        for head in rl.heads.iter() {
            let serial = sess.commit_serials[usize::from(head.commit)];
            out.reset(
                &format!("{}{}", opts.branch_prefix, head.ref_name),
                Mark::from(sess.markmap[serial as usize].external),
            )?;
        }

        out.done()?;

        if let Some(mut revmap) = sess.revmap.take() {
            revmap.flush()?;
        }
        self.spool.wrap(self.seqno);

        Ok(())
    }

    /// Exports one commit, preceded by any blobs it is the first to
    /// reference. With `report` unset, serial and mark slots are still
    /// consumed so numbering stays stable, but nothing is written.
    fn export_commit<W>(
        &mut self,
        sess: &mut Session,
        out: &mut Writer<W>,
        rl: &RevList,
        id: CommitId,
        branch: &str,
        report: bool,
    ) -> Result<()>
    where
        W: Write,
    {
        let commit = rl.commit(id);
        let parent = commit.parent.map(|pid| rl.commit(pid));

        let links = parent.map(|p| compute_parent_links(sess.atoms, commit, p));
        let parent_files: Vec<&RevFile> = parent
            .map(|p| FileIter::new(p).map(|(_, f)| f).collect())
            .unwrap_or_default();

        let collect_revs = sess.revmap.is_some() || sess.opts.reposurgeon;
        let mut ops: Vec<PendingOp> = Vec::new();
        let mut revpairs = String::new();

        for (fi, f) in FileIter::new(commit) {
            let (present, changed) = match links.as_ref().and_then(|l| l.commit_to_parent[fi]) {
                Some(pi) => (true, f.serial != parent_files[pi].serial),
                None => (false, false),
            };

            if !present || changed {
                ops.push(PendingOp::Modify {
                    mode: if f.mode & 0o100 != 0 {
                        Mode::Executable
                    } else {
                        Mode::Normal
                    },
                    serial: f.serial,
                    path: export_filename(sess.atoms.name(f.name), self.striplen, true),
                });

                if collect_revs {
                    revpairs.push_str(&format!(
                        "{} {}\n",
                        export_filename(sess.atoms.name(f.name), self.striplen, false),
                        f.number
                    ));
                }
            }
        }

        if let Some(links) = links.as_ref() {
            for (pi, pf) in parent_files.iter().enumerate() {
                if !links.parent_matched[pi] {
                    ops.push(PendingOp::Delete {
                        path: export_filename(sess.atoms.name(pf.name), self.striplen, true),
                    });
                }
            }
        }

        // Ship any blobs this commit references for the first time, in
        // pre-sort op order. A blob shared by several commits is
        // emitted and unlinked exactly once.
        for op in ops.iter() {
            if let PendingOp::Modify { serial, .. } = op {
                let idx = *serial as usize;
                if !sess.markmap[idx].emitted {
                    self.mark += 1;
                    sess.markmap[idx].external = self.mark;
                    if report {
                        match self.spool.open(*serial) {
                            Ok(mut blob) => {
                                out.blob_from(Mark::from(self.mark), &mut blob)?;
                                self.spool.unlink(*serial);
                                sess.markmap[idx].emitted = true;
                            }
                            Err(e) => {
                                log::warn!("cannot reopen spooled blob {}: {}", serial, e)
                            }
                        }
                    }
                }
            }
        }

        ops.sort_by(|a, b| path_deep_compare(a.path(), b.path()));

        let (full, email, timezone) = match sess.authors.get(commit.author.as_str()) {
            Some(author) => (
                author.full.as_str(),
                author.email.as_str(),
                author.timezone,
            ),
            None => (
                commit.author.as_str(),
                commit.author.as_str(),
                FixedOffset::east(0),
            ),
        };

        self.seqno += 1;
        self.mark += 1;
        let here = self.mark;
        sess.markmap[self.seqno as usize].external = here;
        sess.commit_serials[usize::from(id)] = self.seqno;

        if report {
            let ct = display_date(commit, here, sess.opts);
            let mut builder = CommitBuilder::new(
                format!("{}{}", sess.opts.branch_prefix, branch),
                Mark::from(here),
            );
            builder
                .committer(Identity::new(full, email, ct, timezone.local_minus_utc()))
                .message(commit.log.clone());
            if let Some(pid) = commit.parent {
                let pserial = sess.commit_serials[usize::from(pid)];
                builder.from(Mark::from(sess.markmap[pserial as usize].external));
            }

            for op in ops.drain(..) {
                if sess.need_ignores && op.path() == ".gitignore" {
                    // The blob writer already prepended the defaults.
                    sess.need_ignores = false;
                }
                builder.file_op(match op {
                    PendingOp::Modify { mode, serial, path } => FileOp::Modify {
                        mode,
                        mark: Mark::from(sess.markmap[serial as usize].external),
                        path,
                    },
                    PendingOp::Delete { path } => FileOp::Delete { path },
                });
            }

            if sess.need_ignores {
                sess.need_ignores = false;
                builder.file_op(FileOp::ModifyInline {
                    mode: Mode::Normal,
                    path: String::from(".gitignore"),
                    data: String::from(CVS_IGNORES),
                });
            }

            if sess.opts.reposurgeon {
                builder.property(String::from("cvs-revision"), revpairs.clone());
            }

            out.commit(&builder.build()?)?;
        }

        if let Some(revmap) = sess.revmap.as_mut() {
            for pair in revpairs.lines() {
                writeln!(revmap, "{} :{}", pair, here)?;
            }
        }

        Ok(())
    }

    fn emit_tags<W>(
        &self,
        sess: &Session,
        out: &mut Writer<W>,
        rl: &RevList,
        id: CommitId,
    ) -> Result<()>
    where
        W: Write,
    {
        for tag in rl.tags.iter().filter(|t| t.commit == id) {
            let serial = sess.commit_serials[usize::from(id)];
            out.reset(
                &format!("refs/tags/{}", tag.name),
                Mark::from(sess.markmap[serial as usize].external),
            )?;
        }

        Ok(())
    }
}

fn display_date(commit: &GitCommit, mark: u32, opts: &ExportOptions) -> i64 {
    if opts.force_dates {
        i64::from(mark) * opts.commit_time_window * 2
    } else {
        commit.date
    }
}

/// Walks a branch's span from its tip toward the root, stopping after
/// the tail commit.
fn chain<'a>(rl: &'a RevList, tip: CommitId) -> impl Iterator<Item = CommitId> + 'a {
    std::iter::successors(Some(tip), move |&id| {
        let commit = rl.commit(id);
        if commit.tail {
            None
        } else {
            commit.parent
        }
    })
}

fn export_ncommit(rl: &RevList) -> usize {
    rl.heads
        .iter()
        .filter(|h| !h.tail)
        .map(|h| chain(rl, h.commit).count())
        .sum()
}
