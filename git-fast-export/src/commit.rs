use std::{
    fmt::{Display, Write},
    io,
};

use crate::{Error, Identity, Mark};

/// A `commit` record. The trailing blank line that separates records is
/// part of the rendering.
#[derive(Debug)]
pub struct Commit {
    branch_ref: String,
    mark: Mark,
    committer: Identity,
    message: String,
    from: Option<Mark>,
    ops: Vec<FileOp>,
    property: Option<(String, String)>,
}

impl Commit {
    pub(crate) fn write(&self, writer: &mut impl io::Write) -> Result<(), Error> {
        // Build up a buffer and then write.
        let mut buf = String::new();
        write!(buf, "commit {}\n", self.branch_ref)?;
        write!(buf, "mark {}\n", self.mark)?;
        write!(buf, "committer {}\n", self.committer)?;
        write!(buf, "data {}\n{}\n", self.message.len(), self.message)?;
        if let Some(from) = &self.from {
            write!(buf, "from {}\n", from)?;
        }
        for op in self.ops.iter() {
            write!(buf, "{}\n", op)?;
        }
        if let Some((name, value)) = &self.property {
            // The value carries its own terminating newline.
            write!(buf, "property {} {} {}", name, value.len(), value)?;
        }
        buf.push('\n');

        Ok(write!(writer, "{}", buf)?)
    }
}

#[derive(Debug)]
pub struct CommitBuilder {
    branch_ref: String,
    mark: Mark,
    committer: Option<Identity>,
    message: Option<String>,
    from: Option<Mark>,
    ops: Vec<FileOp>,
    property: Option<(String, String)>,
}

impl CommitBuilder {
    pub fn new(branch_ref: String, mark: Mark) -> Self {
        Self {
            branch_ref,
            mark,
            committer: None,
            message: None,
            from: None,
            ops: Vec::new(),
            property: None,
        }
    }

    pub fn committer(&mut self, committer: Identity) -> &mut Self {
        self.committer = Some(committer);
        self
    }

    pub fn message(&mut self, message: String) -> &mut Self {
        self.message = Some(message);
        self
    }

    pub fn from(&mut self, from: Mark) -> &mut Self {
        self.from = Some(from);
        self
    }

    pub fn file_op(&mut self, op: FileOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn property(&mut self, name: String, value: String) -> &mut Self {
        self.property = Some((name, value));
        self
    }

    pub fn build(self) -> Result<Commit, Error> {
        let committer = match self.committer {
            Some(committer) => committer,
            None => {
                return Err(Error::MissingCommitter);
            }
        };
        let message = match self.message {
            Some(message) => message,
            None => {
                return Err(Error::MissingCommitMessage);
            }
        };

        Ok(Commit {
            branch_ref: self.branch_ref,
            mark: self.mark,
            committer,
            message,
            from: self.from,
            ops: self.ops,
            property: self.property,
        })
    }
}

#[derive(Debug, Clone)]
pub enum FileOp {
    Modify {
        mode: Mode,
        mark: Mark,
        path: String,
    },
    ModifyInline {
        mode: Mode,
        path: String,
        data: String,
    },
    Delete {
        path: String,
    },
}

impl Display for FileOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOp::Modify { mode, mark, path } => write!(f, "M {} {} {}", mode, mark, path),
            FileOp::ModifyInline { mode, path, data } => {
                write!(f, "M {} inline {}\ndata {}\n{}", mode, path, data.len(), data)
            }
            FileOp::Delete { path } => write!(f, "D {}", path),
        }
    }
}

/// git fast-import only supports the 644 and 755 file modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Executable,
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Normal => write!(f, "100644"),
            Mode::Executable => write!(f, "100755"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_record() {
        let mut builder = CommitBuilder::new("refs/heads/master".into(), Mark::from(4));
        builder
            .committer(Identity::new("al", "al", 1000000060, 0))
            .message("more".into())
            .from(Mark::from(2))
            .file_op(FileOp::Modify {
                mode: Mode::Normal,
                mark: Mark::from(3),
                path: "foo".into(),
            });

        let mut out = Vec::new();
        builder.build().unwrap().write(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "commit refs/heads/master\n\
             mark :4\n\
             committer al <al> 1000000060 +0000\n\
             data 4\n\
             more\n\
             from :2\n\
             M 100644 :3 foo\n\
             \n"
        );
    }

    #[test]
    fn test_commit_record_with_property() {
        let mut builder = CommitBuilder::new("refs/heads/master".into(), Mark::from(2));
        builder
            .committer(Identity::new("al", "al", 12, 0))
            .message("m".into())
            .property("cvs-revision".into(), "foo 1.1\n".into());

        let mut out = Vec::new();
        builder.build().unwrap().write(&mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "commit refs/heads/master\n\
             mark :2\n\
             committer al <al> 12 +0000\n\
             data 1\n\
             m\n\
             property cvs-revision 8 foo 1.1\n\
             \n"
        );
    }

    #[test]
    fn test_inline_op() {
        let op = FileOp::ModifyInline {
            mode: Mode::Normal,
            path: ".gitignore".into(),
            data: "core\n".into(),
        };

        assert_eq!(op.to_string(), "M 100644 inline .gitignore\ndata 5\ncore\n");
    }

    #[test]
    fn test_missing_fields() {
        assert!(matches!(
            CommitBuilder::new("refs/heads/master".into(), Mark::from(1)).build(),
            Err(Error::MissingCommitter)
        ));

        let mut builder = CommitBuilder::new("refs/heads/master".into(), Mark::from(1));
        builder.committer(Identity::new("a", "a", 0, 0));
        assert!(matches!(builder.build(), Err(Error::MissingCommitMessage)));
    }
}
