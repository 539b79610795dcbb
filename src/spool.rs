//! Out-of-core blob storage, fanned out on disk by serial number.
//!
//! Each blob is written once during parsing and read back exactly once
//! during emission, so the layout is optimized for nothing but cheap
//! random access by serial: the serial is decomposed base-256 and each
//! digit becomes a path component, keeping any one directory from
//! growing past the fanout.

use std::{
    fs::{self, DirBuilder, File},
    io::{BufWriter, Write},
    os::unix::fs::DirBuilderExt,
    path::PathBuf,
};

use tempfile::TempDir;

use crate::{
    error::{Error, Result},
    graph::Serial,
};

const FANOUT: Serial = 256;

#[derive(Debug)]
pub(crate) struct BlobSpool {
    dir: TempDir,
}

impl BlobSpool {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::Builder::new()
                .prefix("cvs-fast-export-")
                .tempdir()
                .map_err(Error::SpoolDir)?,
        })
    }

    /// Random-access location of the blob with the given serial. The
    /// leaf component carries an `=` prefix so it can never collide
    /// with a fanout directory; with `create`, missing intermediate
    /// directories are made along the way.
    fn blobfile(&self, serial: Serial, create: bool) -> Result<PathBuf> {
        let mut path = self.dir.path().to_path_buf();
        let mut m = serial;

        loop {
            let digit = m % FANOUT;
            m = (m - digit) / FANOUT;
            if m == 0 {
                path.push(format!("={:x}", digit));
                break;
            }

            path.push(format!("{:x}", digit));
            if create && !path.is_dir() {
                DirBuilder::new()
                    .mode(0o770)
                    .create(&path)
                    .map_err(|err| Error::SpoolSubdir {
                        path: path.display().to_string(),
                        err,
                    })?;
            }
        }

        Ok(path)
    }

    /// Writes one blob, framed the way the output stream wants it: a
    /// `data` header, the optional prefix, the content, and a trailing
    /// newline that the stream format requires after the payload.
    pub(crate) fn write(
        &self,
        serial: Serial,
        prefix: Option<&[u8]>,
        content: &[u8],
    ) -> Result<()> {
        let extra = prefix.map(<[u8]>::len).unwrap_or(0);
        let mut wfp = BufWriter::new(File::create(self.blobfile(serial, true)?)?);

        write!(wfp, "data {}\n", content.len() + extra)?;
        if let Some(prefix) = prefix {
            wfp.write_all(prefix)?;
        }
        wfp.write_all(content)?;
        wfp.write_all(b"\n")?;
        wfp.flush()?;

        Ok(())
    }

    pub(crate) fn open(&self, serial: Serial) -> Result<File> {
        Ok(File::open(self.blobfile(serial, false)?)?)
    }

    /// Removes one spooled blob; used as soon as the blob has been
    /// streamed out.
    pub(crate) fn unlink(&self, serial: Serial) {
        if let Ok(path) = self.blobfile(serial, false) {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("cannot unlink spooled blob {}: {}", serial, e);
            }
        }
    }

    /// Tears the spool down, removing files in reverse serial order so
    /// directories drain before their parents. Serials that were
    /// already unlinked during emission, and serials that were assigned
    /// to commits rather than blobs, have no file and are skipped.
    pub(crate) fn wrap(self, last: Serial) {
        let mut serial = last;
        while serial > 0 {
            if let Ok(path) = self.blobfile(serial, false) {
                let _ = fs::remove_file(&path);
                if path.file_name().map(|n| n == "=0").unwrap_or(false) {
                    if let Some(parent) = path.parent() {
                        if parent != self.dir.path() {
                            let _ = fs::remove_dir(parent);
                        }
                    }
                }
            }
            serial -= 1;
        }

        if let Err(e) = self.dir.close() {
            log::warn!("failed to remove blob spool directory: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn test_fanout_layout() {
        let spool = BlobSpool::new().unwrap();
        let root = spool.dir.path().to_path_buf();

        assert_eq!(spool.blobfile(0, false).unwrap(), root.join("=0"));
        assert_eq!(spool.blobfile(1, false).unwrap(), root.join("=1"));
        assert_eq!(spool.blobfile(255, false).unwrap(), root.join("=ff"));
        assert_eq!(spool.blobfile(256, false).unwrap(), root.join("0/=1"));
        assert_eq!(spool.blobfile(257, false).unwrap(), root.join("1/=1"));
        assert_eq!(
            spool.blobfile(65536, false).unwrap(),
            root.join("0/0/=1")
        );
    }

    #[test]
    fn test_write_framing() {
        let spool = BlobSpool::new().unwrap();
        spool.write(1, None, b"a\n").unwrap();
        spool.write(2, Some(b"pre\n"), b"b\n").unwrap();

        let mut buf = String::new();
        spool.open(1).unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "data 2\na\n\n");

        buf.clear();
        spool.open(2).unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "data 6\npre\nb\n\n");
    }

    #[test]
    fn test_wrap_removes_everything() {
        let spool = BlobSpool::new().unwrap();
        let root = spool.dir.path().to_path_buf();
        for serial in 1..=300 {
            spool.write(serial, None, b"x\n").unwrap();
        }

        spool.wrap(300);
        assert!(!root.exists());
    }

    #[test]
    fn test_unlink_then_wrap() {
        let spool = BlobSpool::new().unwrap();
        let root = spool.dir.path().to_path_buf();
        spool.write(1, None, b"x\n").unwrap();
        spool.write(2, None, b"y\n").unwrap();

        spool.unlink(1);
        assert!(spool.open(1).is_err());

        spool.wrap(2);
        assert!(!root.exists());
    }
}
