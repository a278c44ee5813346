//! Scoped per-job scratch directory.
//!
//! `JobWorkdir` owns the directory from creation to disposal: the ordinary
//! path calls [`JobWorkdir::finalize`], and `Drop` removes the directory if
//! an early error or panic skipped that call. Opting out of cleanup disarms
//! both paths, so a kept directory survives even an unwinding exit.
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};

use crate::error::{Error, Result};

/// How a finished working directory was disposed of.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposal {
    Removed(PathBuf),
    Kept(PathBuf),
}

/// A uniquely named scratch directory owned by exactly one launch.
#[derive(Debug)]
pub struct JobWorkdir {
    dir: Option<TempDir>,
    path: PathBuf,
    keep: bool,
}

impl JobWorkdir {
    /// Create `xcp_d.<jobid>.<suffix>` under the scratch root.
    pub fn create(scratch_root: &Path, job_id: &str, keep: bool) -> Result<Self> {
        let dir = Builder::new()
            .prefix(&format!("xcp_d.{job_id}."))
            .tempdir_in(scratch_root)
            .map_err(|source| Error::Create {
                what: "working directory",
                path: scratch_root.to_path_buf(),
                source,
            })?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
            keep,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Dispose of the directory according to the cleanup policy and report
    /// which way it went.
    pub fn finalize(mut self) -> io::Result<Disposal> {
        let Some(dir) = self.dir.take() else {
            return Ok(Disposal::Kept(self.path.clone()));
        };
        if self.keep {
            Ok(Disposal::Kept(dir.keep()))
        } else {
            let path = self.path.clone();
            dir.close()?;
            Ok(Disposal::Removed(path))
        }
    }
}

impl Drop for JobWorkdir {
    fn drop(&mut self) {
        // Backstop for paths that never reach finalize. Dropping the inner
        // TempDir removes the directory; keep() disarms that.
        if let Some(dir) = self.dir.take()
            && self.keep
        {
            let _ = dir.keep();
        }
    }
}
