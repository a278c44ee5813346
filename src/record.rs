//! JSON provenance sidecar written into the output directory before the
//! child runs: enough to reproduce the launch by hand.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::core::command::RuntimeCommand;
use crate::core::config::LaunchConfig;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
pub struct InvocationRecord {
    pub written_at: String,
    pub job_id: String,
    pub version: String,
    pub image: PathBuf,
    pub input: PathBuf,
    pub output: PathBuf,
    pub templateflow: PathBuf,
    pub workdir: PathBuf,
    pub nthreads: usize,
    pub cleanup: bool,
    pub command: String,
}

impl InvocationRecord {
    pub fn new(cfg: &LaunchConfig, workdir: &Path, command: &RuntimeCommand) -> Self {
        Self {
            written_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            job_id: cfg.scheduler.job_id.clone(),
            version: cfg.version.clone(),
            image: cfg.image.clone(),
            input: cfg.input.clone(),
            output: cfg.output.clone(),
            templateflow: cfg.templateflow.clone(),
            workdir: workdir.to_path_buf(),
            nthreads: cfg.scheduler.num_procs,
            cleanup: cfg.cleanup,
            command: command.display_line(),
        }
    }

    /// Sidecar path inside the output directory, one file per job.
    pub fn sidecar_path(&self, output: &Path) -> PathBuf {
        output.join(format!("xcp_d_launch-{}.json", self.job_id))
    }

    /// Write the record and return where it landed.
    pub fn write(&self, output: &Path) -> Result<PathBuf> {
        let path = self.sidecar_path(output);
        let json = serde_json::to_string_pretty(self).map_err(Error::external)?;
        fs::write(&path, json)?;
        Ok(path)
    }
}
