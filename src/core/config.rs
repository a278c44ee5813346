//! Resolved launch configuration. All environment access happens here,
//! once, at startup; the rest of the program works from `LaunchConfig`.
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{BindMount, EnvPair};

/// LSF job identifier. Its presence is what marks a scheduled-job context.
pub const JOB_ID_VAR: &str = "LSB_JOBID";
/// Processors reserved for the job; drives both downstream thread flags.
pub const NUM_PROC_VAR: &str = "LSB_DJOB_NUMPROC";
/// Optional override for the scratch root holding per-job working dirs.
pub const SCRATCH_VAR: &str = "XCPD_SCRATCH";
/// Optional override for the directory holding versioned `.sif` images.
pub const CONTAINER_DIR_VAR: &str = "XCPD_CONTAINER_DIR";

const DEFAULT_SCRATCH_ROOT: &str = "/scratch";

/// Job context provided by the batch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerContext {
    pub job_id: String,
    pub num_procs: usize,
}

impl SchedulerContext {
    pub fn from_env() -> Result<Self> {
        Self::from_values(env::var(JOB_ID_VAR).ok(), env::var(NUM_PROC_VAR).ok())
    }

    fn from_values(job_id: Option<String>, num_procs: Option<String>) -> Result<Self> {
        let job_id = job_id
            .filter(|v| !v.is_empty())
            .ok_or(Error::OutsideSchedulerJob { var: JOB_ID_VAR })?;
        let raw = num_procs.ok_or(Error::OutsideSchedulerJob { var: NUM_PROC_VAR })?;
        let num_procs = raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| Error::BadSchedulerValue {
                var: NUM_PROC_VAR,
                value: raw.clone(),
            })?;
        Ok(Self { job_id, num_procs })
    }
}

/// What the CLI collects, before environment resolution.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub templateflow: PathBuf,
    pub version: String,
    pub binds: Vec<BindMount>,
    pub env: Vec<EnvPair>,
    pub cleanup: bool,
    pub passthrough: Vec<String>,
}

/// Fully resolved launch configuration, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub templateflow: PathBuf,
    pub version: String,
    pub image: PathBuf,
    pub license: PathBuf,
    pub extra_binds: Vec<BindMount>,
    pub extra_env: Vec<EnvPair>,
    pub cleanup: bool,
    pub passthrough: Vec<String>,
    pub scheduler: SchedulerContext,
    pub scratch_root: PathBuf,
}

impl LaunchConfig {
    /// Merge CLI options with the scheduler environment and derive the
    /// image, license, and scratch paths. Fails outside a scheduled job.
    pub fn resolve(opts: LaunchOptions) -> Result<Self> {
        if opts.version.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "version-tag",
                value: opts.version,
            });
        }
        let scheduler = SchedulerContext::from_env()?;
        let containers = containers_dir();
        Ok(Self {
            image: image_path(&containers, &opts.version),
            license: containers.join("license.txt"),
            input: opts.input,
            output: opts.output,
            templateflow: opts.templateflow,
            version: opts.version,
            extra_binds: opts.binds,
            extra_env: opts.env,
            cleanup: opts.cleanup,
            passthrough: opts.passthrough,
            scheduler,
            scratch_root: scratch_root(),
        })
    }

    /// Existence checks that gate working-directory creation and launch.
    pub fn validate(&self) -> Result<()> {
        if !self.image.is_file() {
            return Err(Error::NotFound {
                what: "container image",
                path: self.image.clone(),
            });
        }
        if !self.input.is_dir() {
            return Err(Error::NotFound {
                what: "input directory",
                path: self.input.clone(),
            });
        }
        if !self.templateflow.is_dir() {
            return Err(Error::NotFound {
                what: "TemplateFlow directory",
                path: self.templateflow.clone(),
            });
        }
        Ok(())
    }

    /// Create the output directory if missing. Idempotent.
    pub fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output).map_err(|source| Error::Create {
            what: "output directory",
            path: self.output.clone(),
            source,
        })
    }
}

/// Versioned image artifact inside the containers directory.
pub fn image_path(containers: &Path, version: &str) -> PathBuf {
    containers.join(format!("xcp_d-{version}.sif"))
}

fn containers_dir() -> PathBuf {
    if let Some(dir) = env::var_os(CONTAINER_DIR_VAR) {
        return PathBuf::from(dir);
    }
    // Images live next to the installed launcher by convention.
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join("containers"))
        .unwrap_or_else(|| PathBuf::from("containers"))
}

fn scratch_root() -> PathBuf {
    scratch_root_from(env::var_os(SCRATCH_VAR))
}

fn scratch_root_from(raw: Option<OsString>) -> PathBuf {
    match raw {
        Some(v) if Path::new(&v).is_dir() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_SCRATCH_ROOT),
    }
}
