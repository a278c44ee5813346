//! Typed assembly of the container-runtime invocation. The command is an
//! ordered token list end to end; no token is ever re-parsed or quoted on
//! its way to `exec`, so pass-through arguments and paths with unusual
//! characters survive untouched.
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::config::LaunchConfig;
use crate::types::BindMount;

/// In-container mount point for the per-job scratch directory.
pub const CONTAINER_TMP: &str = "/tmp_dir";
/// In-container TemplateFlow home.
pub const CONTAINER_TEMPLATEFLOW: &str = "/templateflow";
/// In-container FreeSurfer license path.
pub const CONTAINER_LICENSE: &str = "/license/license.txt";
/// In-container BIDS derivatives input.
pub const CONTAINER_INPUT: &str = "/data/input";
/// In-container output directory.
pub const CONTAINER_OUTPUT: &str = "/data/output";
/// The only analysis level this wrapper drives.
pub const ANALYSIS_LEVEL: &str = "participant";

/// A fully assembled child invocation: program, ordered argument tokens,
/// and the extra environment exported to the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl RuntimeCommand {
    /// Spawnable process builder; stdio is inherited from the launcher.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }

    /// Shell-quoted single line for logs and the invocation record.
    pub fn display_line(&self) -> String {
        let mut tokens = vec![self.program.display().to_string()];
        tokens.extend(self.args.iter().cloned());
        shell_words::join(&tokens)
    }
}

/// The five required mounts, in launch order, followed by user-supplied
/// pairs exactly as given. Colliding destinations pass through to the
/// runtime untouched; its own mount logic owns precedence.
pub fn bind_mounts(cfg: &LaunchConfig, workdir: &Path) -> Vec<BindMount> {
    let mut mounts = vec![
        BindMount::new(workdir, CONTAINER_TMP),
        BindMount::new(&cfg.templateflow, CONTAINER_TEMPLATEFLOW),
        BindMount::new(&cfg.license, CONTAINER_LICENSE),
        BindMount::new(&cfg.input, CONTAINER_INPUT),
        BindMount::new(&cfg.output, CONTAINER_OUTPUT),
    ];
    mounts.extend(cfg.extra_binds.iter().cloned());
    mounts
}

/// Build the full `singularity run` invocation for a resolved config and
/// an existing working directory.
pub fn assemble(cfg: &LaunchConfig, workdir: &Path, runtime: &Path) -> RuntimeCommand {
    let mut args: Vec<String> = vec!["run".into(), "--cleanenv".into(), "--no-home".into()];
    for mount in bind_mounts(cfg, workdir) {
        args.push("-B".into());
        args.push(mount.to_arg());
    }
    args.push(cfg.image.display().to_string());
    args.extend([
        CONTAINER_INPUT.into(),
        CONTAINER_OUTPUT.into(),
        ANALYSIS_LEVEL.into(),
    ]);

    let threads = cfg.scheduler.num_procs.to_string();
    args.extend([
        "--notrack".into(),
        "--nthreads".into(),
        threads.clone(),
        "--omp-nthreads".into(),
        threads,
        "-w".into(),
        CONTAINER_TMP.into(),
        "-v".into(),
    ]);
    // User pass-through comes last; repeated flags resolve downstream.
    args.extend(cfg.passthrough.iter().cloned());

    let mut env = vec![
        ("SINGULARITYENV_TMPDIR".to_string(), CONTAINER_TMP.to_string()),
        (
            "SINGULARITYENV_TEMPLATEFLOW_HOME".to_string(),
            CONTAINER_TEMPLATEFLOW.to_string(),
        ),
        (
            "SINGULARITYENV_FS_LICENSE".to_string(),
            CONTAINER_LICENSE.to_string(),
        ),
    ];
    env.extend(cfg.extra_env.iter().map(|p| (p.container_var(), p.value.clone())));

    RuntimeCommand {
        program: runtime.to_path_buf(),
        args,
        env,
    }
}
