//! Container-runtime discovery and synchronous child supervision.
pub mod signal;

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::core::command::RuntimeCommand;
use crate::error::{Error, Result};

/// Runtimes probed, in order of preference. Clusters renamed the project
/// mid-life; wrappers of this era must accept either binary.
const RUNTIME_CANDIDATES: &[&str] = &["singularity", "apptainer"];

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Find a working container runtime by probing `--version` with stdio
/// suppressed.
pub fn locate_runtime() -> Result<PathBuf> {
    locate_runtime_from(RUNTIME_CANDIDATES)
}

fn locate_runtime_from(candidates: &[&str]) -> Result<PathBuf> {
    for name in candidates {
        let probe = std::process::Command::new(name)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Ok(status) = probe
            && status.success()
        {
            return Ok(PathBuf::from(name));
        }
        debug!("runtime probe failed: {name}");
    }
    Err(Error::RuntimeNotFound {
        tried: candidates.join(", "),
    })
}

/// Terminal state of the supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Child exited on its own with this code.
    Exited(i32),
    /// Child was killed by this signal.
    Signaled(i32),
    /// The launcher received this signal and terminated the child.
    Interrupted(nix::sys::signal::Signal),
}

impl Outcome {
    /// Shell-convention process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Exited(code) => code,
            Outcome::Signaled(sig) => 128 + sig,
            Outcome::Interrupted(sig) => 128 + sig as i32,
        }
    }
}

/// Run the child to completion, watching for deferred interrupts between
/// polls.
///
/// An interrupt never aborts the launcher here: the child is killed (it
/// usually already received the same signal from the terminal or the
/// scheduler) and the outcome is returned, so the caller can release the
/// working directory before the signal is re-raised.
pub fn supervise(cmd: &RuntimeCommand) -> Result<Outcome> {
    let mut child = cmd.to_command().spawn().map_err(|source| Error::Spawn {
        program: cmd.program.display().to_string(),
        source,
    })?;

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(outcome_of(status));
        }
        if let Some(sig) = signal::pending() {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(Outcome::Interrupted(sig));
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn outcome_of(status: ExitStatus) -> Outcome {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => Outcome::Exited(code),
        None => Outcome::Signaled(status.signal().unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_runtime_is_reported_with_candidates() {
        let err = locate_runtime_from(&["xcpd-launch-no-such-runtime"]).unwrap_err();
        match err {
            Error::RuntimeNotFound { tried } => {
                assert_eq!(tried, "xcpd-launch-no-such-runtime")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn outcome_exit_codes_follow_shell_convention() {
        assert_eq!(Outcome::Exited(0).exit_code(), 0);
        assert_eq!(Outcome::Exited(3).exit_code(), 3);
        assert_eq!(Outcome::Signaled(9).exit_code(), 137);
        assert_eq!(
            Outcome::Interrupted(nix::sys::signal::Signal::SIGINT).exit_code(),
            130
        );
    }

    #[test]
    fn supervise_reports_child_exit_codes() {
        let ok = RuntimeCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 0".into()],
            env: vec![],
        };
        assert_eq!(supervise(&ok).unwrap(), Outcome::Exited(0));

        let failing = RuntimeCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 7".into()],
            env: vec![],
        };
        assert_eq!(supervise(&failing).unwrap(), Outcome::Exited(7));
    }

    #[test]
    fn supervise_exports_the_command_environment() {
        let cmd = RuntimeCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "test \"$PROBE\" = yes".into()],
            env: vec![("PROBE".into(), "yes".into())],
        };
        assert_eq!(supervise(&cmd).unwrap(), Outcome::Exited(0));
    }

    #[test]
    fn spawn_failure_is_its_own_class() {
        let cmd = RuntimeCommand {
            program: "/no/such/binary".into(),
            args: vec![],
            env: vec![],
        };
        let err = supervise(&cmd).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert_eq!(err.exit_code(), 5);
    }
}
