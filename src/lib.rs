#![doc = r#"
xcpd-launch — run the containerized xcp_d pipeline under an LSF job.

This crate backs the `xcpd-launch` CLI: it resolves a launch configuration
from flags and the scheduler environment, validates every path the run
depends on, assembles the Singularity/Apptainer invocation as a typed token
list, and supervises the child with a scoped scratch working directory.
The working directory is released on every exit path, including error and
interrupt, unless the caller opts out.

Quick start: assemble and run a launch
--------------------------------------
```rust,no_run
use xcpd_launch::{JobWorkdir, LaunchConfig, LaunchOptions, assemble, locate_runtime, supervise};

fn main() -> xcpd_launch::Result<()> {
    let cfg = LaunchConfig::resolve(LaunchOptions {
        input: "/data/fmriprep".into(),
        output: "/data/xcp_d".into(),
        templateflow: "/home/user/.templateflow".into(),
        version: "0.5.0".into(),
        cleanup: true,
        ..Default::default()
    })?;
    cfg.validate()?;
    let runtime = locate_runtime()?;
    cfg.ensure_output_dir()?;

    let workdir = JobWorkdir::create(&cfg.scratch_root, &cfg.scheduler.job_id, !cfg.cleanup)?;
    let command = assemble(&cfg, workdir.path(), &runtime);
    let outcome = supervise(&command)?;
    workdir.finalize()?;
    std::process::exit(outcome.exit_code());
}
```

Error handling
--------------
All public functions return `xcpd_launch::Result<T>`; `Error::exit_code`
maps each failure class to a distinct nonzero process status.

Useful modules
--------------
- [`core`] — configuration resolution, command assembly, working directory.
- [`exec`] — runtime discovery, child supervision, deferred signals.
- [`record`] — the JSON invocation record written next to the outputs.
- [`types`] — `BindMount` and `EnvPair` value types.
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod core;
pub mod error;
pub mod exec;
pub mod record;
pub mod types;

// Curated public API surface
pub use core::command::{RuntimeCommand, assemble, bind_mounts};
pub use core::config::{LaunchConfig, LaunchOptions, SchedulerContext};
pub use core::workdir::{Disposal, JobWorkdir};
pub use error::{Error, Result};
pub use exec::{Outcome, locate_runtime, supervise};
pub use record::InvocationRecord;
pub use types::{BindMount, EnvPair};
