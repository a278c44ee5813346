use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use xcpd_launch::core::command::{self, RuntimeCommand};
use xcpd_launch::core::config::{LaunchConfig, LaunchOptions};
use xcpd_launch::core::workdir::{Disposal, JobWorkdir};
use xcpd_launch::error::Result;
use xcpd_launch::exec::{self, Outcome, signal};
use xcpd_launch::record::InvocationRecord;

use super::args::CliArgs;

/// Top-level orchestration; returns the process exit code.
pub fn run(args: CliArgs) -> i32 {
    init_logging();

    if let Err(e) = signal::install() {
        error!("Cannot install signal handlers: {e}");
        return e.exit_code();
    }

    match launch(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn launch(args: CliArgs) -> Result<i32> {
    let cfg = LaunchConfig::resolve(LaunchOptions {
        input: args.input,
        output: args.output,
        templateflow: args.templateflow,
        version: args.version,
        binds: args.binds,
        env: args.env,
        cleanup: args.cleanup,
        passthrough: args.passthrough,
    })?;

    cfg.validate()?;
    let runtime = exec::locate_runtime()?;
    cfg.ensure_output_dir()?;

    // Everything the run depends on exists; acquire the scratch directory
    // and assemble the invocation against it.
    let workdir = JobWorkdir::create(&cfg.scratch_root, &cfg.scheduler.job_id, !cfg.cleanup)?;
    let invocation = command::assemble(&cfg, workdir.path(), &runtime);

    summarize(&cfg, &workdir, &invocation);

    match InvocationRecord::new(&cfg, workdir.path(), &invocation).write(&cfg.output) {
        Ok(path) => info!("Invocation record: {}", path.display()),
        Err(e) => warn!("Could not write invocation record: {e}"),
    }

    // Run the child, then dispose of the workdir before acting on the
    // outcome. Interrupts surface as an Outcome, never as an early exit,
    // so this line is reached on every path short of a panic (where the
    // workdir's Drop takes over).
    let outcome = exec::supervise(&invocation);
    finalize(workdir);
    let outcome = outcome?;

    match outcome {
        Outcome::Interrupted(sig) => {
            info!("Interrupted ({sig}); working directory handled, re-raising");
            signal::reraise(sig)
        }
        Outcome::Exited(0) => info!("xcp_d finished successfully"),
        Outcome::Exited(code) => error!("xcp_d exited with code {code}"),
        Outcome::Signaled(sig) => error!("xcp_d was killed by signal {sig}"),
    }
    Ok(outcome.exit_code())
}

fn summarize(cfg: &LaunchConfig, workdir: &JobWorkdir, invocation: &RuntimeCommand) {
    info!(
        "Job {} on {} processors",
        cfg.scheduler.job_id, cfg.scheduler.num_procs
    );
    info!("Input:        {}", cfg.input.display());
    info!("Output:       {}", cfg.output.display());
    info!("TemplateFlow: {}", cfg.templateflow.display());
    info!("Image:        {}", cfg.image.display());
    info!(
        "Workdir:      {} (cleanup {})",
        workdir.path().display(),
        if cfg.cleanup { "on" } else { "off" }
    );
    for mount in command::bind_mounts(cfg, workdir.path()) {
        info!("Bind:         {mount}");
    }
    info!("Command:      {}", invocation.display_line());
}

fn finalize(workdir: JobWorkdir) {
    match workdir.finalize() {
        Ok(Disposal::Removed(path)) => info!("Removed working directory {}", path.display()),
        Ok(Disposal::Kept(path)) => info!("Keeping working directory {}", path.display()),
        Err(e) => warn!("Could not remove working directory: {e}"),
    }
}
