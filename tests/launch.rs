//! End-to-end launch assembly against a real (temporary) filesystem:
//! resolved config -> validation -> working directory -> command tokens
//! -> disposal. The container runtime itself is not exercised here.
use std::fs;
use std::path::Path;

use xcpd_launch::core::command;
use xcpd_launch::core::config::{LaunchConfig, SchedulerContext};
use xcpd_launch::core::workdir::{Disposal, JobWorkdir};
use xcpd_launch::error::Error;
use xcpd_launch::types::BindMount;

struct Fixture {
    root: tempfile::TempDir,
    cfg: LaunchConfig,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let base = root.path();

    let containers = base.join("containers");
    fs::create_dir_all(&containers).unwrap();
    fs::write(containers.join("xcp_d-0.5.0.sif"), b"sif").unwrap();
    fs::write(containers.join("license.txt"), b"license").unwrap();

    let input = base.join("fmriprep");
    let templateflow = base.join("templateflow");
    let scratch = base.join("scratch");
    for dir in [&input, &templateflow, &scratch] {
        fs::create_dir_all(dir).unwrap();
    }

    let cfg = LaunchConfig {
        output: base.join("xcp_d"),
        image: containers.join("xcp_d-0.5.0.sif"),
        license: containers.join("license.txt"),
        input,
        templateflow,
        version: "0.5.0".into(),
        extra_binds: vec![],
        extra_env: vec![],
        cleanup: true,
        passthrough: vec![],
        scheduler: SchedulerContext {
            job_id: "981234".into(),
            num_procs: 4,
        },
        scratch_root: scratch,
    };
    Fixture { root, cfg }
}

fn dir_entries(path: &Path) -> Vec<String> {
    fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn successful_launch_path_creates_then_removes_exactly_one_workdir() {
    let fx = fixture();
    fx.cfg.validate().unwrap();
    fx.cfg.ensure_output_dir().unwrap();
    assert!(fx.cfg.output.is_dir());

    let workdir = JobWorkdir::create(
        &fx.cfg.scratch_root,
        &fx.cfg.scheduler.job_id,
        !fx.cfg.cleanup,
    )
    .unwrap();
    assert_eq!(dir_entries(&fx.cfg.scratch_root).len(), 1);

    let invocation = command::assemble(&fx.cfg, workdir.path(), Path::new("singularity"));
    assert_eq!(invocation.args[0], "run");

    match workdir.finalize().unwrap() {
        Disposal::Removed(_) => {}
        other => panic!("expected removal, got {other:?}"),
    }
    assert!(dir_entries(&fx.cfg.scratch_root).is_empty());
}

#[test]
fn disabled_cleanup_keeps_the_workdir_and_reports_its_path() {
    let mut fx = fixture();
    fx.cfg.cleanup = false;

    let workdir = JobWorkdir::create(
        &fx.cfg.scratch_root,
        &fx.cfg.scheduler.job_id,
        !fx.cfg.cleanup,
    )
    .unwrap();
    let kept = match workdir.finalize().unwrap() {
        Disposal::Kept(path) => path,
        other => panic!("expected keep, got {other:?}"),
    };
    assert!(kept.is_dir());
    assert!(kept.starts_with(&fx.cfg.scratch_root));
}

#[test]
fn missing_image_fails_validation_before_any_workdir_exists() {
    let fx = fixture();
    let mut cfg = fx.cfg.clone();
    cfg.image = fx.root.path().join("containers").join("xcp_d-9.9.9.sif");

    let err = cfg.validate().unwrap_err();
    assert!(matches!(
        err,
        Error::NotFound {
            what: "container image",
            ..
        }
    ));
    // Validation is the gate: nothing was created under the scratch root.
    assert!(dir_entries(&cfg.scratch_root).is_empty());
    assert!(!cfg.output.exists());
}

#[test]
fn assembled_command_honors_mount_order_and_thread_flags() {
    let mut fx = fixture();
    fx.cfg.extra_binds = vec![
        "a:b".parse::<BindMount>().unwrap(),
        "c:d".parse::<BindMount>().unwrap(),
    ];
    fx.cfg.passthrough = vec!["--dummy-scans".into(), "5".into()];

    let workdir = fx.root.path().join("scratch").join("xcp_d.981234.fixed");
    fs::create_dir_all(&workdir).unwrap();
    let invocation = command::assemble(&fx.cfg, &workdir, Path::new("apptainer"));

    // All `-B` values, in the order they will reach the runtime.
    let binds: Vec<&str> = invocation
        .args
        .iter()
        .enumerate()
        .filter(|(_, a)| *a == "-B")
        .map(|(i, _)| invocation.args[i + 1].as_str())
        .collect();
    assert_eq!(binds.len(), 7);
    assert!(binds[0].ends_with(":/tmp_dir"));
    assert!(binds[1].ends_with(":/templateflow"));
    assert!(binds[2].ends_with(":/license/license.txt"));
    assert!(binds[3].ends_with(":/data/input"));
    assert!(binds[4].ends_with(":/data/output"));
    assert_eq!(binds[5], "a:b");
    assert_eq!(binds[6], "c:d");

    let nthreads = invocation
        .args
        .iter()
        .position(|a| a == "--nthreads")
        .unwrap();
    assert_eq!(invocation.args[nthreads + 1], "4");
    let omp = invocation
        .args
        .iter()
        .position(|a| a == "--omp-nthreads")
        .unwrap();
    assert_eq!(invocation.args[omp + 1], "4");

    let tail = &invocation.args[invocation.args.len() - 2..];
    assert_eq!(tail, ["--dummy-scans", "5"]);
}
