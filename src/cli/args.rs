use clap::Parser;
use std::path::PathBuf;

use xcpd_launch::types::{BindMount, EnvPair};

fn parse_bind(s: &str) -> Result<BindMount, String> {
    s.parse()
}

fn parse_env(s: &str) -> Result<EnvPair, String> {
    s.parse()
}

/// `-c` takes `0|1` rather than acting as a boolean switch; cluster users
/// already script against that convention.
fn parse_switch(s: &str) -> Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(format!("expected 0 or 1, got '{other}'")),
    }
}

#[derive(Parser)]
#[command(
    name = "xcpd-launch",
    version,
    about = "Run the containerized xcp_d pipeline under an LSF job",
    arg_required_else_help = true
)]
pub struct CliArgs {
    /// Extra bind mounts (source:destination, comma separated)
    #[arg(short = 'B', long = "bind", value_delimiter = ',', value_parser = parse_bind)]
    pub binds: Vec<BindMount>,

    /// Remove the scratch working directory on exit (1) or keep it (0)
    #[arg(short = 'c', long = "cleanup", default_value = "1", action = clap::ArgAction::Set, value_parser = parse_switch)]
    pub cleanup: bool,

    /// Extra container environment (NAME=value, comma separated)
    #[arg(short = 'e', long = "env", value_delimiter = ',', value_parser = parse_env)]
    pub env: Vec<EnvPair>,

    /// fMRIPrep derivatives directory to postprocess
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output directory for xcp_d derivatives (created if missing)
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Host TemplateFlow directory
    #[arg(short = 't', long)]
    pub templateflow: PathBuf,

    /// Container image version (resolves containers/xcp_d-<TAG>.sif)
    #[arg(id = "version_tag", short = 'v', long = "version-tag", value_name = "TAG")]
    pub version: String,

    /// Everything after `--` is forwarded to xcp_d unchanged
    #[arg(last = true)]
    pub passthrough: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_invocation() {
        let args = CliArgs::parse_from([
            "xcpd-launch",
            "-i",
            "/data/fmriprep",
            "-o",
            "/data/xcp_d",
            "-t",
            "/tf",
            "-v",
            "0.5.0",
            "-B",
            "a:b,c:d",
            "-e",
            "X=1",
            "-c",
            "0",
            "--",
            "--smoothing",
            "6",
        ]);
        assert_eq!(args.input, PathBuf::from("/data/fmriprep"));
        assert_eq!(args.version, "0.5.0");
        assert_eq!(args.binds.len(), 2);
        assert_eq!(args.binds[1].to_arg(), "c:d");
        assert_eq!(args.env[0].name, "X");
        assert!(!args.cleanup);
        assert_eq!(args.passthrough, ["--smoothing", "6"]);
    }

    #[test]
    fn cleanup_defaults_on_and_rejects_non_switch_values() {
        let args =
            CliArgs::parse_from(["xcpd-launch", "-i", "/a", "-o", "/b", "-t", "/c", "-v", "1.0"]);
        assert!(args.cleanup);

        let err = CliArgs::try_parse_from([
            "xcpd-launch", "-i", "/a", "-o", "/b", "-t", "/c", "-v", "1.0", "-c", "yes",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn missing_flag_value_is_a_parse_error() {
        let err = CliArgs::try_parse_from(["xcpd-launch", "-i"]);
        assert!(err.is_err());
    }

    #[test]
    fn malformed_bind_pair_is_a_parse_error() {
        let err = CliArgs::try_parse_from([
            "xcpd-launch", "-i", "/a", "-o", "/b", "-t", "/c", "-v", "1.0", "-B", "nodest",
        ]);
        assert!(err.is_err());
    }
}
