//! Crate-level error type and `Result` alias for stable, structured error
//! handling. Groups failures into argument, missing-resource, environment,
//! and spawn classes, each with a distinct process exit code.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("{var} is not set; xcpd-launch must run inside an LSF job (bsub)")]
    OutsideSchedulerJob { var: &'static str },

    #[error("Scheduler variable {var} has unusable value '{value}'")]
    BadSchedulerValue { var: &'static str, value: String },

    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: PathBuf },

    #[error("No container runtime on PATH (tried: {tried})")]
    RuntimeNotFound { tried: String },

    #[error("Cannot create {what} {path}: {source}")]
    Create {
        what: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    /// Exit code for this failure class. Informative only; callers should
    /// treat any nonzero status as failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument { .. } => 2,
            Error::OutsideSchedulerJob { .. }
            | Error::BadSchedulerValue { .. }
            | Error::NotFound { .. }
            | Error::RuntimeNotFound { .. } => 3,
            Error::Create { .. } | Error::Io(_) | Error::External(_) => 4,
            Error::Spawn { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_nonzero_and_distinct_per_class() {
        let config = Error::InvalidArgument {
            arg: "version-tag",
            value: String::new(),
        };
        let resource = Error::NotFound {
            what: "container image",
            path: PathBuf::from("/nowhere.sif"),
        };
        let environment = Error::Create {
            what: "working directory",
            path: PathBuf::from("/scratch"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        let spawn = Error::Spawn {
            program: "singularity".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        let codes = [
            config.exit_code(),
            resource.exit_code(),
            environment.exit_code(),
            spawn.exit_code(),
        ];
        assert!(codes.iter().all(|c| *c != 0));
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn scheduler_errors_share_the_missing_resource_class() {
        let outside = Error::OutsideSchedulerJob { var: "LSB_JOBID" };
        let missing = Error::NotFound {
            what: "input directory",
            path: PathBuf::from("/data"),
        };
        assert_eq!(outside.exit_code(), missing.exit_code());
    }
}
