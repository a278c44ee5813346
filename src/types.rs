//! Shared value types used across xcpd-launch.
//! Includes `BindMount` (host path mapped into the container namespace)
//! and `EnvPair` (NAME=value forwarded into the container environment).
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A host path mapped into the container's filesystem namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    pub source: PathBuf,
    pub target: String,
}

impl BindMount {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Token form accepted by the runtime's `-B` flag.
    pub fn to_arg(&self) -> String {
        format!("{}:{}", self.source.display(), self.target)
    }
}

impl FromStr for BindMount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, target) = s
            .split_once(':')
            .ok_or_else(|| format!("expected source:destination, got '{s}'"))?;
        if source.is_empty() || target.is_empty() {
            return Err(format!("expected source:destination, got '{s}'"));
        }
        Ok(Self {
            source: PathBuf::from(source),
            target: target.to_string(),
        })
    }
}

impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.display(), self.target)
    }
}

/// A NAME=value pair exported to the container environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvPair {
    pub name: String,
    pub value: String,
}

impl EnvPair {
    /// Variable name as seen by the runtime: with a clean environment only
    /// `SINGULARITYENV_`-prefixed variables cross into the container.
    pub fn container_var(&self) -> String {
        format!("SINGULARITYENV_{}", self.name)
    }
}

impl FromStr for EnvPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=value, got '{s}'"))?;
        if name.is_empty() {
            return Err(format!("expected NAME=value, got '{s}'"));
        }
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for EnvPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
