use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::Deserialize;

/// Boxed, sendable future used by the pluggable backends
/// (`ContainerEngine`, `VersionControl`, `JobBackend`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Image architectures the builder knows how to tell apart.
///
/// The string forms are the ones used in image tags and in `FROM` lines of
/// arch-specific dockerfiles (`amd64/debian`, `arm64v8/alpine`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64v8,
    Arm32v7,
    Unknown,
}

impl Arch {
    /// Architectures that can appear in a dockerfile `FROM` line, in the
    /// order they are scanned for.
    pub const KNOWN: [Arch; 3] = [Arch::Amd64, Arch::Arm64v8, Arch::Arm32v7];

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64v8 => "arm64v8",
            Arch::Arm32v7 => "arm32v7",
            Arch::Unknown => "unknown",
        }
    }

    /// Map a machine name (`uname -m` or `std::env::consts::ARCH`) to an arch.
    pub fn from_machine(machine: &str) -> Arch {
        match machine.trim().to_lowercase().as_str() {
            "x86_64" | "amd64" => Arch::Amd64,
            "aarch64" | "arm64" => Arch::Arm64v8,
            "armv7l" | "armv7" | "arm" => Arch::Arm32v7,
            _ => Arch::Unknown,
        }
    }

    /// Architecture of the host this process runs on.
    pub fn detect() -> Arch {
        Arch::from_machine(std::env::consts::ARCH)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amd64" => Ok(Arch::Amd64),
            "arm64v8" => Ok(Arch::Arm64v8),
            "arm32v7" => Ok(Arch::Arm32v7),
            other => Err(format!(
                "invalid architecture: {other} (expected \"amd64\", \"arm64v8\" or \"arm32v7\")"
            )),
        }
    }
}

/// What changed in a repository during this run's sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeResult {
    /// Fresh clone: there is no baseline, so everything counts as changed.
    Unknown,
    /// Paths (relative to the repository root) touched by the pull.
    Files(BTreeSet<String>),
}

impl ChangeResult {
    pub fn files<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChangeResult::Files(paths.into_iter().map(Into::into).collect())
    }

    pub fn unchanged() -> Self {
        ChangeResult::Files(BTreeSet::new())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ChangeResult::Unknown)
    }

    /// Whether `path` is known to have changed. Always false for `Unknown`.
    pub fn contains(&self, path: &str) -> bool {
        match self {
            ChangeResult::Unknown => false,
            ChangeResult::Files(files) => files.contains(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_names_map_to_arches() {
        assert_eq!(Arch::from_machine("x86_64"), Arch::Amd64);
        assert_eq!(Arch::from_machine("aarch64"), Arch::Arm64v8);
        assert_eq!(Arch::from_machine("armv7l"), Arch::Arm32v7);
        assert_eq!(Arch::from_machine("riscv64"), Arch::Unknown);
    }

    #[test]
    fn unknown_changes_contain_nothing_explicitly() {
        assert!(!ChangeResult::Unknown.contains("Dockerfile"));
        assert!(ChangeResult::files(["Dockerfile"]).contains("Dockerfile"));
    }
}
