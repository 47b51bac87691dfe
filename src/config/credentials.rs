// src/config/credentials.rs

use std::fmt;
use std::path::Path;

use crate::errors::{DockyardError, Result};
use crate::fs::FileSystem;

/// Registry login read from the credentials file.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Parse `user password` from the first line of `contents`.
    pub fn parse(contents: &str) -> Option<Self> {
        let line = contents.lines().next()?;
        let mut parts = line.split_whitespace();
        let user = parts.next()?;
        let password = parts.next()?;
        Some(Self {
            user: user.to_string(),
            password: password.to_string(),
        })
    }
}

pub fn read_credentials(fs: &dyn FileSystem, path: &Path) -> Result<Credentials> {
    let contents = fs.read_to_string(path).map_err(|e| {
        DockyardError::ConfigError(format!(
            "cannot read credentials file {}: {:#}",
            path.display(),
            e
        ))
    })?;

    Credentials::parse(&contents).ok_or_else(|| {
        DockyardError::ConfigError(format!(
            "credentials file {} must start with a `user password` line",
            path.display()
        ))
    })
}
