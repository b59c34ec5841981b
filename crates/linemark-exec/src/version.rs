//! Backend version detection.

use std::fmt;

use crate::dispatcher::{Dispatcher, RunOptions};
use crate::traits::ProcessInvoker;

/// A parsed `major.minor.patch` version of the backend program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackendVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl BackendVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Whether this version is at least `major.minor`.
    #[must_use]
    pub const fn at_least(&self, major: u32, minor: u32) -> bool {
        self.major > major || (self.major == major && self.minor >= minor)
    }

    /// Parse the first version-looking token of a `--version` banner,
    /// e.g. `git version 2.43.0` or `git version 2.39.3 (Apple Git-146)`.
    #[must_use]
    pub fn parse(banner: &str) -> Option<Self> {
        banner
            .split_whitespace()
            .filter(|token| token.starts_with(|c: char| c.is_ascii_digit()))
            .find_map(Self::parse_token)
    }

    fn parse_token(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let major = leading_number(parts.next()?)?;
        let minor = leading_number(parts.next()?)?;
        let patch = parts.next().and_then(leading_number).unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }

    /// Run `program --version` and parse its first line.
    ///
    /// The result is meant to be held by whichever component needs it; there
    /// is no process-wide cache.
    pub async fn detect<I: ProcessInvoker>(
        dispatcher: &Dispatcher<I>,
        program: &str,
    ) -> Option<Self> {
        let out = dispatcher
            .run_lines(program, &["--version".to_string()], &RunOptions::new())
            .await;
        let version = out.value.first().and_then(|line| Self::parse(line));
        if version.is_none() {
            tracing::warn!(program, "unable to determine backend version");
        }
        version
    }
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

impl fmt::Display for BackendVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
