//! Tool versions and their extraction from captured CLI output.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use tracing::debug;

use crate::error::{GateError, GateResult};

/// Finds the first version token in tool output.
///
/// Matches kubectl's `GitVersion:"v1.7.5-gke.1"`, istioctl's `Version: 0.2.4`
/// and the newer `Client Version: v1.28.2` / `client version: 1.20.0` lines.
/// The token must end at a quote, whitespace, `,`, `}` or end of text, so
/// `1.7.0.5` or `2.0.0rc1` never yield a truncated `1.7.0` / `2.0.0`.
static VERSION_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)version:\s*"?v?(\d+\.\d+\.\d+(?:-[0-9a-z.-]+)?(?:\+[0-9a-z.-]+)?)(?:["\s,}]|$)"#,
    )
    .unwrap()
});

/// A parsed semantic version reported by kubectl, the cluster, or istioctl.
///
/// Ordering follows semver precedence: build metadata is carried for
/// display but never takes part in comparison or equality.
#[derive(Debug, Clone)]
pub struct ToolVersion(Version);

impl ToolVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    pub fn major(&self) -> u64 {
        self.0.major
    }

    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            // semver::Prerelease orders the empty prerelease above any other.
            .then_with(|| a.pre.cmp(&b.pre))
    }
}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToolVersion {}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Version> for ToolVersion {
    fn from(version: Version) -> Self {
        Self(version)
    }
}

impl FromStr for ToolVersion {
    type Err = GateError;

    fn from_str(s: &str) -> GateResult<Self> {
        parse_version(s)
    }
}

/// Parse a version out of raw tool output or a bare version string.
///
/// The first `version:` token wins, so for kubectl's two-line report this
/// yields the client version. Text with no such token is parsed as a bare
/// `1.2.3` / `v1.2.3` version.
pub fn parse_version(raw: &str) -> GateResult<ToolVersion> {
    let token = match VERSION_TOKEN_RE.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => {
            let trimmed = raw.trim();
            trimmed.strip_prefix('v').unwrap_or(trimmed).to_string()
        }
    };

    if token.is_empty() {
        return Err(malformed(raw, "no version found"));
    }

    let version = Version::parse(&token).map_err(|e| malformed(raw, &e.to_string()))?;
    debug!(%version, "parsed tool version");
    Ok(ToolVersion(version))
}

/// Parse kubectl's `Client Version:` and `Server Version:` lines.
///
/// Both lines are required. A report without a server line (cluster
/// unreachable) is malformed rather than a partial pass.
pub fn parse_client_server(raw: &str) -> GateResult<(ToolVersion, ToolVersion)> {
    let client = find_line(raw, "client version")
        .ok_or_else(|| malformed(raw, "missing client version line"))?;
    let server = find_line(raw, "server version")
        .ok_or_else(|| malformed(raw, "missing server version line"))?;
    Ok((parse_version(client)?, parse_version(server)?))
}

fn find_line<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    raw.lines()
        .map(str::trim)
        .find(|line| line.to_ascii_lowercase().starts_with(prefix))
}

fn malformed(input: &str, reason: &str) -> GateError {
    GateError::MalformedVersion {
        input: input.trim().to_string(),
        reason: reason.to_string(),
    }
}
