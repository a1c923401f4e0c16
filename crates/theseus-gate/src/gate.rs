//! Version gates: decide whether observed tool versions are new enough.
//!
//! kubectl reports two versions (its own and the cluster's) and both must
//! satisfy the minimum. istioctl reports a single client version.

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{GateError, GateResult};
use crate::version::{ToolVersion, parse_client_server, parse_version};

/// `true` iff `observed >= required` under semver precedence.
pub fn at_least(observed: &ToolVersion, required: &ToolVersion) -> bool {
    observed >= required
}

/// `true` iff both the client and the server satisfy `required`.
pub fn check_client_server_pair(
    client: &ToolVersion,
    server: &ToolVersion,
    required: &ToolVersion,
) -> bool {
    at_least(client, required) && at_least(server, required)
}

/// The component whose version was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    KubectlClient,
    KubernetesServer,
    Istioctl,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::KubectlClient => "kubectl client",
            Tool::KubernetesServer => "kubernetes server",
            Tool::Istioctl => "istioctl",
        };
        f.write_str(name)
    }
}

/// Version input for a tool that reports a client and a server version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientServerInput {
    /// Raw stdout captured from `kubectl version`.
    Captured(String),
    /// Known versions supplied by the caller; skips output extraction.
    Override { client: String, server: String },
}

/// Version input for a tool that reports only a client version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientInput {
    /// Raw stdout captured from `istioctl version`.
    Captured(String),
    /// A known version supplied by the caller.
    Override(String),
}

/// Outcome of checking one component against its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateCheck {
    pub tool: Tool,
    pub observed: String,
    pub required: String,
    pub passed: bool,
}

/// Minimum kubectl and istioctl versions a rollout requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    kubectl: ToolVersion,
    istioctl: ToolVersion,
}

impl VersionGate {
    pub fn new(kubectl: ToolVersion, istioctl: ToolVersion) -> Self {
        Self { kubectl, istioctl }
    }

    /// Build a gate from configured minimum version strings.
    pub fn from_requirements(kubectl: &str, istioctl: &str) -> GateResult<Self> {
        Ok(Self::new(parse_version(kubectl)?, parse_version(istioctl)?))
    }

    pub fn kubectl_minimum(&self) -> &ToolVersion {
        &self.kubectl
    }

    pub fn istioctl_minimum(&self) -> &ToolVersion {
        &self.istioctl
    }

    /// Check kubectl and the cluster it talks to. Returns one entry per
    /// component; the gate passes only if every entry passed.
    pub fn check_kubectl(&self, input: &ClientServerInput) -> GateResult<Vec<GateCheck>> {
        let (client, server) = observed_pair(input)?;
        Ok(vec![
            record(Tool::KubectlClient, &client, &self.kubectl),
            record(Tool::KubernetesServer, &server, &self.kubectl),
        ])
    }

    pub fn check_istioctl(&self, input: &ClientInput) -> GateResult<GateCheck> {
        let observed = observed_client(input)?;
        Ok(record(Tool::Istioctl, &observed, &self.istioctl))
    }

    /// Like [`VersionGate::check_kubectl`] but an unsatisfied component is
    /// an error, for callers that abort the rollout with `?`.
    pub fn require_kubectl(&self, input: &ClientServerInput) -> GateResult<()> {
        let (client, server) = observed_pair(input)?;
        require(Tool::KubectlClient, client, &self.kubectl)?;
        require(Tool::KubernetesServer, server, &self.kubectl)
    }

    pub fn require_istioctl(&self, input: &ClientInput) -> GateResult<()> {
        require(Tool::Istioctl, observed_client(input)?, &self.istioctl)
    }
}

fn observed_pair(input: &ClientServerInput) -> GateResult<(ToolVersion, ToolVersion)> {
    match input {
        ClientServerInput::Captured(raw) => parse_client_server(raw),
        ClientServerInput::Override { client, server } => {
            Ok((parse_version(client)?, parse_version(server)?))
        }
    }
}

fn observed_client(input: &ClientInput) -> GateResult<ToolVersion> {
    match input {
        ClientInput::Captured(raw) | ClientInput::Override(raw) => parse_version(raw),
    }
}

fn record(tool: Tool, observed: &ToolVersion, required: &ToolVersion) -> GateCheck {
    let passed = at_least(observed, required);
    if passed {
        info!(%tool, %observed, %required, "version gate passed");
    } else {
        warn!(%tool, %observed, %required, "version gate failed");
    }
    GateCheck {
        tool,
        observed: observed.to_string(),
        required: required.to_string(),
        passed,
    }
}

fn require(tool: Tool, observed: ToolVersion, required: &ToolVersion) -> GateResult<()> {
    if at_least(&observed, required) {
        Ok(())
    } else {
        warn!(%tool, %observed, %required, "version gate failed");
        Err(GateError::Unsatisfied {
            tool,
            observed,
            required: required.clone(),
        })
    }
}
