use anyhow::{Context, bail};
use theseus_core::TheseusConfig;
use theseus_gate::{ClientInput, ClientServerInput, GateCheck, VersionGate};
use tracing::info;

use super::read_input;

/// Where each tool's version comes from, as given on the command line.
#[derive(Debug, Default)]
pub struct VersionSources {
    pub kubectl: Option<String>,
    pub kubectl_client: Option<String>,
    pub kubectl_server: Option<String>,
    pub istioctl: Option<String>,
    pub istioctl_client: Option<String>,
}

impl VersionSources {
    fn kubectl_input(&self) -> anyhow::Result<ClientServerInput> {
        match (&self.kubectl, &self.kubectl_client, &self.kubectl_server) {
            (_, Some(client), Some(server)) => Ok(ClientServerInput::Override {
                client: client.clone(),
                server: server.clone(),
            }),
            (Some(path), _, _) => Ok(ClientServerInput::Captured(read_input(path)?)),
            _ => bail!("no kubectl version given: pass --kubectl <file> or --kubectl-client/--kubectl-server"),
        }
    }

    fn istioctl_input(&self) -> anyhow::Result<ClientInput> {
        match (&self.istioctl, &self.istioctl_client) {
            (_, Some(client)) => Ok(ClientInput::Override(client.clone())),
            (Some(path), _) => Ok(ClientInput::Captured(read_input(path)?)),
            _ => bail!("no istioctl version given: pass --istioctl <file> or --istioctl-client"),
        }
    }
}

/// Run both gates and print the outcome. Fails if any component fails.
pub fn check(config: &TheseusConfig, sources: &VersionSources, format: &str) -> anyhow::Result<()> {
    if sources.kubectl.as_deref() == Some("-") && sources.istioctl.as_deref() == Some("-") {
        bail!("only one of --kubectl and --istioctl can read stdin");
    }

    let checks = evaluate(config, &sources.kubectl_input()?, &sources.istioctl_input()?)?;
    println!("{}", render(&checks, format)?);

    if checks.iter().all(|c| c.passed) {
        info!("all version gates passed");
        Ok(())
    } else {
        bail!("version gate failed; upgrade the tools above before rolling out")
    }
}

pub fn evaluate(
    config: &TheseusConfig,
    kubectl: &ClientServerInput,
    istioctl: &ClientInput,
) -> anyhow::Result<Vec<GateCheck>> {
    let gate = VersionGate::from_requirements(&config.versions.kubectl, &config.versions.istioctl)
        .context("invalid minimum version in configuration")?;

    let mut checks = gate.check_kubectl(kubectl).context("kubectl version")?;
    checks.push(gate.check_istioctl(istioctl).context("istioctl version")?);
    Ok(checks)
}

pub fn render(checks: &[GateCheck], format: &str) -> anyhow::Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(checks)?),
        _ => Ok(checks
            .iter()
            .map(|c| {
                let (symbol, op) = if c.passed { ("✓", ">=") } else { ("✗", "<") };
                format!("{symbol} {}: {} {op} {}", c.tool, c.observed, c.required)
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
