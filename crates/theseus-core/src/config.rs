//! `.theseus.toml` configuration parser.
//!
//! Resolution order, last one wins:
//! 1. Built-in defaults
//! 2. `--config <path>` if given, else `$HOME/.theseus.toml` if present
//! 3. `THESEUS_*` environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in `$HOME` when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = ".theseus.toml";

pub const ENV_MIN_KUBECTL: &str = "THESEUS_MIN_KUBECTL_VERSION";
pub const ENV_MIN_ISTIOCTL: &str = "THESEUS_MIN_ISTIOCTL_VERSION";
pub const ENV_TAG_NAME: &str = "THESEUS_TAG_NAME";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TheseusConfig {
    pub versions: VersionRequirements,
    pub rollout: RolloutDefaults,
}

/// Minimum tool versions required before any rollout step runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionRequirements {
    /// Applies to both the kubectl client and the cluster it reports.
    pub kubectl: String,
    pub istioctl: String,
}

impl Default for VersionRequirements {
    fn default() -> Self {
        Self {
            kubectl: "1.7.0".to_string(),
            istioctl: "0.2.4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutDefaults {
    /// Pod label key that carries the version tag (`version: v2`).
    pub tag_name: String,
    /// Precedence for generated rules. When unset, generated rules take
    /// the current highest precedence plus one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_precedence: Option<u32>,
}

impl Default for RolloutDefaults {
    fn default() -> Self {
        Self {
            tag_name: "version".to_string(),
            default_precedence: None,
        }
    }
}

impl TheseusConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: TheseusConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load the configuration the way the CLI does, reading the process
    /// environment for `$HOME` and the `THESEUS_*` overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`TheseusConfig::load`] with an injectable environment lookup.
    pub fn load_with<F>(explicit: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_path(&env) {
                Some(path) if path.is_file() => {
                    debug!(path = %path.display(), "using config file");
                    Self::from_file(&path)?
                }
                _ => Self::default(),
            },
        };
        config.apply_env(env);
        Ok(config)
    }

    /// Overlay `THESEUS_*` variables onto the loaded values.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = non_empty(env(ENV_MIN_KUBECTL)) {
            debug!(value = %v, "kubectl minimum version from environment");
            self.versions.kubectl = v;
        }
        if let Some(v) = non_empty(env(ENV_MIN_ISTIOCTL)) {
            debug!(value = %v, "istioctl minimum version from environment");
            self.versions.istioctl = v;
        }
        if let Some(v) = non_empty(env(ENV_TAG_NAME)) {
            self.rollout.tag_name = v;
        }
    }
}

fn default_path<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(env("HOME")).map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TheseusConfig::default();
        assert_eq!(config.versions.kubectl, "1.7.0");
        assert_eq!(config.versions.istioctl, "0.2.4");
        assert_eq!(config.rollout.tag_name, "version");
        assert!(config.rollout.default_precedence.is_none());
    }

    #[test]
    fn test_parse_partial() {
        let toml_str = r#"
[versions]
istioctl = "0.3.0"
"#;
        let config: TheseusConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.versions.istioctl, "0.3.0");
        assert_eq!(config.versions.kubectl, "1.7.0");
        assert_eq!(config.rollout.tag_name, "version");
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut config = TheseusConfig::default();
        config.rollout.default_precedence = Some(10);
        let toml_str = config.to_toml_string().unwrap();
        assert!(toml_str.contains("default_precedence = 10"));
        let back: TheseusConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theseus.toml");
        std::fs::write(&path, "[versions]\nkubectl = \"1.8.0\"\nistioctl = \"0.2.7\"\n").unwrap();

        let env = env_from(&[(ENV_MIN_KUBECTL, "1.9.0"), (ENV_TAG_NAME, "track")]);
        let config = TheseusConfig::load_with(Some(&path), env).unwrap();

        assert_eq!(config.versions.kubectl, "1.9.0");
        assert_eq!(config.versions.istioctl, "0.2.7");
        assert_eq!(config.rollout.tag_name, "track");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let env = env_from(&[(ENV_MIN_ISTIOCTL, "  ")]);
        let mut config = TheseusConfig::default();
        config.apply_env(env);
        assert_eq!(config.versions.istioctl, "0.2.4");
    }

    #[test]
    fn test_home_config_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[rollout]\ntag_name = \"release\"\n",
        )
        .unwrap();

        let home = dir.path().to_string_lossy().to_string();
        let config = TheseusConfig::load_with(None, env_from(&[("HOME", home.as_str())])).unwrap();
        assert_eq!(config.rollout.tag_name, "release");
    }

    #[test]
    fn test_missing_home_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().to_string_lossy().to_string();
        let config = TheseusConfig::load_with(None, env_from(&[("HOME", home.as_str())])).unwrap();
        assert_eq!(config, TheseusConfig::default());
    }

    #[test]
    fn test_explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = TheseusConfig::load_with(Some(&path), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
