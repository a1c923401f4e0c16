//! Canary strategy: which pods receive test traffic, and how much.

use regex::Regex;

use crate::error::{RolloutError, RolloutResult};

/// Selects the requests routed to the canary by matching one header.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HeaderSelector {
    /// Any header against an inclusion regex.
    Header { name: String, regex: String },
    /// Shorthand for `Header { name: "cookie", .. }`.
    Cookie(String),
    /// Shorthand for `Header { name: "user-agent", .. }`.
    UserAgent(String),
}

impl HeaderSelector {
    pub fn header_name(&self) -> &str {
        match self {
            HeaderSelector::Header { name, .. } => name,
            HeaderSelector::Cookie(_) => "cookie",
            HeaderSelector::UserAgent(_) => "user-agent",
        }
    }

    pub fn regex(&self) -> &str {
        match self {
            HeaderSelector::Header { regex, .. }
            | HeaderSelector::Cookie(regex)
            | HeaderSelector::UserAgent(regex) => regex,
        }
    }
}

/// Configuration for a canary step.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CanaryConfig {
    /// Label value of the pods to route to (e.g. `v2`).
    pub tag: String,
    /// Label key carrying the tag. Default `version`.
    pub tag_name: String,
    /// Percentage of selected traffic sent to the tag. `None` means all.
    pub weight: Option<u32>,
    /// Precedence of the generated rule. `None` means one above the
    /// currently active rule.
    pub precedence: Option<u32>,
    /// Rule name. `None` means `<destination>-test-<tag>`.
    pub name: Option<String>,
    pub selector: Option<HeaderSelector>,
}

impl CanaryConfig {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            tag_name: "version".to_string(),
            weight: None,
            precedence: None,
            name: None,
            selector: None,
        }
    }

    pub fn validate(&self) -> RolloutResult<()> {
        if self.tag.trim().is_empty() {
            return Err(RolloutError::InvalidConfig("tag is required".to_string()));
        }
        if self.tag_name.trim().is_empty() {
            return Err(RolloutError::InvalidConfig("tag name is empty".to_string()));
        }
        if let Some(weight) = self.weight {
            if !(1..=100).contains(&weight) {
                return Err(RolloutError::InvalidConfig(format!(
                    "weight must be between 1 and 100, got {weight}"
                )));
            }
        }
        if let Some(selector) = &self.selector {
            if selector.header_name().trim().is_empty() {
                return Err(RolloutError::InvalidConfig("header name is empty".to_string()));
            }
            Regex::new(selector.regex()).map_err(|e| {
                RolloutError::InvalidConfig(format!(
                    "invalid regex for header '{}': {e}",
                    selector.header_name()
                ))
            })?;
        }
        Ok(())
    }
}
