//! Rollout planning: read the live step from the deployed rules and
//! generate the rule for the next step.
//!
//! The active rule (highest precedence for the destination) decides the
//! step. A generated rule lands one precedence above it unless the
//! config pins a precedence, so applying it makes it the active rule.

use tracing::{debug, info};

use theseus_rules::{DestinationWeight, RouteRule, RuleSet, StringMatch};

use crate::error::{RolloutError, RolloutResult};
use crate::strategy::CanaryConfig;

/// Where a rollout stands, judged from the active route rule.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RolloutStep {
    /// The active rule sends nothing to the tag.
    NotStarted,
    /// Only requests matching a header reach the tag.
    Safe { header: String, percent: u32 },
    /// A share of all traffic reaches the tag.
    Weighted { percent: u32 },
    /// All traffic reaches the tag.
    Full,
}

impl RolloutStep {
    pub fn label(&self) -> &'static str {
        match self {
            RolloutStep::NotStarted => "NOT STARTED",
            RolloutStep::Safe { .. } => "SAFE",
            RolloutStep::Weighted { .. } => "WEIGHTED",
            RolloutStep::Full => "FULL",
        }
    }
}

/// Determine the rollout step for `tag_name=tag` from the deployed rules.
pub fn detect_step(rules: &RuleSet, tag_name: &str, tag: &str) -> RolloutResult<RolloutStep> {
    let active = rules.active()?;
    let percent = active.traffic_share(tag_name, tag);

    let step = if percent == 0 {
        RolloutStep::NotStarted
    } else if let Some(m) = active.header_match() {
        RolloutStep::Safe {
            header: m.header.to_string(),
            percent,
        }
    } else if percent >= 100 {
        RolloutStep::Full
    } else {
        RolloutStep::Weighted { percent }
    };

    debug!(rule = active.name(), tag, step = step.label(), "detected rollout step");
    Ok(step)
}

/// Generate the route rule that moves `rules`' destination to the next
/// canary step described by `cfg`.
///
/// Traffic not sent to the tag keeps going to the active rule's other
/// targets, in proportion to their current weights.
pub fn generate_rule(rules: &RuleSet, cfg: &CanaryConfig) -> RolloutResult<RouteRule> {
    cfg.validate()?;
    let destination = rules.destination()?.clone();
    let active = rules.active()?;

    let precedence = match cfg.precedence {
        Some(p) => p,
        None => active.precedence().checked_add(1).ok_or_else(|| {
            RolloutError::InvalidConfig(format!(
                "active rule '{}' already has the maximum precedence",
                active.name()
            ))
        })?,
    };

    let name = cfg
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-test-{}", destination.name, cfg.tag));

    let weight = cfg.weight.unwrap_or(100);
    let route = if weight == 100 {
        vec![DestinationWeight::labelled(&cfg.tag_name, &cfg.tag, None)]
    } else {
        let mut route = vec![DestinationWeight::labelled(&cfg.tag_name, &cfg.tag, Some(weight))];
        route.extend(remaining_targets(active, cfg, 100 - weight)?);
        route
    };

    let mut rule = RouteRule::new(name, destination, precedence).with_route(route);
    rule.metadata.namespace = active.metadata.namespace.clone();
    if let Some(selector) = &cfg.selector {
        rule = rule.with_header(selector.header_name(), StringMatch::regex(selector.regex()));
    }

    info!(
        rule = rule.name(),
        destination = %rule.destination(),
        precedence,
        tag = %cfg.tag,
        weight,
        "generated route rule"
    );
    Ok(rule)
}

/// Spread `remaining` percent over the active rule's non-tag targets.
fn remaining_targets(
    active: &RouteRule,
    cfg: &CanaryConfig,
    remaining: u32,
) -> RolloutResult<Vec<DestinationWeight>> {
    let previous: Vec<&DestinationWeight> = active
        .spec
        .route
        .iter()
        .filter(|t| t.labels.get(&cfg.tag_name) != Some(&cfg.tag))
        .collect();

    let weights: Vec<u64> = match previous.as_slice() {
        [only] => vec![u64::from(only.weight.unwrap_or(100))],
        many => many.iter().map(|t| u64::from(t.weight.unwrap_or(0))).collect(),
    };
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Err(RolloutError::TrafficSplit(format!(
            "active rule '{}' has no other weighted target to keep {remaining}% of traffic",
            active.name()
        )));
    }

    // Each share is at most `remaining`, so it fits back into u32.
    let mut shares: Vec<u32> = weights
        .iter()
        .map(|w| (w * u64::from(remaining) / total) as u32)
        .collect();
    let assigned: u32 = shares.iter().sum();
    shares[0] += remaining - assigned;

    Ok(previous
        .into_iter()
        .zip(shares)
        .filter(|(_, share)| *share > 0)
        .map(|(target, share)| DestinationWeight {
            labels: target.labels.clone(),
            weight: Some(share),
        })
        .collect())
}
