//! Precedence resolution over the rules deployed for one destination.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::{RuleError, RuleResult};
use crate::rule::{Destination, RouteRule, parse_route_rules};

/// Check that `rules` is non-empty, shares a single destination and
/// names each rule once.
///
/// A set spanning destinations means the caller grouped the wrong rules
/// together, so it is rejected outright rather than split per destination.
/// Two rules with the same name and namespace would tie under
/// [`RouteRule::precedence_order`], so they are rejected too.
fn shared_destination(rules: &[RouteRule]) -> RuleResult<&Destination> {
    let (first, rest) = rules.split_first().ok_or(RuleError::EmptySet)?;
    let expected = first.destination();
    if let Some(other) = rest.iter().find(|r| r.destination() != expected) {
        warn!(
            expected = %expected,
            found = %other.destination(),
            rule = other.name(),
            "route rule destinations do not match"
        );
        return Err(RuleError::MixedDestinations {
            expected: expected.clone(),
            found: other.destination().clone(),
        });
    }

    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        let key = (rule.metadata.name.as_str(), rule.metadata.namespace.as_deref());
        if !seen.insert(key) {
            warn!(rule = rule.name(), "duplicate route rule");
            return Err(RuleError::MalformedRule(match key.1 {
                Some(ns) => format!("duplicate route rule '{}' in namespace '{ns}'", key.0),
                None => format!("duplicate route rule '{}'", key.0),
            }));
        }
    }
    Ok(expected)
}

/// The rule currently in force: highest precedence, ties by name.
pub fn highest_precedence(rules: &[RouteRule]) -> RuleResult<&RouteRule> {
    shared_destination(rules)?;
    let active = rules
        .iter()
        .min_by(|a, b| a.precedence_order(b))
        .ok_or(RuleError::EmptySet)?;
    debug!(
        rule = active.name(),
        precedence = active.precedence(),
        "resolved active route rule"
    );
    Ok(active)
}

/// Rank rules highest precedence first, using the same order and the same
/// destination check as [`highest_precedence`].
pub fn sort_by_precedence_descending(mut rules: Vec<RouteRule>) -> RuleResult<Vec<RouteRule>> {
    shared_destination(&rules)?;
    rules.sort_by(|a, b| a.precedence_order(b));
    Ok(rules)
}

/// The route rules deployed for one logical service, gathered for a
/// single resolution and then dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<RouteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Parse a YAML stream of route rules into a set.
    pub fn from_yaml(text: &str) -> RuleResult<Self> {
        Ok(Self::new(parse_route_rules(text)?))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RouteRule> {
        self.rules.iter()
    }

    pub fn push(&mut self, rule: RouteRule) {
        self.rules.push(rule);
    }

    /// The destination every rule targets.
    pub fn destination(&self) -> RuleResult<&Destination> {
        shared_destination(&self.rules)
    }

    pub fn active(&self) -> RuleResult<&RouteRule> {
        highest_precedence(&self.rules)
    }

    /// Every rule, highest precedence first.
    pub fn ranked(&self) -> RuleResult<Vec<&RouteRule>> {
        shared_destination(&self.rules)?;
        let mut ranked: Vec<&RouteRule> = self.rules.iter().collect();
        ranked.sort_by(|a, b| a.precedence_order(b));
        Ok(ranked)
    }

    pub fn into_ranked(self) -> RuleResult<Vec<RouteRule>> {
        sort_by_precedence_descending(self.rules)
    }

    /// Precedence of the active rule.
    pub fn highest_precedence(&self) -> RuleResult<u32> {
        self.active().map(RouteRule::precedence)
    }

    /// The rule that takes over if the active one is removed.
    pub fn rollback_target(&self) -> RuleResult<Option<&RouteRule>> {
        Ok(self.ranked()?.get(1).copied())
    }
}

impl From<Vec<RouteRule>> for RuleSet {
    fn from(rules: Vec<RouteRule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<RouteRule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = RouteRule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for RuleSet {
    type Item = RouteRule;
    type IntoIter = std::vec::IntoIter<RouteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a RouteRule;
    type IntoIter = std::slice::Iter<'a, RouteRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
