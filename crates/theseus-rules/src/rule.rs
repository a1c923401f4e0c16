//! Route rule documents (`config.istio.io/v1alpha2`, kind `RouteRule`).
//!
//! Only the fields a rollout reads are modelled; anything else in the
//! document (timestamps, resource versions, ...) is ignored on parse.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::debug;

use crate::error::{RuleError, RuleResult};

pub const API_VERSION: &str = "config.istio.io/v1alpha2";
pub const KIND: &str = "RouteRule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    pub spec: RouteRuleSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRuleSpec {
    pub destination: Destination,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub match_condition: Option<MatchCondition>,
    /// Larger values are evaluated first. Absent means 0.
    #[serde(default)]
    pub precedence: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub route: Vec<DestinationWeight>,
}

/// The service a rule governs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}.{}", self.name, ns),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMatch {
    /// Header name (lower case, e.g. `cookie`) to match condition.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, StringMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl StringMatch {
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            regex: Some(pattern.into()),
            ..Self::default()
        }
    }
}

/// A labelled route target with an optional traffic weight (percent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationWeight {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl DestinationWeight {
    pub fn labelled(key: impl Into<String>, value: impl Into<String>, weight: Option<u32>) -> Self {
        Self {
            labels: BTreeMap::from([(key.into(), value.into())]),
            weight,
        }
    }

    /// The `version` label, by convention the rollout tag.
    pub fn version(&self) -> Option<&str> {
        self.labels.get("version").map(String::as_str)
    }
}

/// A header predicate selecting which requests a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
    pub header: &'a str,
    pub condition: &'a StringMatch,
}

impl RouteRule {
    /// A rule with no match condition and no routes.
    pub fn new(name: impl Into<String>, destination: Destination, precedence: u32) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: Metadata {
                name: name.into(),
                namespace: None,
            },
            spec: RouteRuleSpec {
                destination,
                match_condition: None,
                precedence,
                route: Vec::new(),
            },
        }
    }

    pub fn with_header(mut self, header: impl Into<String>, condition: StringMatch) -> Self {
        let request = self
            .spec
            .match_condition
            .get_or_insert_with(MatchCondition::default)
            .request
            .get_or_insert_with(RequestMatch::default);
        request.headers.insert(header.into(), condition);
        self
    }

    pub fn with_route(mut self, route: Vec<DestinationWeight>) -> Self {
        self.spec.route = route;
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn destination(&self) -> &Destination {
        &self.spec.destination
    }

    pub fn precedence(&self) -> u32 {
        self.spec.precedence
    }

    /// First header predicate, in header-name order.
    pub fn header_match(&self) -> Option<HeaderMatch<'_>> {
        self.spec
            .match_condition
            .as_ref()?
            .request
            .as_ref()?
            .headers
            .iter()
            .next()
            .map(|(header, condition)| HeaderMatch { header, condition })
    }

    pub fn same_destination(&self, other: &RouteRule) -> bool {
        self.destination() == other.destination()
    }

    /// Ranking order: `Less` means `self` is evaluated before `other`.
    ///
    /// Higher precedence first; equal precedences fall back to metadata
    /// name, then namespace, both ascending.
    pub fn precedence_order(&self, other: &RouteRule) -> Ordering {
        other
            .precedence()
            .cmp(&self.precedence())
            .then_with(|| self.metadata.name.cmp(&other.metadata.name))
            .then_with(|| self.metadata.namespace.cmp(&other.metadata.namespace))
    }

    /// Percentage of the traffic this rule selects that goes to targets
    /// labelled `key=value`.
    ///
    /// A single unweighted target receives all traffic. Unweighted
    /// targets alongside others count as zero.
    pub fn traffic_share(&self, key: &str, value: &str) -> u32 {
        let route = &self.spec.route;
        let matches = |t: &DestinationWeight| t.labels.get(key).is_some_and(|v| v == value);
        if let [only] = route.as_slice() {
            if only.weight.is_none() {
                return if matches(only) { 100 } else { 0 };
            }
        }
        route
            .iter()
            .filter(|t| matches(t))
            .map(|t| t.weight.unwrap_or(0))
            .fold(0u32, u32::saturating_add)
            .min(100)
    }

    pub fn to_yaml(&self) -> RuleResult<String> {
        serde_yaml::to_string(self).map_err(|e| RuleError::Encode(e.to_string()))
    }
}

/// Parse a single route rule document.
pub fn parse_route_rule(document: &str) -> RuleResult<RouteRule> {
    let rule: RouteRule =
        serde_yaml::from_str(document).map_err(|e| RuleError::MalformedRule(e.to_string()))?;
    validate(rule)
}

/// Parse every route rule in a YAML stream.
///
/// Accepts `---` separated documents (as printed by
/// `istioctl get routerules -o yaml`) and Kubernetes `kind: List`
/// documents with an `items` sequence. Empty documents are skipped.
pub fn parse_route_rules(text: &str) -> RuleResult<Vec<RouteRule>> {
    let mut rules = Vec::new();
    if text.trim().is_empty() {
        return Ok(rules);
    }

    for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = Value::deserialize(document)
            .map_err(|e| RuleError::MalformedRule(format!("document {}: {e}", index + 1)))?;

        match value {
            Value::Null => continue,
            value if is_list(&value) => {
                let items = value
                    .get("items")
                    .and_then(Value::as_sequence)
                    .cloned()
                    .ok_or_else(|| {
                        RuleError::MalformedRule(format!(
                            "document {}: kind List without an items sequence",
                            index + 1
                        ))
                    })?;
                for item in items {
                    rules.push(rule_from_value(item, index)?);
                }
            }
            value => rules.push(rule_from_value(value, index)?),
        }
    }

    debug!(count = rules.len(), "parsed route rules");
    Ok(rules)
}

fn is_list(value: &Value) -> bool {
    value.get("kind").and_then(Value::as_str) == Some("List")
}

fn rule_from_value(value: Value, index: usize) -> RuleResult<RouteRule> {
    let rule: RouteRule = serde_yaml::from_value(value)
        .map_err(|e| RuleError::MalformedRule(format!("document {}: {e}", index + 1)))?;
    validate(rule)
}

fn validate(rule: RouteRule) -> RuleResult<RouteRule> {
    if rule.metadata.name.trim().is_empty() {
        return Err(RuleError::MalformedRule("metadata.name is empty".to_string()));
    }
    if rule.spec.destination.name.trim().is_empty() {
        return Err(RuleError::MalformedRule(format!(
            "rule '{}': spec.destination.name is empty",
            rule.metadata.name
        )));
    }
    if let Some(weight) = rule.spec.route.iter().filter_map(|t| t.weight).find(|w| *w > 100) {
        return Err(RuleError::MalformedRule(format!(
            "rule '{}': route weight {weight} is above 100",
            rule.metadata.name
        )));
    }
    Ok(rule)
}
