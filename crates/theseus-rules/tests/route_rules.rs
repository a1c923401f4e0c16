//! Route rule parsing and resolution against documents as the mesh
//! prints them.

use proptest::prelude::*;
use theseus_rules::*;

const ROUTERULE_YAML: &str = r#"apiVersion: config.istio.io/v1alpha2
kind: RouteRule
metadata:
  creationTimestamp: null
  name: details-default
  namespace: default
  resourceVersion: "11464"
spec:
  destination:
    name: details
  precedence: 1
  route:
  - labels:
      version: v1
"#;

const ROUTERULE_HIGHER_PRECEDENCE_YAML: &str = r#"apiVersion: config.istio.io/v1alpha2
kind: RouteRule
metadata:
  name: details-default-2
spec:
  destination:
    name: details
  precedence: 2123
  route:
  - labels:
      version: v1
"#;

const ROUTERULE_OTHER_DESTINATION: &str = r#"apiVersion: config.istio.io/v1alpha2
kind: RouteRule
metadata:
  name: other-name
spec:
  destination:
    name: other-name
  precedence: 9999
"#;

#[test]
fn parse_route_rule_recovers_destination() {
    let rule = parse_route_rule(ROUTERULE_YAML).unwrap();
    assert_eq!(rule.spec.destination.name, "details");
}

#[test]
fn sorted_rules_put_highest_precedence_first() {
    let higher = parse_route_rule(ROUTERULE_HIGHER_PRECEDENCE_YAML).unwrap();
    let sorted = sort_by_precedence_descending(vec![
        parse_route_rule(ROUTERULE_YAML).unwrap(),
        higher.clone(),
    ])
    .unwrap();
    assert_eq!(sorted[0], higher);
}

#[test]
fn highest_precedence_value() {
    let rules = vec![
        parse_route_rule(ROUTERULE_YAML).unwrap(),
        parse_route_rule(ROUTERULE_HIGHER_PRECEDENCE_YAML).unwrap(),
    ];
    assert_eq!(highest_precedence(&rules).unwrap().precedence(), 2123);
}

#[test]
fn other_destination_fails_the_guard() {
    let rules = vec![
        parse_route_rule(ROUTERULE_YAML).unwrap(),
        parse_route_rule(ROUTERULE_HIGHER_PRECEDENCE_YAML).unwrap(),
        parse_route_rule(ROUTERULE_OTHER_DESTINATION).unwrap(),
    ];
    assert!(matches!(
        highest_precedence(&rules),
        Err(RuleError::MixedDestinations { .. })
    ));
}

#[test]
fn multi_document_stream_with_blank_documents() {
    let text = format!(
        "---\n{ROUTERULE_YAML}---\n{ROUTERULE_HIGHER_PRECEDENCE_YAML}---\n"
    );
    let rules = parse_route_rules(&text).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(RuleSet::new(rules).active().unwrap().name(), "details-default-2");
}

#[test]
fn kubernetes_list_document() {
    let text = r#"apiVersion: v1
kind: List
items:
- apiVersion: config.istio.io/v1alpha2
  kind: RouteRule
  metadata:
    name: details-default
  spec:
    destination:
      name: details
    precedence: 1
- apiVersion: config.istio.io/v1alpha2
  kind: RouteRule
  metadata:
    name: details-canary
  spec:
    destination:
      name: details
    precedence: 4
"#;
    let set = RuleSet::from_yaml(text).unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.active().unwrap().name(), "details-canary");
}

#[test]
fn one_bad_document_fails_the_whole_stream() {
    let text = format!("{ROUTERULE_YAML}---\nkind: RouteRule\nmetadata:\n  name: broken\n");
    let err = parse_route_rules(&text).unwrap_err();
    match err {
        RuleError::MalformedRule(msg) => assert!(msg.contains("document 2"), "{msg}"),
        other => panic!("expected MalformedRule, got {other:?}"),
    }
}

#[test]
fn list_without_items_is_malformed() {
    for list in ["apiVersion: v1\nkind: List\n", "apiVersion: v1\nkind: List\nitems: {}\n"] {
        let text = format!("{ROUTERULE_YAML}---\n{list}");
        let err = parse_route_rules(&text).unwrap_err();
        assert_eq!(
            err,
            RuleError::MalformedRule("document 2: kind List without an items sequence".into())
        );
    }
}

#[test]
fn empty_list_yields_no_rules() {
    let rules = parse_route_rules("apiVersion: v1\nkind: List\nitems: []\n").unwrap();
    assert!(rules.is_empty());
}

#[test]
fn duplicate_rule_in_stream_fails_resolution() {
    let text = format!("{ROUTERULE_YAML}---\n{ROUTERULE_YAML}");
    let set = RuleSet::from_yaml(&text).unwrap();
    assert!(matches!(set.active(), Err(RuleError::MalformedRule(msg)) if msg.contains("details-default")));
}

#[test]
fn empty_stream_resolves_to_empty_set() {
    let set = RuleSet::from_yaml("").unwrap();
    assert!(set.is_empty());
    assert_eq!(set.active().unwrap_err(), RuleError::EmptySet);
}

fn arb_rules() -> impl Strategy<Value = Vec<RouteRule>> {
    prop::collection::vec((0u32..6, 0u32..20), 1..12).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (name, precedence))| {
                RouteRule::new(format!("rule-{name}-{i}"), Destination::new("reviews"), precedence)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn active_rule_is_independent_of_input_order(rules in arb_rules(), seed in any::<u64>()) {
        let mut shuffled = rules.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 0 {
            shuffled.reverse();
        }

        let a = highest_precedence(&rules).unwrap();
        let b = highest_precedence(&shuffled).unwrap();
        prop_assert_eq!(a.name(), b.name());
        prop_assert_eq!(a.precedence(), b.precedence());
    }

    #[test]
    fn active_rule_has_maximal_precedence(rules in arb_rules()) {
        let active = highest_precedence(&rules).unwrap();
        prop_assert!(rules.iter().all(|r| r.precedence() <= active.precedence()));
    }

    #[test]
    fn ranking_is_descending(rules in arb_rules()) {
        let ranked = sort_by_precedence_descending(rules).unwrap();
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].precedence() >= pair[1].precedence());
        }
    }
}
