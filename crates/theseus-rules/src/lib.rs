//! theseus-rules: traffic routing rules and precedence resolution.
//!
//! A rollout is driven by the mesh's route rules: whichever rule for a
//! destination has the highest precedence is the one in force, and that
//! rule tells us which rollout step is live.
//!
//! ```text
//! istioctl get routerules -o yaml
//!   └── parse_route_rules()   → Vec<RouteRule>
//!         └── RuleSet         → one destination, checked before any comparison
//!               ├── active()  → highest precedence rule
//!               └── ranked()  → full ranking, highest first
//! ```
//!
//! Equal precedences are broken by rule name, then namespace, so the
//! result never depends on the order the rules were listed in.

pub mod error;
pub mod resolver;
pub mod rule;

pub use error::{RuleError, RuleResult};
pub use resolver::{RuleSet, highest_precedence, sort_by_precedence_descending};
pub use rule::{
    Destination, DestinationWeight, HeaderMatch, MatchCondition, Metadata, RequestMatch,
    RouteRule, RouteRuleSpec, StringMatch, parse_route_rule, parse_route_rules,
};
