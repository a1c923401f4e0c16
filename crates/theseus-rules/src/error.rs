//! Route rule error types.

use thiserror::Error;

use crate::rule::Destination;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("malformed route rule: {0}")]
    MalformedRule(String),

    #[error("failed to encode route rule: {0}")]
    Encode(String),

    #[error("no route rules to resolve")]
    EmptySet,

    #[error("route rule destinations do not match: expected {expected}, found {found}")]
    MixedDestinations {
        expected: Destination,
        found: Destination,
    },
}

pub type RuleResult<T> = Result<T, RuleError>;
