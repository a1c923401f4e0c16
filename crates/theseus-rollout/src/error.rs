//! Rollout error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RolloutError {
    #[error("invalid canary config: {0}")]
    InvalidConfig(String),

    #[error("cannot split traffic: {0}")]
    TrafficSplit(String),

    #[error(transparent)]
    Rules(#[from] theseus_rules::RuleError),
}

pub type RolloutResult<T> = Result<T, RolloutError>;
