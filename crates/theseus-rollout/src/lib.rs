//! Theseus canary rollouts: strategy, step detection, route generation.
//!
//! This crate works out where a canary rollout stands from the route
//! rules currently deployed, and produces the next rule to apply. Applying
//! rules, testing the new version and rolling back are left to the caller.
//!
//! # Components
//!
//! - **`strategy`**: Canary configuration (tag, weight, header selector)
//! - **`plan`**: Rollout step detection and route rule generation

pub mod error;
pub mod plan;
pub mod strategy;

pub use error::{RolloutError, RolloutResult};
pub use plan::{RolloutStep, detect_step, generate_rule};
pub use strategy::{CanaryConfig, HeaderSelector};
