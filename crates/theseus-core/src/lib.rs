pub mod config;

pub use config::{RolloutDefaults, TheseusConfig, VersionRequirements};
