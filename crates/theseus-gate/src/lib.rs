//! theseus-gate: tool version gating.
//!
//! Decides whether the kubectl and istioctl versions observed on the
//! operator's machine satisfy the minimums a rollout needs. Nothing here
//! runs the tools: callers hand in text already captured from
//! `kubectl version` / `istioctl version`, or an explicit override.
//!
//! # Components
//!
//! - **`version`**: `ToolVersion` and extraction from raw tool output
//! - **`gate`**: `at_least` comparisons and the per-tool `VersionGate`
//!
//! Any version text that cannot be parsed is an error, never a pass.

pub mod error;
pub mod gate;
pub mod version;

pub use error::{GateError, GateResult};
pub use gate::{
    ClientInput, ClientServerInput, GateCheck, Tool, VersionGate, at_least,
    check_client_server_pair,
};
pub use version::{ToolVersion, parse_client_server, parse_version};
