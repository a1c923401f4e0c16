//! Gate error types.

use thiserror::Error;

use crate::gate::Tool;
use crate::version::ToolVersion;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("{tool} version {observed} does not satisfy required {required}")]
    Unsatisfied {
        tool: Tool,
        observed: ToolVersion,
        required: ToolVersion,
    },
}

pub type GateResult<T> = Result<T, GateError>;
