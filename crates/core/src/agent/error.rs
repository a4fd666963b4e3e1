use std::error::Error as StdError;
use std::fmt::{self, Display};

use hcs_agent_model::ErrorKind;

use crate::checkpoint::CheckpointError;

/// Errors returned by [`Agent::invoke`](super::Agent::invoke).
#[derive(Debug)]
pub enum Error {
    /// The model provider failed.
    Model {
        /// The kind reported by the provider.
        kind: ErrorKind,
        /// The provider's error message.
        message: String,
    },
    /// The model kept asking for tools past the allowed number of calls.
    RecursionLimit(usize),
    /// The conversation store failed.
    Checkpoint(CheckpointError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Model { kind, message } => {
                write!(f, "model error ({kind}): {message}")
            }
            Error::RecursionLimit(limit) => write!(
                f,
                "recursion limit of {limit} reached without a final answer"
            ),
            Error::Checkpoint(err) => write!(f, "checkpoint error: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Checkpoint(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
