//! Tools that let the model act on the ledger's consensus service.

mod create_topic;
mod submit_message;

pub use create_topic::{CreateTopicParameters, CreateTopicTool};
pub use submit_message::{SubmitMessageParameters, SubmitMessageTool};

use hcs_agent_core::tool::Error as ToolError;
use serde::Serialize;

use crate::ledger::LedgerError;

fn render_output<T: Serialize>(
    result: Result<T, LedgerError>,
) -> Result<String, ToolError> {
    let output = result.map_err(|err| {
        warn!("ledger call failed: {err}");
        ToolError::execution_error().with_reason(err.to_string())
    })?;
    serde_json::to_string(&output)
        .map_err(|err| ToolError::execution_error().with_reason(err.to_string()))
}
