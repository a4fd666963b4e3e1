use std::sync::Arc;

use hcs_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::render_output;
use crate::ledger::Ledger;

/// Input of [`SubmitMessageTool`].
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMessageParameters {
    #[schemars(description = "the ID of the HCS topic to submit a message to")]
    topic_id: String,
    #[schemars(description = "the text of the message to submit")]
    message: String,
}

/// A tool for appending a message to an existing consensus topic.
pub struct SubmitMessageTool<L> {
    ledger: Arc<L>,
    parameter_schema: Value,
}

impl<L: Ledger> SubmitMessageTool<L> {
    /// Creates a new submit-message tool on top of `ledger`.
    #[inline]
    pub fn new(ledger: Arc<L>) -> Self {
        SubmitMessageTool {
            ledger,
            parameter_schema: schema_for!(SubmitMessageParameters).to_value(),
        }
    }
}

impl<L: Ledger> Tool for SubmitMessageTool<L> {
    type Input = SubmitMessageParameters;

    fn name(&self) -> &str {
        "CMD_HCS_SUBMIT_TOPIC_MESSAGE"
    }

    fn description(&self) -> &str {
        "submit a message to an existing HCS topic"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: SubmitMessageParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        info!("CMD_HCS_SUBMIT_TOPIC_MESSAGE invoked with inputs: {input:?}");
        let fut = self
            .ledger
            .submit_topic_message(input.topic_id, input.message);
        async move { render_output(fut.await) }
    }
}
