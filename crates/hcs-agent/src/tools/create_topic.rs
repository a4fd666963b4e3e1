use std::sync::Arc;

use hcs_agent_core::tool::{Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

use super::render_output;
use crate::ledger::Ledger;

/// Input of [`CreateTopicTool`].
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTopicParameters {
    #[schemars(description = "a memo for the topic with")]
    memo: String,
}

/// A tool for creating a new consensus topic.
pub struct CreateTopicTool<L> {
    ledger: Arc<L>,
    parameter_schema: Value,
}

impl<L: Ledger> CreateTopicTool<L> {
    /// Creates a new create-topic tool on top of `ledger`.
    #[inline]
    pub fn new(ledger: Arc<L>) -> Self {
        CreateTopicTool {
            ledger,
            parameter_schema: schema_for!(CreateTopicParameters).to_value(),
        }
    }
}

impl<L: Ledger> Tool for CreateTopicTool<L> {
    type Input = CreateTopicParameters;

    fn name(&self) -> &str {
        "CMD_HCS_CREATE_TOPIC"
    }

    fn description(&self) -> &str {
        "create a new HCS Topic"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: CreateTopicParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        info!("CMD_HCS_CREATE_TOPIC invoked with inputs: {input:?}");
        let fut = self.ledger.create_topic(input.memo);
        async move { render_output(fut.await) }
    }
}
