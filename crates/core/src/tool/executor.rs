use std::collections::BTreeMap;

use futures_util::future::join_all;
use hcs_agent_model::{ModelTool, ToolCallRequest, ToolCallResult};
use tracing::Instrument;

use crate::tool::{Error, ErrorKind, ToolObject};

/// Runs tool call requests against the registered tools.
pub(crate) struct Executor {
    tools: BTreeMap<String, Box<dyn ToolObject>>,
}

impl Executor {
    pub(crate) fn with_tools(tools: Vec<Box<dyn ToolObject>>) -> Self {
        let mut tool_map = BTreeMap::new();
        for tool in tools {
            let name = tool.name().to_owned();
            if tool_map.insert(name.clone(), tool).is_some() {
                warn!("tool registered twice, keeping the last: {name}");
            }
        }
        Self { tools: tool_map }
    }

    /// Returns tool definitions sorted by name.
    pub(crate) fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .values()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Runs one tool call request.
    ///
    /// Never fails. A failure is rendered into the result content for the
    /// model to read.
    pub(crate) async fn execute(&self, req: ToolCallRequest) -> ToolCallResult {
        let span = debug_span!("tool", name = %req.name, id = %req.id);
        async move {
            let result = match self.tools.get(&req.name) {
                Some(tool) => {
                    trace!("running with args: {}", req.arguments);
                    tool.execute(req.arguments).await
                }
                None => {
                    warn!("tool not found: {}", req.name);
                    Err(Error::not_found()
                        .with_reason(self.not_found_message(&req.name)))
                }
            };
            let content = match result {
                Ok(output) => output,
                Err(err) => {
                    debug!("tool failed: {err}");
                    render_error(&err)
                }
            };
            ToolCallResult { id: req.id, content }
        }
        .instrument(span)
        .await
    }

    /// Runs all requests concurrently.
    ///
    /// Yields one result per request, in request order.
    pub(crate) async fn execute_all(
        &self,
        requests: Vec<ToolCallRequest>,
    ) -> Vec<ToolCallResult> {
        join_all(requests.into_iter().map(|req| self.execute(req))).await
    }

    fn not_found_message(&self, name: &str) -> String {
        let names = self.tools.keys().cloned().collect::<Vec<_>>();
        format!(
            "{name} is not a valid tool, try one of [{}].",
            names.join(", ")
        )
    }
}

fn render_error(err: &Error) -> String {
    match err.kind() {
        ErrorKind::NotFound => format!("Error: {}", err.reason()),
        _ => format!("Error: {}\n Please fix your mistakes.", err.reason()),
    }
}
