use std::sync::Arc;

use hcs_agent_model::ModelProvider;

use super::{Agent, DEFAULT_RECURSION_LIMIT};
use crate::checkpoint::{Checkpointer, MemoryCheckpointer};
use crate::model_client::{ModelClient, TranscriptFn};
use crate::tool::{AnyTool, Tool, ToolObject};

/// [`Agent`] builder.
pub struct AgentBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) system_prompt: Option<String>,
    pub(crate) tools: Vec<Box<dyn ToolObject>>,
    pub(crate) checkpointer: Box<dyn Checkpointer>,
    pub(crate) recursion_limit: usize,
    pub(crate) on_transcript: Option<TranscriptFn>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// Conversations are kept in a [`MemoryCheckpointer`] unless another
    /// store is set.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_prompt: None,
            tools: vec![],
            checkpointer: Box::new(MemoryCheckpointer::new()),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            on_transcript: None,
        }
    }

    /// Sets the system prompt that opens every new conversation.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.push(Box::new(AnyTool(tool)));
        self
    }

    /// Replaces the conversation store.
    #[inline]
    pub fn with_checkpointer<C: Checkpointer>(mut self, checkpointer: C) -> Self {
        self.checkpointer = Box::new(checkpointer);
        self
    }

    /// Sets the maximum number of model calls in one invocation.
    #[inline]
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Attaches a callback that receives assistant text as it streams in.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Builds the agent.
    #[inline]
    pub fn build(self) -> Agent {
        Agent::from_builder(self)
    }
}
