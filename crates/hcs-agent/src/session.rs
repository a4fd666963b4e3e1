use std::sync::Arc;

use hcs_agent_core::{Agent, AgentBuilder, Error as AgentError};
use hcs_agent_model::ModelProvider;

use crate::ledger::Ledger;
use crate::llm::LlmClient;
use crate::tools::{CreateTopicTool, SubmitMessageTool};

/// The conversation thread used when none is given.
pub const DEFAULT_THREAD_ID: &str = "0x0001";

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    thread_id: String,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let agent_builder = AgentBuilder::with_model_provider(provider);
        Self {
            agent_builder,
            thread_id: DEFAULT_THREAD_ID.to_owned(),
        }
    }

    /// Creates a session builder driven by an [`LlmClient`].
    pub fn with_llm_client(client: LlmClient) -> Self {
        match client {
            LlmClient::OpenAI(provider) => Self::with_model_provider(provider),
            LlmClient::Anthropic(provider) => {
                Self::with_model_provider(provider)
            }
        }
    }

    /// Sets the system prompt for the agent.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.agent_builder = self.agent_builder.with_system_prompt(prompt);
        self
    }

    /// Sets the conversation thread that messages are sent on.
    #[inline]
    pub fn with_thread_id<S: Into<String>>(mut self, thread_id: S) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    /// Attaches a callback to be invoked when a transcript is generated.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_transcript(on_transcript);
        self
    }

    /// Builds a new session whose tools act on `ledger`.
    pub fn build<L: Ledger>(self, ledger: L) -> Session {
        let ledger = Arc::new(ledger);
        let agent = self
            .agent_builder
            .with_tool(CreateTopicTool::new(Arc::clone(&ledger)))
            .with_tool(SubmitMessageTool::new(ledger))
            .build();

        Session {
            agent,
            thread_id: self.thread_id,
        }
    }
}

/// A chat session bound to one conversation thread.
///
/// The session holds a fully configured agent, and it is basically a
/// wrapper around [`Agent`].
pub struct Session {
    agent: Agent,
    thread_id: String,
}

impl Session {
    /// Sends a message and waits for the agent's final reply.
    pub async fn send_message(&self, message: &str) -> Result<String, AgentError> {
        let reply = self.agent.invoke(message, &self.thread_id).await?;
        debug!("reply after {} model calls", reply.model_calls);
        Ok(reply.text)
    }

    /// Returns the conversation thread of this session.
    #[inline]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}
