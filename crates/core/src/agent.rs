mod builder;
mod error;
#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hcs_agent_model::{ModelFinishReason, ModelMessage, ModelRequest};
use tracing::Instrument;

use crate::checkpoint::Checkpointer;
use crate::conversation::Conversation;
use crate::model_client::{ModelClient, TranscriptFn};
use crate::tool::Executor as ToolExecutor;
pub use builder::AgentBuilder;
pub use error::Error;

/// The default number of model calls allowed in one invocation.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// An agent instance, which owns a model client, the registered tools
/// and a conversation store.
///
/// Invocations on different threads run independently. Invocations on
/// the same thread are serialized, so a thread's history is never
/// written by two turns at once.
pub struct Agent {
    model_client: ModelClient,
    tool_executor: ToolExecutor,
    checkpointer: Box<dyn Checkpointer>,
    system_prompt: Option<String>,
    recursion_limit: usize,
    on_transcript: TranscriptFn,
    thread_locks: Mutex<ThreadLocks>,
}

/// The outcome of a successful [`Agent::invoke`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    /// Text of the final assistant message.
    pub text: String,
    /// How many times the model was called in this turn.
    pub model_calls: usize,
}

impl Agent {
    /// Runs one user turn on the given thread.
    ///
    /// The model is called repeatedly until it answers without asking
    /// for tools. The thread's history is saved only when the whole turn
    /// succeeds.
    pub async fn invoke<S: Into<String>>(
        &self,
        input: S,
        thread_id: &str,
    ) -> Result<AgentReply, Error> {
        let lease = ThreadLease::acquire(self, thread_id);
        let _guard = lease.lock().await;
        self.run_turn(input.into(), thread_id)
            .instrument(info_span!("invoke", thread_id))
            .await
    }

    async fn run_turn(
        &self,
        input: String,
        thread_id: &str,
    ) -> Result<AgentReply, Error> {
        let mut conversation = self
            .checkpointer
            .load(thread_id)
            .await
            .map_err(Error::Checkpoint)?
            .unwrap_or_default();
        self.start_turn(&mut conversation, input);

        let tools = self.tool_executor.definitions();
        let mut model_calls = 0;
        let text = loop {
            if model_calls >= self.recursion_limit {
                warn!("recursion limit reached after {model_calls} calls");
                return Err(Error::RecursionLimit(self.recursion_limit));
            }
            model_calls += 1;

            let req = ModelRequest {
                messages: conversation.messages(),
                tools: tools.clone(),
            };
            let resp = self
                .model_client
                .send_request(req, Arc::clone(&self.on_transcript))
                .await
                .map_err(|err| Error::Model {
                    kind: err.kind(),
                    message: err.to_string(),
                })?;

            if resp.finish_reason == Some(ModelFinishReason::Length) {
                warn!("model output was cut off by the token limit");
            }

            let msg = match resp.opaque_msg {
                Some(opaque_msg) => ModelMessage::Opaque(opaque_msg),
                None => ModelMessage::Assistant(resp.transcript.clone()),
            };
            conversation.push(msg, resp.transcript.clone());

            if resp.tool_calls.is_empty() {
                break resp.transcript;
            }

            debug!("running {} tool calls", resp.tool_calls.len());
            let results = self.tool_executor.execute_all(resp.tool_calls).await;
            for result in results {
                let transcript = result.content.clone();
                conversation.push(ModelMessage::Tool(result), transcript);
            }
        };

        self.checkpointer
            .save(thread_id, conversation)
            .await
            .map_err(Error::Checkpoint)?;
        debug!("turn finished after {model_calls} model calls");

        Ok(AgentReply { text, model_calls })
    }

    fn start_turn(&self, conversation: &mut Conversation, input: String) {
        if conversation.is_empty() {
            if let Some(system_prompt) = &self.system_prompt {
                conversation.push(
                    ModelMessage::System(system_prompt.clone()),
                    system_prompt.clone(),
                );
            }
        }
        conversation.push(ModelMessage::User(input.clone()), input);
    }

    fn thread_locks(&self) -> MutexGuard<'_, ThreadLocks> {
        self.thread_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

type ThreadLocks = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// A claim on a thread's turn lock.
///
/// The map entry lives only while some invocation holds a lease on it.
struct ThreadLease<'a> {
    agent: &'a Agent,
    thread_id: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl<'a> ThreadLease<'a> {
    fn acquire(agent: &'a Agent, thread_id: &'a str) -> Self {
        let lock = Arc::clone(
            agent
                .thread_locks()
                .entry(thread_id.to_owned())
                .or_default(),
        );
        Self {
            agent,
            thread_id,
            lock,
        }
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for ThreadLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.agent.thread_locks();
        // Clones are only taken under the map lock. Two owners left means
        // the map and this lease, so nobody else wants the thread.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(self.thread_id);
        }
    }
}

impl Agent {
    fn from_builder(builder: AgentBuilder) -> Self {
        let AgentBuilder {
            model_client,
            system_prompt,
            tools,
            checkpointer,
            recursion_limit,
            on_transcript,
        } = builder;

        let on_transcript = on_transcript
            .unwrap_or_else(|| Arc::new(|_: &str| {}) as TranscriptFn);
        Self {
            model_client,
            tool_executor: ToolExecutor::with_tools(tools),
            checkpointer,
            system_prompt,
            recursion_limit,
            on_transcript,
            thread_locks: Default::default(),
        }
    }
}
