//! A scripted fake model for tests.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use hcs_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    OpaqueMessage,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone)]
enum ConversationStep {
    UserInput,
    ToolResult,
    AssistantResponse(PresetResponse),
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    step_idx: usize,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.event_idx > this.events.len() {
            return Poll::Ready(Ok(None));
        }

        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(this.delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let event = match this.events.get(this.event_idx) {
            Some(PresetEvent::MessageDelta(msg)) => {
                ModelResponseEvent::MessageDelta(msg.clone())
            }
            Some(PresetEvent::ToolCall(req)) => {
                ModelResponseEvent::ToolCall(req.clone())
            }
            None => {
                let has_tool_call = this
                    .events
                    .iter()
                    .any(|event| matches!(event, PresetEvent::ToolCall(_)));
                ModelResponseEvent::Completed(if has_tool_call {
                    ModelFinishReason::ToolCalls
                } else {
                    ModelFinishReason::Stop
                })
            }
        };
        this.event_idx += 1;
        Poll::Ready(Ok(Some(event)))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        let id = format!("msg:{}", self.step_idx);
        Some(OpaqueMessage::new(id.clone(), id))
    }
}

/// A local fake model for tests.
///
/// The conversation script says how the model answers. Each request picks
/// the step at the index equal to the number of non-system messages it
/// carries, so the script must mirror the conversation: a user input step,
/// then an assistant step, then one tool result step per tool call, and
/// so on. Requests beyond the script, or landing on a non-assistant step,
/// fail.
///
/// Every request is recorded and can be inspected with
/// [`TestModelProvider::received_requests`].
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    received: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(preset));
    }

    #[inline]
    pub fn add_tool_result_step(&mut self) {
        self.conversation_script.push(ConversationStep::ToolResult);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns copies of all requests seen so far, oldest first.
    pub fn received_requests(&self) -> Vec<ModelRequest> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }

    fn select_step(&self, req: &ModelRequest) -> Result<(usize, Vec<PresetEvent>), Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| !matches!(msg, ModelMessage::System(_)))
            .count();
        match self.conversation_script.get(step_idx) {
            None => Err(Error {
                message: format!("no step at {step_idx}"),
                kind: ErrorKind::Other,
            }),
            Some(ConversationStep::UserInput | ConversationStep::ToolResult) => {
                Err(Error {
                    message: format!("step {step_idx} is not an assistant step"),
                    kind: ErrorKind::Other,
                })
            }
            Some(ConversationStep::AssistantResponse(preset)) => {
                match &preset.failure {
                    Some(message) => Err(Error {
                        message: message.clone(),
                        kind: ErrorKind::Other,
                    }),
                    None => Ok((step_idx, preset.events.clone())),
                }
            }
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        if let Ok(mut received) = self.received.lock() {
            received.push(req.clone());
        }
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        ready(self.select_step(req).map(|(step_idx, events)| {
            TestModelResponse {
                events,
                step_idx,
                event_idx: 0,
                delay,
                sleep: None,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use hcs_agent_model::{ModelTool, ToolCallRequest, ToolCallResult};
    use serde_json::json;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> (String, Option<ToolCallRequest>, OpaqueMessage) {
        let mut resp = pin!(resp);
        let mut msg = String::new();
        let mut tool_call = None;
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await.unwrap()
        {
            match event {
                ModelResponseEvent::Completed(_) => {}
                ModelResponseEvent::MessageDelta(delta) => {
                    msg.push_str(&delta);
                }
                ModelResponseEvent::ToolCall(req) => tool_call = Some(req),
            }
        }
        (msg, tool_call, resp.make_opaque_message().unwrap())
    }

    #[tokio::test]
    async fn test_scripted_tool_turn() {
        let mut provider = TestModelProvider::default();
        provider.add_user_input_step();
        provider.add_assistant_response_step(PresetResponse::with_events([
            PresetEvent::MessageDelta("Sure, ".to_owned()),
            PresetEvent::ToolCall(ToolCallRequest {
                id: "tool:1".to_owned(),
                name: "CMD_HCS_CREATE_TOPIC".to_owned(),
                arguments: json!({ "memo": "notes" }),
            }),
        ]));
        provider.add_tool_result_step();
        provider.add_assistant_response_step(PresetResponse::with_events([
            PresetEvent::MessageDelta("Created 0.0.9.".to_owned()),
        ]));

        let mut req = ModelRequest {
            messages: vec![
                ModelMessage::System("Be brief.".to_owned()),
                ModelMessage::User("Make a topic".to_owned()),
            ],
            tools: vec![ModelTool {
                name: "CMD_HCS_CREATE_TOPIC".to_owned(),
                description: "create a new HCS Topic".to_owned(),
                parameters: json!({ "type": "object" }),
            }],
        };
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, opaque_msg) = collect_response(resp).await;
        assert_eq!(msg, "Sure, ");
        let tool_call = tool_call.unwrap();
        assert_eq!(tool_call.arguments, json!({ "memo": "notes" }));

        req.messages.push(ModelMessage::Opaque(opaque_msg));
        req.messages.push(ModelMessage::Tool(ToolCallResult {
            id: tool_call.id,
            content: "0.0.9".to_owned(),
        }));
        let resp = provider.send_request(&req).await.unwrap();
        let (msg, tool_call, _) = collect_response(resp).await;
        assert_eq!(msg, "Created 0.0.9.");
        assert!(tool_call.is_none());

        assert_eq!(provider.received_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_script_errors() {
        let mut provider = TestModelProvider::default();
        provider.add_user_input_step();
        provider
            .add_assistant_response_step(PresetResponse::failing("boom"));

        let req = ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
            tools: vec![],
        };
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.to_string(), "boom");

        let req = ModelRequest::default();
        assert!(provider.send_request(&req).await.is_err());
    }
}
