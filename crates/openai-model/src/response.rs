use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll, ready};

use hcs_agent_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    OpaqueMessage, ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::Value;

use crate::Error;
use crate::io::Sse;
use crate::proto::{ChatCompletionChunk, Message, ToolCall};

static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

/// Accumulated state of a streamed completion.
struct StreamState {
    sse: Sse,
    id: Option<String>,
    content: String,
    reasoning_content: Option<String>,
    tool_calls: Vec<ToolCall>,
    finish_reason: Option<ModelFinishReason>,
    // Events ready to be handed out, in emission order.
    ready_events: VecDeque<ModelResponseEvent>,
    ended: bool,
}

impl StreamState {
    fn new(sse: Sse) -> Self {
        Self {
            sse,
            id: None,
            content: String::new(),
            reasoning_content: None,
            tool_calls: Vec::new(),
            finish_reason: None,
            ready_events: VecDeque::new(),
            ended: false,
        }
    }

    fn apply_chunk(&mut self, chunk: ChatCompletionChunk) -> Result<(), Error> {
        if let Some(error) = chunk.error {
            return Err(Error::new(error.message, ErrorKind::Other));
        }
        if let Some(id) = chunk.id {
            self.id.get_or_insert(id);
        }

        for choice in chunk.choices {
            let delta = choice.delta;
            if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
                self.content.push_str(&content);
                self.ready_events
                    .push_back(ModelResponseEvent::MessageDelta(content));
            }
            if let Some(reasoning) = delta.reasoning_content {
                self.reasoning_content
                    .get_or_insert_default()
                    .push_str(&reasoning);
            }
            for fragment in delta.tool_calls.into_iter().flatten() {
                self.merge_tool_call(fragment);
            }
            if let Some(reason) = choice.finish_reason {
                self.finish_reason = Some(match reason.as_str() {
                    "tool_calls" | "function_call" => {
                        ModelFinishReason::ToolCalls
                    }
                    "length" => ModelFinishReason::Length,
                    _ => ModelFinishReason::Stop,
                });
            }
        }
        Ok(())
    }

    fn merge_tool_call(&mut self, fragment: ToolCall) {
        let position = self.tool_calls.iter().position(|t| {
            match (fragment.index, &fragment.id) {
                (Some(index), _) => t.index == Some(index),
                (None, Some(id)) => t.id.as_ref() == Some(id),
                (None, None) => false,
            }
        });
        let Some(position) = position else {
            self.tool_calls.push(fragment);
            return;
        };
        let existing = &mut self.tool_calls[position];

        if let Some(id) = fragment.id {
            existing.id.get_or_insert(id);
        }
        if let Some(ty) = fragment.r#type {
            existing.r#type.get_or_insert(ty);
        }
        let Some(function) = fragment.function else {
            return;
        };
        match &mut existing.function {
            Some(existing_fn) => {
                if let Some(name) = function.name {
                    existing_fn.name.get_or_insert_default().push_str(&name);
                }
                if let Some(arguments) = function.arguments {
                    existing_fn
                        .arguments
                        .get_or_insert_default()
                        .push_str(&arguments);
                }
            }
            None => existing.function = Some(function),
        }
    }

    /// Queues the tool calls and the finish reason once the stream ends.
    fn finish_stream(&mut self) {
        self.ended = true;
        for tool_call in &self.tool_calls {
            self.ready_events
                .push_back(ModelResponseEvent::ToolCall(to_request(tool_call)));
        }
        let reason = self.finish_reason.unwrap_or(if self.tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        });
        self.ready_events
            .push_back(ModelResponseEvent::Completed(reason));
    }

    fn into_message(self) -> (String, Message) {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|mut t| {
                t.r#type.get_or_insert_with(|| "function".to_owned());
                t
            })
            .collect::<Vec<_>>();
        // Some gateways omit the completion id. The turn must still be
        // replayed, or the tool results that follow lose their tool calls.
        let id = self.id.unwrap_or_else(|| {
            match tool_calls.iter().find_map(|t| t.id.as_deref()) {
                Some(tool_call_id) => format!("msg:{tool_call_id}"),
                None => format!(
                    "msg:local-{}",
                    NEXT_LOCAL_ID.fetch_add(1, Ordering::Relaxed)
                ),
            }
        });
        (
            id,
            Message::Assistant {
                content: if self.content.is_empty() && !tool_calls.is_empty()
                {
                    None
                } else {
                    Some(self.content)
                },
                tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                reasoning_content: self.reasoning_content,
            },
        )
    }
}

fn to_request(tool_call: &ToolCall) -> ToolCallRequest {
    let function = tool_call.function.as_ref();
    let arguments = function
        .and_then(|f| f.arguments.as_deref())
        .filter(|args| !args.trim().is_empty())
        .map(|args| {
            serde_json::from_str::<Value>(args).unwrap_or_else(|err| {
                warn!("malformed tool arguments ({err}): {args}");
                Value::String(args.to_owned())
            })
        })
        .unwrap_or_else(|| Value::Object(Default::default()));
    ToolCallRequest {
        id: tool_call.id.clone().unwrap_or_default(),
        name: function.and_then(|f| f.name.clone()).unwrap_or_default(),
        arguments,
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
        full_msg: Option<(String, Message)>,
    }
}

impl OpenAIResponse {
    pub fn from_sse(sse: Sse) -> Self {
        let state = StreamState::new(sse);
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
            full_msg: None,
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => {
                *this.next_event_fut = Some(Box::pin(next_event(state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, state)) => {
                *this.next_event_fut = None;
                *this.full_msg = Some(state.into_message());
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        self.full_msg
            .as_ref()
            .map(|(id, msg)| OpaqueMessage::new(id, msg.clone()))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.ready_events.pop_front() {
            return Ok((Some(event), state));
        }
        if state.ended {
            return Ok((None, state));
        }

        let data = state.sse.next_event().await.map_err(|err| {
            Error::new(format!("stream error: {err:?}"), ErrorKind::Other)
        })?;
        let Some(data) = data else {
            state.finish_stream();
            continue;
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            state.finish_stream();
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        state.apply_chunk(chunk)?;
    }
}
