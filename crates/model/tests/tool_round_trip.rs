use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::{poll_fn, ready};
use std::pin::Pin;
use std::task::{self, Poll};

use hcs_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
    ModelTool, ToolCallRequest, ToolCallResult,
};
use serde_json::json;

#[derive(Debug)]
struct EchoError(ErrorKind);

impl Display for EchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for EchoError {}

impl ModelProviderError for EchoError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

struct QueuedResponse(VecDeque<ModelResponseEvent>);

impl ModelResponse for QueuedResponse {
    type Error = EchoError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().0.pop_front()))
    }
}

/// Asks for a topic once, then reports the tool output back as text.
struct TopicModel;

impl ModelProvider for TopicModel {
    type Error = EchoError;
    type Response = QueuedResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let events = match req.messages.last() {
            None => {
                return ready(Err(EchoError(ErrorKind::Other)));
            }
            Some(ModelMessage::Tool(result)) => vec![
                ModelResponseEvent::MessageDelta(format!(
                    "done: {}",
                    result.content
                )),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ],
            Some(_) if req.tools.is_empty() => {
                return ready(Err(EchoError(ErrorKind::Moderated)));
            }
            Some(_) => vec![
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "call_1".to_owned(),
                    name: req.tools[0].name.clone(),
                    arguments: json!({ "memo": "hello" }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ],
        };
        ready(Ok(QueuedResponse(events.into())))
    }
}

async fn drain(
    resp: QueuedResponse,
) -> (String, Vec<ToolCallRequest>, Option<ModelFinishReason>) {
    let mut resp = resp;
    let mut text = String::new();
    let mut calls = vec![];
    let mut reason = None;
    while let Some(event) =
        poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx))
            .await
            .unwrap()
    {
        match event {
            ModelResponseEvent::MessageDelta(delta) => text.push_str(&delta),
            ModelResponseEvent::ToolCall(call) => calls.push(call),
            ModelResponseEvent::Completed(r) => reason = Some(r),
        }
    }
    (text, calls, reason)
}

#[tokio::test]
async fn test_tool_round_trip() {
    let provider = TopicModel;
    let mut req = ModelRequest {
        messages: vec![ModelMessage::User("make a topic".to_owned())],
        tools: vec![ModelTool {
            name: "CMD_HCS_CREATE_TOPIC".to_owned(),
            description: "create a new HCS Topic".to_owned(),
            parameters: json!({ "type": "object" }),
        }],
    };

    let resp = provider.send_request(&req).await.unwrap();
    let (text, calls, reason) = drain(resp).await;
    assert!(text.is_empty());
    assert_eq!(reason, Some(ModelFinishReason::ToolCalls));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "CMD_HCS_CREATE_TOPIC");

    req.messages.push(ModelMessage::Tool(ToolCallResult {
        id: calls[0].id.clone(),
        content: "0.0.1234".to_owned(),
    }));
    let resp = provider.send_request(&req).await.unwrap();
    let (text, calls, reason) = drain(resp).await;
    assert_eq!(text, "done: 0.0.1234");
    assert!(calls.is_empty());
    assert_eq!(reason, Some(ModelFinishReason::Stop));
}

#[tokio::test]
async fn test_error_kind() {
    let provider = TopicModel;
    let err = provider
        .send_request(&ModelRequest::default())
        .await
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Other);

    let req = ModelRequest {
        messages: vec![ModelMessage::User("hi".to_owned())],
        tools: vec![],
    };
    let err = provider.send_request(&req).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Moderated);
}
