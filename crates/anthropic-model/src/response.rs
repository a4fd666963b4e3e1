use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use hcs_agent_model::{
    ModelFinishReason, ModelResponse, ModelResponseEvent, OpaqueMessage,
    ToolCallRequest,
};

use crate::proto::{ContentBlock, Message, MessagesResponse, Role};

/// A completed Messages API response, replayed as events.
pub struct AnthropicResponse {
    events: VecDeque<ModelResponseEvent>,
    message: OpaqueMessage,
}

impl AnthropicResponse {
    pub(crate) fn from_body(body: MessagesResponse) -> Self {
        let mut texts = vec![];
        let mut events = VecDeque::new();
        let mut tool_calls = vec![];
        let mut kept = vec![];

        for block in body.content {
            match &block {
                ContentBlock::Text { text } => texts.push(text.clone()),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ModelResponseEvent::ToolCall(
                        ToolCallRequest {
                            id: id.clone(),
                            name: name.clone(),
                            arguments: input.clone(),
                        },
                    ));
                }
                ContentBlock::ToolResult { .. } | ContentBlock::Unknown => {
                    continue;
                }
            }
            kept.push(block);
        }

        if !texts.is_empty() {
            events.push_back(ModelResponseEvent::MessageDelta(texts.join("\n")));
        }
        let has_tool_calls = !tool_calls.is_empty();
        events.extend(tool_calls);
        let reason = match body.stop_reason.as_deref() {
            Some("tool_use") => ModelFinishReason::ToolCalls,
            Some("max_tokens") => ModelFinishReason::Length,
            _ if has_tool_calls => ModelFinishReason::ToolCalls,
            _ => ModelFinishReason::Stop,
        };
        events.push_back(ModelResponseEvent::Completed(reason));

        let message = OpaqueMessage::new(
            body.id,
            Message {
                role: Role::Assistant,
                content: kept,
            },
        );
        Self { events, message }
    }
}

impl ModelResponse for AnthropicResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }

    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        Some(self.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn drain(mut resp: AnthropicResponse) -> Vec<ModelResponseEvent> {
        resp.events.drain(..).collect()
    }

    #[test]
    fn test_text_blocks_are_joined() {
        let body: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "content": [
                { "type": "text", "text": "Topic created." },
                { "type": "text", "text": "Its id is 0.0.42." }
            ],
            "stop_reason": "end_turn"
        }))
        .unwrap();
        assert_eq!(
            drain(AnthropicResponse::from_body(body)),
            vec![
                ModelResponseEvent::MessageDelta(
                    "Topic created.\nIts id is 0.0.42.".to_owned()
                ),
                ModelResponseEvent::Completed(ModelFinishReason::Stop),
            ]
        );
    }

    #[test]
    fn test_tool_use() {
        let body: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_2",
            "content": [
                { "type": "thinking", "thinking": "...", "signature": "s" },
                {
                    "type": "tool_use",
                    "id": "toolu_1",
                    "name": "CMD_HCS_SUBMIT_TOPIC_MESSAGE",
                    "input": { "topicId": "0.0.42", "message": "gm" }
                }
            ],
            "stop_reason": "tool_use"
        }))
        .unwrap();
        let resp = AnthropicResponse::from_body(body);

        let opaque = resp.make_opaque_message().unwrap();
        let raw = opaque.to_raw::<Message>().unwrap();
        assert_eq!(raw.content.len(), 1);

        assert_eq!(
            drain(resp),
            vec![
                ModelResponseEvent::ToolCall(ToolCallRequest {
                    id: "toolu_1".to_owned(),
                    name: "CMD_HCS_SUBMIT_TOPIC_MESSAGE".to_owned(),
                    arguments: json!({ "topicId": "0.0.42", "message": "gm" }),
                }),
                ModelResponseEvent::Completed(ModelFinishReason::ToolCalls),
            ]
        );
    }
}
