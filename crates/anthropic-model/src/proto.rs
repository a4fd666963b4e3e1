use hcs_agent_model::{ModelMessage, ModelRequest, ModelTool};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::AnthropicConfig;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    // Thinking and other block types are dropped on replay.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessagesResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    pub r#type: String,
    pub message: String,
}

pub fn create_request(
    req: &ModelRequest,
    config: &AnthropicConfig,
) -> MessagesRequest {
    let mut system_parts = vec![];
    let mut messages: Vec<Message> = vec![];

    for msg in &req.messages {
        let (role, block) = match msg {
            ModelMessage::System(text) => {
                system_parts.push(text.as_str());
                continue;
            }
            ModelMessage::User(text) => {
                (Role::User, ContentBlock::Text { text: text.clone() })
            }
            // The API rejects empty assistant turns, so they are dropped.
            ModelMessage::Assistant(text) if text.is_empty() => continue,
            ModelMessage::Assistant(text) => {
                (Role::Assistant, ContentBlock::Text { text: text.clone() })
            }
            ModelMessage::Tool(result) => (
                Role::User,
                ContentBlock::ToolResult {
                    tool_use_id: result.id.clone(),
                    content: result.content.clone(),
                },
            ),
            ModelMessage::Opaque(opaque) => {
                match opaque.to_raw::<Message>() {
                    Some(raw) if raw.content.is_empty() => {
                        debug!("skipping empty message: {opaque:?}");
                    }
                    Some(raw) => messages.push(raw.clone()),
                    None => warn!("foreign opaque message: {opaque:?}"),
                }
                continue;
            }
        };

        // Tool results for one assistant turn travel in a single user
        // message.
        let is_tool_result = matches!(block, ContentBlock::ToolResult { .. });
        match messages.last_mut() {
            Some(last) if is_tool_result && is_tool_result_message(last) => {
                last.content.push(block);
            }
            _ => messages.push(Message {
                role,
                content: vec![block],
            }),
        }
    }

    MessagesRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n")),
        messages,
        tools: req.tools.iter().map(create_tool).collect(),
    }
}

fn is_tool_result_message(msg: &Message) -> bool {
    msg.role == Role::User
        && msg
            .content
            .iter()
            .all(|b| matches!(b, ContentBlock::ToolResult { .. }))
}

fn create_tool(tool: &ModelTool) -> Tool {
    Tool {
        name: tool.name.clone(),
        description: tool.description.clone(),
        input_schema: tool.parameters.clone(),
    }
}
