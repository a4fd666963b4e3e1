use serde_json::Value;

use crate::OpaqueMessage;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The conversation so far, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools the model may call.
    pub tools: Vec<ModelTool>,
}

/// A complete message in the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// System instructions.
    System(String),
    /// Text typed by the user.
    User(String),
    /// Plain assistant text.
    Assistant(String),
    /// The result of a tool call.
    Tool(ToolCallResult),
    /// A provider-native message, usually a past assistant turn.
    Opaque(OpaqueMessage),
}

/// The result of calling a tool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ToolCallResult {
    /// The id of the tool call this result answers.
    pub id: String,
    /// The tool output as text.
    pub content: String,
}

/// Describes a tool the model can use.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// A [JSON schema](https://json-schema.org/) object describing the
    /// arguments.
    pub parameters: Value,
}
