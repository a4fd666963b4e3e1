use hcs_agent_model::ToolCallRequest;
use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PresetEvent {
    /// A piece of assistant text.
    MessageDelta(String),
    /// A tool call request.
    ToolCall(ToolCallRequest),
}

/// The preset response for an assistant step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request fails with this message instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a `PresetResponse` that always fails.
    #[inline]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            events: vec![],
            failure: Some(message.into()),
        }
    }
}
