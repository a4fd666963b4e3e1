use std::pin::Pin;
use std::task::{self, Poll};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::OpaqueMessage;
use crate::provider::ModelProviderError;

/// A response from the model provider.
pub trait ModelResponse: Sized + Send + 'static {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Attempts to pull out the next event from the response.
    ///
    /// # Return value
    ///
    /// - `Poll::Pending` means the next event is not ready yet. The
    ///   current task will be woken when it may be.
    /// - `Poll::Ready(Ok(Some(event)))` delivers an event. More may
    ///   follow.
    /// - `Poll::Ready(Ok(None))` means the response has completed.
    /// - `Poll::Ready(Err(error))` means the response failed.
    ///
    /// Calling this method after completion returns `Ok(None)`.
    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>>;

    /// Makes an [`OpaqueMessage`] holding the full assistant turn.
    ///
    /// Only meaningful after all events have been pulled. Repeated calls
    /// return the same message.
    fn make_opaque_message(&self) -> Option<OpaqueMessage> {
        None
    }
}

/// Why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model wants tool results before continuing.
    ToolCalls,
    /// The model has finished generating text.
    Stop,
    /// The output token limit was hit.
    Length,
}

/// A tool call requested by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// The unique identifier for the tool call request.
    pub id: String,
    /// The name of the tool to call.
    pub name: String,
    /// The decoded JSON arguments.
    pub arguments: Value,
}

/// An event from a model response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelResponseEvent {
    /// The response has been completed.
    Completed(ModelFinishReason),
    /// Received a piece of assistant text.
    MessageDelta(String),
    /// Received a complete tool call request.
    ToolCall(ToolCallRequest),
}
