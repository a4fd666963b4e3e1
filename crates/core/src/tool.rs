//! Tool call support.

mod error;
mod executor;

use std::pin::Pin;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub(crate) use executor::Executor;

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Tools should be stateless. Anything a tool needs at run time, such as
/// a client handle, belongs in the tool value itself and is cloned into
/// the future returned by [`Tool::execute`].
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the JSON schema of the tool input.
    fn parameter_schema(&self) -> &Value;

    /// Executes the tool with the given input.
    ///
    /// The returned future must not borrow `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

type BoxedToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    fn execute(&self, arguments: Value) -> BoxedToolFuture;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn execute(&self, arguments: Value) -> BoxedToolFuture {
        match serde_json::from_value::<T::Input>(arguments) {
            Ok(input) => Box::pin(self.0.execute(input)),
            Err(err) => Box::pin(std::future::ready(Err(
                Error::invalid_input().with_reason(err.to_string()),
            ))),
        }
    }
}
