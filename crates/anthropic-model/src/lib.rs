//! A model provider for the Anthropic Messages API.
//!
//! Requests are sent without streaming; the finished message is replayed
//! through [`ModelResponse`] so the agent sees the same event sequence
//! it gets from streaming providers.

#[macro_use]
extern crate tracing;

mod config;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use hcs_agent_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, Response};

pub use config::{AnthropicConfig, AnthropicConfigBuilder};
use proto::{ErrorResponse, MessagesResponse};
pub use response::AnthropicResponse;

const API_VERSION: &str = "2023-06-01";

/// Error type for [`AnthropicProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Anthropic Messages API provider.
#[derive(Clone, Debug)]
pub struct AnthropicProvider {
    client: Client,
    config: Arc<AnthropicConfig>,
}

impl AnthropicProvider {
    /// Creates a new `AnthropicProvider` with the given configuration.
    #[inline]
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

impl ModelProvider for AnthropicProvider {
    type Error = Error;
    type Response = AnthropicResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let body = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("request failed: {err}"), ErrorKind::Other)
            })?;
            let body = read_body(resp).await?;
            trace!("got message: {body:?}");
            Ok(AnthropicResponse::from_body(body))
        }
    }
}

async fn read_body(resp: Response) -> Result<MessagesResponse, Error> {
    let status = resp.status();
    let text = resp.text().await.map_err(|err| {
        Error::new(format!("failed to read body: {err}"), ErrorKind::Other)
    })?;

    if !status.is_success() {
        error!("messages request failed with {status}: {text}");
        let kind = ErrorKind::from_status(status.as_u16());
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(ErrorResponse { error }) => {
                format!("{} ({status}): {}", error.r#type, error.message)
            }
            Err(_) => format!("messages request failed with {status}: {text}"),
        };
        return Err(Error::new(message, kind));
    }

    serde_json::from_str(&text).map_err(|err| {
        Error::new(format!("malformed response: {err}"), ErrorKind::Other)
    })
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use hcs_agent_model::{ModelMessage, ModelResponse, ModelResponseEvent};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> AnthropicProvider {
        AnthropicProvider::new(
            AnthropicConfigBuilder::with_api_key("test-key")
                .with_base_url(server.uri())
                .with_model("anthropic/claude-3.5-haiku")
                .build(),
        )
    }

    fn hello_request() -> ModelRequest {
        ModelRequest {
            messages: vec![ModelMessage::User("Hello".to_owned())],
            tools: vec![],
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{ "type": "text", "text": "Hello there" }],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider_for(&server)
            .send_request(&hello_request())
            .await
            .unwrap();
        let mut resp = pin!(resp);
        let first = poll_fn(|cx| resp.as_mut().poll_next_event(cx))
            .await
            .unwrap();
        assert_eq!(
            first,
            Some(ModelResponseEvent::MessageDelta("Hello there".to_owned()))
        );
        assert_eq!(resp.make_opaque_message().unwrap().id(), "msg_1");
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "type": "error",
                "error": {
                    "type": "rate_limit_error",
                    "message": "Number of requests has exceeded your rate limit"
                }
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send_request(&hello_request())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert!(err.message().starts_with("rate_limit_error (429"));
    }
}
