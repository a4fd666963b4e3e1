//! A model provider for OpenAI-compatible chat completion APIs.
//!
//! Works with OpenAI itself and with gateways speaking the same
//! protocol, such as OpenRouter. Responses are always streamed.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use hcs_agent_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use mime::Mime;
use reqwest::{Client, Response, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use io::{Chunks, Sse};
pub use response::OpenAIResponse;

/// Error type for [`OpenAIProvider`].
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

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;
    type Response = OpenAIResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "text/event-stream")
            .json(&openai_req)
            .send();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("request failed: {err}"), ErrorKind::Other)
            })?;
            let resp = check_status(resp).await?;

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| m.subtype().as_str() == "event-stream")
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            let sse = Sse::new(Chunks::from_response(resp));
            Ok(OpenAIResponse::from_sse(sse))
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    error!("chat completion failed with {status}: {body}");
    Err(Error::new(
        format!("chat completion failed with {status}: {body}"),
        ErrorKind::from_status(status.as_u16()),
    ))
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use hcs_agent_model::{ModelMessage, ModelResponse, ModelResponseEvent};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider_for(server: &MockServer) -> OpenAIProvider {
        OpenAIProvider::new(
            OpenAIConfigBuilder::with_api_key("test-key")
                .with_base_url(server.uri())
                .with_model("openai/gpt-4o-mini")
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
    async fn test_streamed_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "openai/gpt-4o-mini",
                "stream": true
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(
                    "data: {\"id\":\"gen-9\",\"choices\":[{\"delta\":{\"content\":\"Hi!\"},\"finish_reason\":\"stop\"}]}\n\ndata: [DONE]\n\n",
                    "text/event-stream",
                ),
            )
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
            Some(ModelResponseEvent::MessageDelta("Hi!".to_owned()))
        );
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string("invalid key"),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send_request(&hello_request())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(err.message().contains("invalid key"));
    }

    #[tokio::test]
    async fn test_rejects_non_stream_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "x" })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .send_request(&hello_request())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.message().starts_with("unexpected content type"));
    }
}
