//! Creates the model provider described by an [`LlmConfig`].

use hcs_agent_anthropic_model::{AnthropicConfigBuilder, AnthropicProvider};
use hcs_agent_model::Masked;
use hcs_agent_openai_model::{OpenAIConfigBuilder, OpenAIProvider};

use crate::config::{API_KEY_VISIBLE, ConfigError, LlmConfig, LlmType};

/// A ready-to-use model provider of either protocol.
#[derive(Clone, Debug)]
pub enum LlmClient {
    /// An OpenAI-compatible endpoint.
    OpenAI(OpenAIProvider),
    /// An Anthropic Messages endpoint.
    Anthropic(AnthropicProvider),
}

impl LlmClient {
    /// Picks the protocol and builds the provider.
    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        let llm_type = config.llm_type()?;
        info!(
            model = %config.model,
            base_url = ?config.base_url,
            api_key = %Masked::new(&config.api_key, API_KEY_VISIBLE),
            %llm_type,
            "creating llm client"
        );

        let client = match llm_type {
            LlmType::OpenAI => {
                let mut builder =
                    OpenAIConfigBuilder::with_api_key(&config.api_key)
                        .with_model(&config.model)
                        .with_max_tokens(config.max_tokens)
                        .with_temperature(config.temperature);
                if let Some(base_url) = &config.base_url {
                    builder = builder.with_base_url(base_url);
                }
                LlmClient::OpenAI(OpenAIProvider::new(builder.build()))
            }
            LlmType::Anthropic => {
                let mut builder =
                    AnthropicConfigBuilder::with_api_key(&config.api_key)
                        .with_model(&config.model)
                        .with_max_tokens(config.max_tokens)
                        .with_temperature(config.temperature);
                if let Some(base_url) = &config.base_url {
                    builder = builder.with_base_url(base_url);
                }
                LlmClient::Anthropic(AnthropicProvider::new(builder.build()))
            }
        };
        Ok(client)
    }

    /// Returns the protocol of this client.
    #[inline]
    pub fn llm_type(&self) -> LlmType {
        match self {
            LlmClient::OpenAI(_) => LlmType::OpenAI,
            LlmClient::Anthropic(_) => LlmType::Anthropic,
        }
    }
}
