//! Command line arguments.
//!
//! Every setting falls back to an environment variable, so a `.env` file
//! is enough to run the agent.

use clap::Parser;
use hcs_agent::DEFAULT_THREAD_ID;
use hcs_agent::config::{ConfigError, HederaConfig, LlmConfig};

/// Chat with an agent that can create HCS topics and submit messages to
/// them.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Model name; its prefix before `/` picks the protocol
    #[arg(long = "model", env = "OPENROUTER_MODEL")]
    pub model: String,

    /// Base URL of the LLM endpoint
    #[arg(long = "base-url", env = "OPENROUTER_BASE_URL")]
    pub base_url: Option<String>,

    /// API key of the LLM endpoint
    #[arg(long = "api-key", env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Protocol of the LLM endpoint: openai or anthropic
    #[arg(long = "llm-type", env = "OPENROUTER_LLM_TYPE")]
    pub llm_type: Option<String>,

    /// Upper bound of generated tokens per model call
    #[arg(long = "max-tokens", default_value = "1000")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[arg(long = "temperature", default_value = "0.9")]
    pub temperature: f32,

    /// Operator account id, such as 0.0.1234
    #[arg(long = "account-id", env = "HEDERA_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// Operator private key
    #[arg(
        long = "private-key",
        env = "HEDERA_ACCOUNT_PRIVATE_KEY",
        hide_env_values = true
    )]
    pub private_key: Option<String>,

    /// Network: testnet, mainnet, previewnet or localnode
    #[arg(long = "network", env = "HEDERA_ACCOUNT_NETWORK")]
    pub network: Option<String>,

    /// Private key type: ECDSA or EDDSA
    #[arg(long = "private-key-type", env = "HEDERA_ACCOUNT_PRIVATE_KEY_TYPE")]
    pub private_key_type: Option<String>,

    /// Conversation thread to keep history in
    #[arg(long = "thread-id", default_value = DEFAULT_THREAD_ID)]
    pub thread_id: String,

    /// Instructions that open the conversation
    #[arg(long = "system-prompt", env = "HCS_AGENT_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,
}

impl Args {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            llm_type: self.llm_type.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    pub fn hedera_config(&self) -> Result<HederaConfig, ConfigError> {
        HederaConfig::from_parts(
            self.account_id.clone(),
            self.private_key.clone(),
            self.network.as_deref(),
            self.private_key_type.as_deref(),
        )
    }
}
