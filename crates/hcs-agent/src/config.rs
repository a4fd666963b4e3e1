//! Validated settings for the LLM client and the ledger client.

use std::fmt::{self, Debug};
use std::str::FromStr;

use hcs_agent_model::Masked;
use thiserror::Error;

/// How many leading characters of the LLM API key may be logged.
pub const API_KEY_VISIBLE: usize = 12;
/// How many leading characters of the operator private key may be logged.
pub const PRIVATE_KEY_VISIBLE: usize = 5;

/// Errors found while turning raw settings into clients.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The operator account id or private key is not set.
    #[error("Must set env vars: HEDERA_ACCOUNT_ID and HEDERA_ACCOUNT_PRIVATE_KEY")]
    MissingOperator,
    /// The LLM protocol is neither `openai` nor `anthropic`.
    #[error("Unsupported LLM type: {0}")]
    UnsupportedLlmType(String),
    /// The network name is unknown.
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),
    /// The private key type is neither ECDSA nor EDDSA.
    #[error("Unsupported private key type: {0}")]
    UnsupportedPrivateKeyType(String),
    /// The operator account id does not parse.
    #[error("invalid operator account id `{id}`: {source}")]
    InvalidAccountId {
        /// The rejected id.
        id: String,
        /// The parse error.
        #[source]
        source: hedera::Error,
    },
    /// The operator private key does not parse as the configured type.
    #[error("invalid operator private key: {0}")]
    InvalidPrivateKey(#[source] hedera::Error),
    /// The SDK client could not be created.
    #[error("failed to set up the {network} client: {source}")]
    Client {
        /// The network being set up.
        network: Network,
        /// The SDK error.
        #[source]
        source: hedera::Error,
    },
}

/// The wire protocol spoken by the LLM endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LlmType {
    /// OpenAI-compatible chat completions.
    OpenAI,
    /// The Anthropic Messages API.
    Anthropic,
}

impl FromStr for LlmType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(LlmType::OpenAI),
            "anthropic" => Ok(LlmType::Anthropic),
            _ => Err(ConfigError::UnsupportedLlmType(s.to_owned())),
        }
    }
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LlmType::OpenAI => "openai",
            LlmType::Anthropic => "anthropic",
        })
    }
}

/// Settings for the LLM client.
#[derive(Clone, PartialEq)]
pub struct LlmConfig {
    /// Model name, such as `openai/gpt-4o-mini`.
    pub model: String,
    /// Endpoint base URL. Each provider has its own default.
    pub base_url: Option<String>,
    /// The API key sent to the endpoint.
    pub api_key: String,
    /// Explicit protocol. Inferred from the model name when absent.
    pub llm_type: Option<String>,
    /// Upper bound of generated tokens per request.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl LlmConfig {
    /// Resolves the protocol to use.
    ///
    /// Without an explicit type, the part of the model name before the
    /// first `/` decides: `anthropic/claude-3.5-haiku` is spoken to with
    /// the Anthropic protocol.
    pub fn llm_type(&self) -> Result<LlmType, ConfigError> {
        match &self.llm_type {
            Some(llm_type) => llm_type.parse(),
            None => self
                .model
                .split('/')
                .next()
                .unwrap_or_default()
                .parse(),
        }
    }
}

impl Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &Masked::new(&self.api_key, API_KEY_VISIBLE))
            .field("llm_type", &self.llm_type)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// The Hedera network to talk to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Network {
    /// The public test network.
    #[default]
    Testnet,
    /// The production network.
    Mainnet,
    /// The preview network.
    Previewnet,
    /// A local node listening on `127.0.0.1:50211`.
    LocalNode,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "testnet" => Ok(Network::Testnet),
            "mainnet" => Ok(Network::Mainnet),
            "previewnet" => Ok(Network::Previewnet),
            "localnode" => Ok(Network::LocalNode),
            _ => Err(ConfigError::UnsupportedNetwork(s.to_owned())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
            Network::Previewnet => "previewnet",
            Network::LocalNode => "localnode",
        })
    }
}

/// The encoding of the operator private key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PrivateKeyType {
    /// A secp256k1 ECDSA key.
    #[default]
    Ecdsa,
    /// An Ed25519 key.
    Eddsa,
}

impl FromStr for PrivateKeyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ecdsa" => Ok(PrivateKeyType::Ecdsa),
            "eddsa" => Ok(PrivateKeyType::Eddsa),
            _ => Err(ConfigError::UnsupportedPrivateKeyType(s.to_owned())),
        }
    }
}

/// Settings for the ledger client.
#[derive(Clone, PartialEq, Eq)]
pub struct HederaConfig {
    /// Operator account id, such as `0.0.1234`.
    pub account_id: String,
    /// Operator private key, hex or DER encoded.
    pub private_key: String,
    /// Network to connect to.
    pub network: Network,
    /// How to decode `private_key`.
    pub private_key_type: PrivateKeyType,
}

impl HederaConfig {
    /// Validates raw settings.
    ///
    /// Unset network and key type fall back to testnet and ECDSA.
    pub fn from_parts(
        account_id: Option<String>,
        private_key: Option<String>,
        network: Option<&str>,
        private_key_type: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let network: Network = network.map(str::parse).transpose()?.unwrap_or_default();
        let private_key_type: PrivateKeyType = private_key_type
            .map(str::parse)
            .transpose()?
            .unwrap_or_default();
        match (account_id, private_key) {
            (Some(account_id), Some(private_key))
                if !account_id.is_empty() && !private_key.is_empty() =>
            {
                Ok(Self {
                    account_id,
                    private_key,
                    network,
                    private_key_type,
                })
            }
            _ => Err(ConfigError::MissingOperator),
        }
    }
}

impl Debug for HederaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HederaConfig")
            .field("network", &self.network)
            .field("account_id", &self.account_id)
            .field(
                "private_key",
                &Masked::new(&self.private_key, PRIVATE_KEY_VISIBLE),
            )
            .field("private_key_type", &self.private_key_type)
            .finish()
    }
}
