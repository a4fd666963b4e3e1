use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::str::FromStr;

use hcs_agent_model::Masked;
use hedera::{
    AccountId, Client, Hbar, PrivateKey, TopicCreateTransaction, TopicId,
    TopicMessageSubmitTransaction, TransactionId,
};

use super::{Ledger, LedgerError, MessageSubmitted, TopicCreated};
use crate::config::{
    ConfigError, HederaConfig, Network, PRIVATE_KEY_VISIBLE, PrivateKeyType,
};

const LOCAL_NODE_ADDRESS: &str = "127.0.0.1:50211";
const LOCAL_NODE_ACCOUNT: u64 = 3;
const MAX_QUERY_PAYMENT_HBAR: i64 = 50;
const MAX_TRANSACTION_FEE_HBAR: i64 = 100;

/// A [`Ledger`] backed by the Hedera SDK.
///
/// Every operation is a single transaction: build, freeze, sign with the
/// operator key, execute, then wait for the receipt.
#[derive(Clone)]
pub struct HederaLedger {
    client: Client,
    network: Network,
}

impl HederaLedger {
    /// Creates an SDK client for the configured network and operator.
    pub fn new(config: &HederaConfig) -> Result<Self, ConfigError> {
        info!(
            network = %config.network,
            account_id = %config.account_id,
            private_key = %Masked::new(&config.private_key, PRIVATE_KEY_VISIBLE),
            private_key_type = ?config.private_key_type,
            "creating hedera client"
        );

        let operator_id =
            AccountId::from_str(&config.account_id).map_err(|source| {
                ConfigError::InvalidAccountId {
                    id: config.account_id.clone(),
                    source,
                }
            })?;
        let operator_key = match config.private_key_type {
            PrivateKeyType::Ecdsa => {
                PrivateKey::from_str_ecdsa(&config.private_key)
            }
            PrivateKeyType::Eddsa => {
                PrivateKey::from_str_ed25519(&config.private_key)
            }
        }
        .map_err(ConfigError::InvalidPrivateKey)?;

        let client = match config.network {
            Network::Testnet => Client::for_testnet(),
            Network::Mainnet => Client::for_mainnet(),
            Network::Previewnet => Client::for_previewnet(),
            Network::LocalNode => Client::for_network(HashMap::from([(
                LOCAL_NODE_ADDRESS.to_owned(),
                AccountId::new(0, 0, LOCAL_NODE_ACCOUNT),
            )]))
            .map_err(|source| ConfigError::Client {
                network: config.network,
                source,
            })?,
        };
        client.set_operator(operator_id, operator_key);
        client.set_default_max_query_payment(Hbar::new(MAX_QUERY_PAYMENT_HBAR));
        client.set_default_max_transaction_fee(Hbar::new(
            MAX_TRANSACTION_FEE_HBAR,
        ));

        Ok(Self {
            client,
            network: config.network,
        })
    }

    /// Returns the network this ledger talks to.
    #[inline]
    pub fn network(&self) -> Network {
        self.network
    }
}

impl Debug for HederaLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HederaLedger")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

impl Ledger for HederaLedger {
    fn create_topic(
        &self,
        memo: String,
    ) -> impl Future<Output = Result<TopicCreated, LedgerError>> + Send + 'static
    {
        let client = self.client.clone();
        async move {
            let mut tx = TopicCreateTransaction::new();
            tx.topic_memo(memo).freeze_with(&client)?;
            let tx_id = transaction_id(tx.get_transaction_id())?;
            tx.sign_with_operator(&client)?;

            let receipt = tx.execute(&client).await?.get_receipt(&client).await?;
            let topic_id = receipt.topic_id.ok_or(LedgerError::MissingTopicId)?;
            let topic_id = display_topic_id(topic_id, &client);
            debug!("created topic {topic_id} in {tx_id}");

            Ok(TopicCreated { tx_id, topic_id })
        }
    }

    fn submit_topic_message(
        &self,
        topic_id: String,
        message: String,
    ) -> impl Future<Output = Result<MessageSubmitted, LedgerError>> + Send + 'static
    {
        let client = self.client.clone();
        async move {
            let parsed_topic_id = TopicId::from_str(&topic_id)
                .map_err(|_| LedgerError::InvalidTopicId(topic_id.clone()))?;

            let mut tx = TopicMessageSubmitTransaction::new();
            tx.topic_id(parsed_topic_id)
                .message(message.into_bytes())
                .freeze_with(&client)?;
            let tx_id = transaction_id(tx.get_transaction_id())?;
            tx.sign_with_operator(&client)?;

            let receipt = tx.execute(&client).await?.get_receipt(&client).await?;
            let topic_sequence_number =
                sequence_number(receipt.topic_sequence_number)?;
            debug!("message {topic_sequence_number} on {topic_id} in {tx_id}");

            Ok(MessageSubmitted {
                tx_id,
                topic_sequence_number,
            })
        }
    }
}

/// Renders a topic id with the network checksum, or plain when the client
/// has no ledger id to derive one from.
fn display_topic_id(topic_id: TopicId, client: &Client) -> String {
    topic_id
        .to_string_with_checksum(client)
        .unwrap_or_else(|err| {
            debug!("no checksum for {topic_id}: {err}");
            topic_id.to_string()
        })
}

// Sequence numbers start at 1, so 0 means the field was absent.
fn sequence_number(n: u64) -> Result<u64, LedgerError> {
    match n {
        0 => Err(LedgerError::MissingSequenceNumber),
        n => Ok(n),
    }
}

fn transaction_id(id: Option<TransactionId>) -> Result<String, LedgerError> {
    id.map(|id| id.to_string())
        .ok_or(LedgerError::MissingTransactionId)
}
