//! Access to the consensus service of the ledger.

mod hedera_client;

use serde::Serialize;
use thiserror::Error;

pub use hedera_client::HederaLedger;

/// Errors returned by a [`Ledger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The frozen transaction carries no id.
    #[error("Transaction ID is null")]
    MissingTransactionId,
    /// The receipt names no topic.
    #[error("Topic ID is null")]
    MissingTopicId,
    /// The receipt carries no sequence number.
    #[error("Topic sequence number is null")]
    MissingSequenceNumber,
    /// The topic id does not parse.
    #[error("invalid topic id `{0}`")]
    InvalidTopicId(String),
    /// The SDK rejected or failed the transaction.
    #[error(transparent)]
    Sdk(#[from] hedera::Error),
}

/// The outcome of creating a topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCreated {
    /// Id of the create transaction.
    pub tx_id: String,
    /// Id of the new topic, with its network checksum when known.
    pub topic_id: String,
}

/// The outcome of submitting a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSubmitted {
    /// Id of the submit transaction.
    pub tx_id: String,
    /// Position of the message in the topic, starting at 1.
    pub topic_sequence_number: u64,
}

/// A ledger that can create consensus topics and append messages to them.
///
/// The returned futures must not borrow `self`, so implementations keep
/// their client behind a cheaply clonable handle.
pub trait Ledger: Send + Sync + 'static {
    /// Creates a topic with the given memo.
    fn create_topic(
        &self,
        memo: String,
    ) -> impl Future<Output = Result<TopicCreated, LedgerError>> + Send + 'static;

    /// Submits a message to an existing topic.
    fn submit_topic_message(
        &self,
        topic_id: String,
        message: String,
    ) -> impl Future<Output = Result<MessageSubmitted, LedgerError>> + Send + 'static;
}
