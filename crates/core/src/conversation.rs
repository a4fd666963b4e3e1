//! Conversation-related types.

use hcs_agent_model::ModelMessage;

/// Represents a conversation.
#[derive(Clone, Default, Debug)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    /// Returns `true` if nothing has been said in this conversation yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the items of this conversation, oldest first.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: ModelMessage, transcript: String) {
        self.items.push(Item { msg, transcript });
    }

    pub(crate) fn messages(&self) -> Vec<ModelMessage> {
        self.items.iter().map(|item| item.msg.clone()).collect()
    }
}

/// An item in the conversation.
#[derive(Clone, Debug)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
}

impl Item {
    /// Returns the message carried by this item.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }

    /// Returns the transcript of this item.
    ///
    /// The transcript is a string representation of the message item,
    /// which can be exported later. But transcript alone is not enough
    /// to reconstruct the message item.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}
