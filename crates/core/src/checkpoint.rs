//! Per-thread conversation storage.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::conversation::Conversation;

/// The error type returned by a [`Checkpointer`].
pub type CheckpointError = Box<dyn StdError + Send + Sync + 'static>;

/// Stores conversations between agent invocations.
///
/// Each thread id owns an independent conversation. Loading a thread
/// that was never saved yields `None`.
#[async_trait]
pub trait Checkpointer: Send + Sync + 'static {
    /// Loads the conversation of a thread.
    async fn load(
        &self,
        thread_id: &str,
    ) -> Result<Option<Conversation>, CheckpointError>;

    /// Replaces the conversation of a thread.
    async fn save(
        &self,
        thread_id: &str,
        conversation: Conversation,
    ) -> Result<(), CheckpointError>;
}

#[async_trait]
impl<T: Checkpointer + ?Sized> Checkpointer for Arc<T> {
    async fn load(
        &self,
        thread_id: &str,
    ) -> Result<Option<Conversation>, CheckpointError> {
        (**self).load(thread_id).await
    }

    async fn save(
        &self,
        thread_id: &str,
        conversation: Conversation,
    ) -> Result<(), CheckpointError> {
        (**self).save(thread_id, conversation).await
    }
}

/// A [`Checkpointer`] that keeps everything in memory.
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: RwLock<HashMap<String, Conversation>>,
}

impl MemoryCheckpointer {
    /// Creates an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn load(
        &self,
        thread_id: &str,
    ) -> Result<Option<Conversation>, CheckpointError> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(
        &self,
        thread_id: &str,
        conversation: Conversation,
    ) -> Result<(), CheckpointError> {
        trace!(
            "saving {} items for thread {thread_id}",
            conversation.items.len()
        );
        self.threads
            .write()
            .await
            .insert(thread_id.to_owned(), conversation);
        Ok(())
    }
}
