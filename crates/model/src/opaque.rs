use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A provider-native history message.
///
/// Providers often need more than plain text to replay a turn, e.g. the
/// exact tool call payload the model produced. They wrap that payload in
/// an `OpaqueMessage`, the agent stores it in the conversation untouched,
/// and the provider downcasts it back when building the next request.
///
/// Two opaque messages are equal when their ids are equal.
#[derive(Clone)]
pub struct OpaqueMessage {
    id: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl OpaqueMessage {
    /// Wraps `value` under the given id.
    ///
    /// The id should be unique within a conversation.
    #[inline]
    pub fn new<ID, T>(id: ID, value: T) -> Self
    where
        ID: Into<String>,
        T: Send + Sync + 'static,
    {
        Self {
            id: Arc::from(id.into()),
            value: Arc::new(value),
        }
    }

    /// Returns the id of this message.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Downcasts to the provider's raw type.
    #[inline]
    pub fn to_raw<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl Debug for OpaqueMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OpaqueMessage").field(&self.id).finish()
    }
}

impl PartialEq for OpaqueMessage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for OpaqueMessage {}

impl Hash for OpaqueMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
