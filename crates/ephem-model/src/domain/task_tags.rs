use serde::{Deserialize, Serialize};

use crate::{KeyValue, TAG_REQUESTER};

/// Tag set attached to a task.
///
/// Stored as a list of key–value pairs and serialized as a transparent array,
/// matching how the orchestration platform reports resource tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTags(pub Vec<KeyValue>);

impl TaskTags {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValue> {
        self.0.iter()
    }

    /// Get the value for a key, returning the last matching entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|kv| kv.key() == key)
            .map(|kv| kv.value())
    }

    /// Append a tag. Later entries win when queried via [`TaskTags::get`].
    pub fn push<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.push(KeyValue::new(key, value));
    }

    /// Builder-style [`TaskTags::push`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.push(key, value);
        self
    }

    /// Returns `true` if any requester tag on the task equals `requester`.
    ///
    /// All entries are checked, not only the last one: a task tagged twice is
    /// owned by both identities as far as the one-task rule is concerned.
    pub fn is_owned_by(&self, requester: &str) -> bool {
        self.0
            .iter()
            .any(|kv| kv.key() == TAG_REQUESTER && kv.value() == requester)
    }
}

impl Default for TaskTags {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<KeyValue> for TaskTags {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
