use std::{collections::HashMap, path::Path};

use async_trait::async_trait;

use crate::config::StackOutputs;
use crate::error::ConfigError;
use crate::ports::OutputSource;

/// Stack outputs held in memory, typically loaded from a JSON document of
/// the form `{"<stack>": {"<OutputKey>": "<value>"}}`.
#[derive(Debug, Clone, Default)]
pub struct StaticOutputs {
    stacks: HashMap<String, StackOutputs>,
}

impl StaticOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack<I, K, V>(mut self, stack: impl Into<String>, outputs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.insert(stack, outputs);
        self
    }

    pub fn insert<I, K, V>(&mut self, stack: impl Into<String>, outputs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let outputs = outputs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.stacks.insert(stack.into(), outputs);
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let stacks: HashMap<String, StackOutputs> =
            serde_json::from_str(raw).map_err(|e| ConfigError::Source(e.to_string()))?;
        Ok(Self { stacks })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Source(format!("{}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

#[async_trait]
impl OutputSource for StaticOutputs {
    async fn outputs(&self, stack: &str) -> Result<StackOutputs, ConfigError> {
        self.stacks
            .get(stack)
            .cloned()
            .ok_or_else(|| ConfigError::StackNotFound {
                stack: stack.to_string(),
            })
    }
}
