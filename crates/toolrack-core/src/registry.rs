use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::handler::ToolHandler;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    Duplicate(String),
    #[error("tool name must not be empty")]
    EmptyName,
}

/// Immutable name -> handler table, built once at startup.
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ToolHandler>)> {
        self.handlers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Explicit registration table. Each handler reports its own symbolic name;
/// duplicates are a hard error rather than last-writer-wins.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryBuilder")
            .field("handlers", &self.handlers.keys())
            .finish()
    }
}

impl ToolRegistryBuilder {
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Result<Self, RegistryError> {
        let name = handler.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.handlers.insert(name, handler);
        Ok(self)
    }

    /// An empty registry is legal; failure is deferred to the first lookup.
    pub fn build(self) -> ToolRegistry {
        if self.handlers.is_empty() {
            warn!("no tool handlers registered; every dispatch will return not-found");
        }
        ToolRegistry {
            handlers: self.handlers,
        }
    }
}
