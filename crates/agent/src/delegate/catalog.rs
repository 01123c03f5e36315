//! Linked-in delegates addressable by module key and entry point

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::envelope::RawOutput;
use super::ResolveError;

/// A delegate callable in the same process
#[async_trait]
pub trait InProcessDelegate: Send + Sync {
    async fn query(
        &self,
        query: &str,
    ) -> Result<RawOutput, Box<dyn std::error::Error + Send + Sync>>;
}

/// Module key -> entry point -> delegate
#[derive(Clone, Default)]
pub struct DelegateCatalog {
    modules: BTreeMap<String, BTreeMap<String, Arc<dyn InProcessDelegate>>>,
}

impl DelegateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        module: impl Into<String>,
        entry_point: impl Into<String>,
        delegate: Arc<dyn InProcessDelegate>,
    ) {
        self.modules
            .entry(module.into())
            .or_default()
            .insert(entry_point.into(), delegate);
    }

    pub fn with(
        mut self,
        module: impl Into<String>,
        entry_point: impl Into<String>,
        delegate: Arc<dyn InProcessDelegate>,
    ) -> Self {
        self.register(module, entry_point, delegate);
        self
    }

    pub fn resolve(
        &self,
        module: &str,
        entry_point: &str,
    ) -> Result<Arc<dyn InProcessDelegate>, ResolveError> {
        let entries = self
            .modules
            .get(module)
            .ok_or_else(|| ResolveError::ModuleUnavailable(module.to_string()))?;

        entries
            .get(entry_point)
            .cloned()
            .ok_or_else(|| ResolveError::EntryPointMissing {
                module: module.to_string(),
                entry_point: entry_point.to_string(),
            })
    }

    pub fn modules(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }
}
