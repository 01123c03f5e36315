//! Tool registry and the built-in tools

pub mod database;
pub mod delegation;
pub mod general;
pub mod master;
pub mod search;

pub use database::{BotDatabaseClient, ExecuteBotDatabaseTool, GetBotDatabaseSchemaTool, QueryBotDatabaseTool};
pub use delegation::{AskSpecializedAgentTool, GetAvailableAgentsTool};
pub use general::ChatWithModelTool;
pub use master::{GetAvailableToolsTool, GetSystemStatusTool};
pub use search::SearchGoogleTool;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info, warn};
use zai_provider::{object_schema, Param, Tool};

use crate::AgentError;

/// Result every tool produces
pub type ToolResult = Result<String, Box<dyn std::error::Error + Send + Sync>>;

#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Value;
    fn category(&self) -> Option<&str> {
        None
    }
    async fn execute(&self, args: Value) -> ToolResult;
}

pub fn to_provider_tool(tool: &dyn ToolTrait) -> Tool {
    Tool::new(tool.name(), tool.description(), tool.parameters())
}

/// Deserialize tool arguments, naming the tool on failure
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, AgentError> {
    serde_json::from_value(args)
        .map_err(|e| AgentError::ToolExecution(format!("invalid arguments for {}: {}", tool, e)))
}

/// Summary of one registered tool
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ToolInfo {
    fn of(tool: &dyn ToolTrait) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            parameters: tool.parameters(),
            category: tool.category().map(str::to_string),
        }
    }
}

type SharedTool = Arc<dyn ToolTrait>;

#[derive(Default)]
struct Inner {
    tools: Vec<SharedTool>,
    index: HashMap<String, usize>,
}

/// Shared tool registry, insertion ordered
#[derive(Clone, Default)]
pub struct ToolRegistry {
    inner: Arc<RwLock<Inner>>,
}

/// Non-owning handle for tools that inspect their own registry
#[derive(Clone)]
pub struct WeakToolRegistry {
    inner: Weak<RwLock<Inner>>,
}

impl WeakToolRegistry {
    pub fn upgrade(&self) -> Option<ToolRegistry> {
        self.inner.upgrade().map(|inner| ToolRegistry { inner })
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakToolRegistry {
        WeakToolRegistry {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Register a tool unless one with the same name exists
    pub fn register<T: ToolTrait + 'static>(&self, tool: T) -> bool {
        self.register_shared(Arc::new(tool))
    }

    pub fn register_shared(&self, tool: SharedTool) -> bool {
        let name = tool.name().to_string();
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.index.contains_key(&name) {
            warn!("Tool '{}' already registered, skipping", name);
            return false;
        }

        let position = inner.tools.len();
        inner.tools.push(tool);
        inner.index.insert(name.clone(), position);
        info!("Registered tool '{}'", name);
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<SharedTool> {
        let inner = self.read();
        inner.index.get(name).map(|&i| inner.tools[i].clone())
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().index.contains_key(name)
    }

    /// All tools in registration order
    pub fn list(&self) -> Vec<SharedTool> {
        self.read().tools.clone()
    }

    pub fn find_by_prefix(&self, prefix: &str) -> Vec<SharedTool> {
        self.read()
            .tools
            .iter()
            .filter(|t| t.name().starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn find_by_category(&self, category: &str) -> Vec<SharedTool> {
        self.read()
            .tools
            .iter()
            .filter(|t| t.category() == Some(category))
            .cloned()
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn info(&self) -> Vec<ToolInfo> {
        self.read().tools.iter().map(|t| ToolInfo::of(t.as_ref())).collect()
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.read()
            .tools
            .iter()
            .map(|t| to_provider_tool(t.as_ref()))
            .collect()
    }

    pub async fn execute(&self, name: &str, args: Value) -> ToolResult {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;
        debug!("Executing tool '{}'", name);
        tool.execute(args).await
    }
}

type BoxedFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;
type ToolFn = Arc<dyn Fn(Value) -> BoxedFuture + Send + Sync>;

/// Tool built from a closure and declared parameters
pub struct FnTool {
    name: String,
    description: String,
    params: Vec<Param>,
    category: Option<String>,
    handler: ToolFn,
}

#[async_trait]
impl ToolTrait for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        object_schema(&self.params)
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    async fn execute(&self, args: Value) -> ToolResult {
        (self.handler)(args).await
    }
}

/// Builder for [`FnTool`]
pub struct ToolBuilder {
    name: String,
    description: String,
    params: Vec<Param>,
    category: Option<String>,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            category: None,
        }
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> FnTool
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        FnTool {
            name: self.name,
            description: self.description,
            params: self.params,
            category: self.category,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

/// Shorthand for `ToolBuilder` without a category
pub fn function_tool<F, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    params: Vec<Param>,
    handler: F,
) -> FnTool
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    params
        .into_iter()
        .fold(ToolBuilder::new(name, description), ToolBuilder::param)
        .build(handler)
}
