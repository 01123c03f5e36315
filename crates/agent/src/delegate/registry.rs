//! Agent registry: resolution state per agent and invocation by name

use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{error, info, warn};

use super::catalog::DelegateCatalog;
use super::envelope::{coerce, Envelope};
use super::transport::{DelegateTransport, InProcessTransport, SubprocessTransport};
use super::{format_timeout, ResolveError, TransportError, TransportKind};
use crate::preview;

/// Resolution state of a registered agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Uninitialized,
    Ready,
    Failed,
}

impl AgentState {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentState::Uninitialized => "uninitialized",
            AgentState::Ready => "ready",
            AgentState::Failed => "failed",
        }
    }
}

/// Declaration of one delegate agent
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub kind: TransportKind,
    /// Module key or launcher script path
    pub location: String,
    /// Entry point name or argv template
    pub entry_point: String,
    pub description: String,
    pub categories: Vec<String>,
    pub timeout: Duration,
}

impl AgentSpec {
    pub fn in_process(
        name: impl Into<String>,
        module: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: TransportKind::InProcess,
            location: module.into(),
            entry_point: entry_point.into(),
            description: String::new(),
            categories: Vec::new(),
            timeout: Duration::from_secs(180),
        }
    }

    pub fn subprocess(
        name: impl Into<String>,
        script: impl Into<String>,
        launcher: impl Into<String>,
    ) -> Self {
        Self {
            kind: TransportKind::Subprocess,
            ..Self::in_process(name, script, launcher)
        }
    }

    pub fn from_config(agent: &zai_config::AgentConfig, default_timeout_secs: u64) -> Self {
        Self {
            name: agent.name.clone(),
            kind: agent.transport.into(),
            location: agent.location.clone(),
            entry_point: agent.entry_point.clone(),
            description: agent.description.clone(),
            categories: agent.categories.clone(),
            timeout: Duration::from_secs(agent.timeout_secs.unwrap_or(default_timeout_secs)),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Public view of a registered agent
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub categories: Vec<String>,
    pub transport: TransportKind,
    pub state: AgentState,
    pub is_initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct AgentDescriptor {
    spec: AgentSpec,
    state: AgentState,
    last_error: Option<String>,
    transport: Option<Arc<dyn DelegateTransport>>,
}

impl AgentDescriptor {
    fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.spec.name.clone(),
            description: self.spec.description.clone(),
            categories: self.spec.categories.clone(),
            transport: self.spec.kind,
            state: self.state,
            is_initialized: self.state == AgentState::Ready,
            error: self.last_error.clone(),
        }
    }
}

/// Case-insensitive dedup keeping the first spelling and order
fn dedup_categories(categories: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for category in categories {
        let category = category.trim().to_string();
        let key = category.to_lowercase();
        if category.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(category);
    }
    out
}

/// Registry of delegate agents
pub struct AgentRegistry {
    catalog: DelegateCatalog,
    agents: RwLock<Vec<AgentDescriptor>>,
}

impl AgentRegistry {
    pub fn new(catalog: DelegateCatalog) -> Self {
        Self {
            catalog,
            agents: RwLock::new(Vec::new()),
        }
    }

    pub fn catalog(&self) -> &DelegateCatalog {
        &self.catalog
    }

    fn resolve(&self, spec: &AgentSpec) -> Result<Arc<dyn DelegateTransport>, ResolveError> {
        match spec.kind {
            TransportKind::InProcess => {
                let delegate = self.catalog.resolve(&spec.location, &spec.entry_point)?;
                Ok(Arc::new(InProcessTransport::new(delegate, spec.timeout)))
            }
            TransportKind::Subprocess => Ok(Arc::new(SubprocessTransport::prepare(
                &spec.location,
                &spec.entry_point,
                spec.timeout,
            )?)),
        }
    }

    fn is_ready(&self, name: &str) -> bool {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|a| a.spec.name == name && a.state == AgentState::Ready)
    }

    /// Register and resolve an agent; returns whether it is ready.
    ///
    /// A ready agent with the same name is kept as is. A failed one is
    /// replaced and resolved again.
    pub fn register_agent(&self, mut spec: AgentSpec) -> bool {
        if self.is_ready(&spec.name) {
            info!("Agent '{}' already registered and ready", spec.name);
            return true;
        }

        spec.categories = dedup_categories(std::mem::take(&mut spec.categories));
        let mut descriptor = AgentDescriptor {
            spec,
            state: AgentState::Uninitialized,
            last_error: None,
            transport: None,
        };

        match self.resolve(&descriptor.spec) {
            Ok(transport) => {
                descriptor.transport = Some(transport);
                descriptor.state = AgentState::Ready;
                info!(
                    "Agent '{}' ready ({:?})",
                    descriptor.spec.name, descriptor.spec.kind
                );
            }
            Err(e) => {
                warn!("Agent '{}' failed to initialize: {}", descriptor.spec.name, e);
                descriptor.last_error = Some(e.to_string());
                descriptor.state = AgentState::Failed;
            }
        }

        let ready = descriptor.state == AgentState::Ready;
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        match agents.iter_mut().find(|a| a.spec.name == descriptor.spec.name) {
            Some(existing) if existing.state == AgentState::Ready => return true,
            Some(existing) => *existing = descriptor,
            None => agents.push(descriptor),
        }
        ready
    }

    /// Send a query to an agent. Never fails; problems come back as a
    /// failure envelope.
    pub async fn invoke(&self, name: &str, query: &str) -> Envelope {
        let transport = {
            let agents = self.agents.read().unwrap_or_else(PoisonError::into_inner);
            let Some(agent) = agents.iter().find(|a| a.spec.name == name) else {
                let known: Vec<&str> = agents.iter().map(|a| a.spec.name.as_str()).collect();
                let known = if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                };
                return Envelope::failure(
                    format!("agent '{}' is not registered", name),
                    format!("Agent '{}' was not found. Registered agents: {}", name, known),
                );
            };

            match (agent.state, &agent.transport) {
                (AgentState::Ready, Some(transport)) => transport.clone(),
                _ => {
                    let reason = agent
                        .last_error
                        .clone()
                        .unwrap_or_else(|| format!("agent '{}' is not initialized", name));
                    return Envelope::failure(
                        reason.clone(),
                        format!("Cannot query agent '{}': {}", name, reason),
                    );
                }
            }
        };

        info!("Querying agent '{}' via {:?}", name, transport.kind());
        match transport.call(query).await {
            Ok(raw) => {
                let envelope = coerce(raw);
                info!(
                    "Agent '{}' answered (success: {}): {}",
                    name,
                    envelope.success,
                    preview(&envelope.response, 100)
                );
                envelope
            }
            Err(e) => {
                error!("Agent '{}' failed: {}", name, e);
                transport_failure(name, e)
            }
        }
    }

    pub fn info(&self) -> Vec<AgentInfo> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(AgentDescriptor::info)
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.spec.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First ready agent tagged with `category`
    pub fn find_by_category(&self, category: &str) -> Option<String> {
        let wanted = category.to_lowercase();
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| {
                a.state == AgentState::Ready
                    && a.spec.categories.iter().any(|c| c.to_lowercase() == wanted)
            })
            .map(|a| a.spec.name.clone())
    }

    pub fn state(&self, name: &str) -> Option<AgentState> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.spec.name == name)
            .map(|a| a.state)
    }

    pub fn last_error(&self, name: &str) -> Option<String> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.spec.name == name)
            .and_then(|a| a.last_error.clone())
    }
}

fn transport_failure(name: &str, err: TransportError) -> Envelope {
    let response = match &err {
        TransportError::Timeout(timeout) => format!(
            "Agent '{}' did not respond in time ({}).",
            name,
            format_timeout(timeout)
        ),
        TransportError::EmptyOutput => "The agent returned an empty response.".to_string(),
        other => format!("An error occurred while querying agent '{}': {}", name, other),
    };
    Envelope::failure(err.to_string(), response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_categories_case_insensitive() {
        let out = dedup_categories(vec![
            "Finance".to_string(),
            "stocks".to_string(),
            "finance".to_string(),
            " ".to_string(),
            "STOCKS".to_string(),
        ]);
        assert_eq!(out, vec!["Finance".to_string(), "stocks".to_string()]);
    }

    #[test]
    fn test_spec_from_config_uses_default_timeout() {
        let agent = zai_config::AgentConfig {
            name: "invest".to_string(),
            transport: zai_config::TransportSetting::Subprocess,
            location: "~/agents/invest.sh".to_string(),
            entry_point: "sh {location}".to_string(),
            description: String::new(),
            categories: vec![],
            timeout_secs: None,
        };
        let spec = AgentSpec::from_config(&agent, 180);
        assert_eq!(spec.kind, TransportKind::Subprocess);
        assert_eq!(spec.timeout, Duration::from_secs(180));
    }
}
