//! Master coordinator: one natural-language query in, one answer out

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};
use zai_provider::RunConfig;
use zai_session::Turn;

use crate::delegate::{AgentInfo, AgentRegistry};
use crate::prompt::PromptBuilder;
use crate::runner::Runner;
use crate::tools::{ToolInfo, ToolRegistry};
use crate::preview;

pub struct Coordinator {
    runner: Runner,
    agents: Arc<AgentRegistry>,
    prompt: PromptBuilder,
    workflow_name: String,
    history_limit: usize,
}

impl Coordinator {
    pub fn new(runner: Runner, agents: Arc<AgentRegistry>, workflow_name: impl Into<String>) -> Self {
        let workflow_name = workflow_name.into();
        Self {
            runner,
            agents,
            prompt: PromptBuilder::new(&workflow_name),
            workflow_name,
            history_limit: zai_session::DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.runner.tools()
    }

    pub fn agents(&self) -> &Arc<AgentRegistry> {
        &self.agents
    }

    pub fn registered_tools_info(&self) -> Vec<ToolInfo> {
        self.tools().info()
    }

    pub fn agents_info(&self) -> Vec<AgentInfo> {
        self.agents.info()
    }

    /// Answer a query. Failures are reported in the returned text.
    pub async fn process_query(&self, query: &str, history: Option<&[Turn]>) -> String {
        let trace_id = uuid::Uuid::new_v4().to_string();
        let history = history.unwrap_or(&[]);
        let history = &history[history.len().saturating_sub(self.history_limit)..];

        info!(trace_id = %trace_id, "Processing query ({} history turns)", history.len());
        debug!("Query: {}", preview(query, 200));

        let run = RunConfig::new(&self.workflow_name)
            .with_trace_id(&trace_id)
            .with_metadata("model", self.runner.model())
            .with_metadata("history_turns", history.len().to_string());

        let system_prompt = self
            .prompt
            .build_system_prompt(&self.registered_tools_info(), &self.agents_info());
        let messages = PromptBuilder::build_messages(system_prompt, history, query);

        match self.runner.run(messages, run).await {
            Ok(text) => {
                let answer = unwrap_response(&text);
                debug!("Answer: {}", preview(&answer, 200));
                answer
            }
            Err(e) => {
                error!(trace_id = %trace_id, "Query failed: {}", e);
                format!("An error occurred while processing the request: {}", e)
            }
        }
    }
}

/// The `response` field of a JSON object answer, or the text unchanged
pub fn unwrap_response(text: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim()) {
        match map.get("response") {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }
    text.to_string()
}
