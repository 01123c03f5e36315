//! Tools exposing the agent registry to the model

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use zai_provider::{object_schema, Param, ParamKind};

use super::{parse_args, ToolResult, ToolTrait};
use crate::delegate::AgentRegistry;

const CATEGORY: &str = "delegation";

pub struct GetAvailableAgentsTool {
    agents: Arc<AgentRegistry>,
}

impl GetAvailableAgentsTool {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }
}

#[async_trait]
impl ToolTrait for GetAvailableAgentsTool {
    fn name(&self) -> &str {
        "get_available_agents"
    }

    fn description(&self) -> &str {
        "List the specialized agents this system can delegate to."
    }

    fn parameters(&self) -> Value {
        object_schema(&[])
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let agents = self.agents.info();
        Ok(serde_json::to_string_pretty(&json!({
            "count": agents.len(),
            "agents": agents,
        }))?)
    }
}

pub struct AskSpecializedAgentTool {
    agents: Arc<AgentRegistry>,
}

impl AskSpecializedAgentTool {
    pub fn new(agents: Arc<AgentRegistry>) -> Self {
        Self { agents }
    }
}

#[derive(Deserialize)]
struct AskArgs {
    agent_name: String,
    query: String,
}

#[async_trait]
impl ToolTrait for AskSpecializedAgentTool {
    fn name(&self) -> &str {
        "ask_specialized_agent"
    }

    fn description(&self) -> &str {
        "Send a query to a specialized agent and return its answer."
    }

    fn parameters(&self) -> Value {
        object_schema(&[
            Param::required("agent_name", ParamKind::String, "Name of the agent to ask"),
            Param::required("query", ParamKind::String, "Query for the agent"),
        ])
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: AskArgs = parse_args(self.name(), args)?;
        let envelope = self.agents.invoke(&args.agent_name, &args.query).await;
        Ok(serde_json::to_string_pretty(&envelope)?)
    }
}
