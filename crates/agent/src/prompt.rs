//! Prompt assembly for the coordinator

use chrono::Local;
use zai_provider::{Message, ToolCallDef};
use zai_session::Turn;

use crate::delegate::AgentInfo;
use crate::tools::ToolInfo;

/// Builds the system prompt and message list for one query
pub struct PromptBuilder {
    workflow_name: String,
}

impl PromptBuilder {
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
        }
    }

    pub fn build_system_prompt(&self, tools: &[ToolInfo], agents: &[AgentInfo]) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");

        let mut parts = vec![format!(
            r#"# {}

You are the zAI master agent. You answer user queries directly or route them
to the right tool or specialized agent.

- Use classify_user_query when unsure where a query belongs.
- Use chat_with_model for general questions and creative requests.
- Use ask_specialized_agent for domain questions a specialized agent covers.
- Reply in the language of the user.

## Current Time
{}"#,
            self.workflow_name, now
        )];

        if !tools.is_empty() {
            let lines: Vec<String> = tools
                .iter()
                .map(|t| format!("- {}: {}", t.name, t.description))
                .collect();
            parts.push(format!("## Tools\n\n{}", lines.join("\n")));
        }

        let ready: Vec<String> = agents
            .iter()
            .filter(|a| a.is_initialized)
            .map(|a| {
                if a.categories.is_empty() {
                    format!("- {}: {}", a.name, a.description)
                } else {
                    format!("- {}: {} [{}]", a.name, a.description, a.categories.join(", "))
                }
            })
            .collect();
        if !ready.is_empty() {
            parts.push(format!("## Specialized Agents\n\n{}", ready.join("\n")));
        }

        parts.join("\n\n---\n\n")
    }

    /// System prompt, then history, then the current query
    pub fn build_messages(system_prompt: String, history: &[Turn], query: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().map(|t| Message::new(&t.role, &t.content)));
        messages.push(Message::user(query));
        messages
    }

    pub fn add_tool_result(messages: &mut Vec<Message>, tool_call_id: &str, name: &str, result: &str) {
        messages.push(Message::tool(tool_call_id, name, result));
    }

    pub fn add_assistant_message(
        messages: &mut Vec<Message>,
        content: Option<&str>,
        tool_calls: Option<Vec<ToolCallDef>>,
    ) {
        let mut msg = Message::assistant(content.unwrap_or(""));
        msg.tool_calls = tool_calls;
        messages.push(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_messages_orders_history_before_query() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let messages = PromptBuilder::build_messages("sys".to_string(), &history, "next");

        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[3].content.as_deref(), Some("next"));
    }

    #[test]
    fn test_system_prompt_lists_tools_and_ready_agents() {
        let tools = vec![ToolInfo {
            name: "search_google".to_string(),
            description: "Search Google".to_string(),
            parameters: json!({}),
            category: Some("search".to_string()),
        }];
        let agents = vec![
            AgentInfo {
                name: "invest".to_string(),
                description: "Investment analysis".to_string(),
                categories: vec!["finance".to_string()],
                transport: crate::delegate::TransportKind::Subprocess,
                state: crate::delegate::AgentState::Ready,
                is_initialized: true,
                error: None,
            },
            AgentInfo {
                name: "broken".to_string(),
                description: String::new(),
                categories: vec![],
                transport: crate::delegate::TransportKind::InProcess,
                state: crate::delegate::AgentState::Failed,
                is_initialized: false,
                error: Some("module 'x' is not available".to_string()),
            },
        ];

        let prompt = PromptBuilder::new("zAI Master Agent Workflow").build_system_prompt(&tools, &agents);
        assert!(prompt.starts_with("# zAI Master Agent Workflow"));
        assert!(prompt.contains("- search_google: Search Google"));
        assert!(prompt.contains("- invest: Investment analysis [finance]"));
        assert!(!prompt.contains("broken"));
    }
}
