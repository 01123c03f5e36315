//! Tool-calling loop against the provider

use std::sync::Arc;
use tracing::{debug, warn};
use zai_provider::{ChatParams, Message, Provider, RunConfig, ToolCallDef, ToolChoice};

use crate::prompt::PromptBuilder;
use crate::tools::ToolRegistry;
use crate::{AgentError, Result};

/// Calls the model until it answers without tool calls
pub struct Runner {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_iterations: u32,
}

impl Runner {
    pub fn new(provider: Arc<dyn Provider>, tools: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.2,
            max_tokens: 4096,
            max_iterations: 10,
        }
    }

    pub fn from_config(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        config: &zai_config::CoordinatorConfig,
    ) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_iterations: config.max_tool_iterations,
            ..Self::new(provider, tools, config.model.clone())
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn run(&self, mut messages: Vec<Message>, run: RunConfig) -> Result<String> {
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                warn!("Stopping after {} iterations", self.max_iterations);
                return Err(AgentError::MaxIterations);
            }

            debug!("Coordinator iteration {}", iteration);

            let params = ChatParams {
                model: self.model.clone(),
                messages: messages.clone(),
                tools: self.tools.definitions(),
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                tool_choice: ToolChoice::Auto,
                run: run.clone(),
            };

            let response = self
                .provider
                .chat(params)
                .await
                .map_err(|e| AgentError::Provider(e.to_string()))?;

            if !response.has_tool_calls() {
                return Ok(response.content.unwrap_or_default());
            }

            let tool_call_defs: Vec<ToolCallDef> = response
                .tool_calls
                .iter()
                .map(|tc| ToolCallDef::new(&tc.id, &tc.name, tc.arguments.clone()))
                .collect();
            PromptBuilder::add_assistant_message(
                &mut messages,
                response.content.as_deref(),
                Some(tool_call_defs),
            );

            for tool_call in &response.tool_calls {
                debug!("Executing tool: {}", tool_call.name);

                let result = self
                    .tools
                    .execute(&tool_call.name, tool_call.arguments.clone())
                    .await
                    .unwrap_or_else(|e| format!("Error: {}", e));

                PromptBuilder::add_tool_result(&mut messages, &tool_call.id, &tool_call.name, &result);
            }
        }
    }
}
