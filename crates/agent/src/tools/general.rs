//! Direct model access

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};
use zai_provider::{object_schema, ChatParams, Message, Param, ParamKind, Provider, RunConfig};

use super::{parse_args, ToolResult, ToolTrait};

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that gives accurate and informative answers.";

/// One-shot completion without tools
pub struct ChatWithModelTool {
    provider: Arc<dyn Provider>,
    default_model: String,
    default_temperature: f32,
    max_tokens: u32,
}

impl ChatWithModelTool {
    pub fn new(provider: Arc<dyn Provider>, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            default_temperature: 0.7,
            max_tokens: 4096,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &zai_config::Config) -> Self {
        Self {
            max_tokens: config.coordinator.max_tokens,
            ..Self::new(provider, config.default_model())
        }
    }
}

#[derive(Deserialize)]
struct ChatArgs {
    query: String,
    model: Option<String>,
    temperature: Option<f32>,
}

#[async_trait]
impl ToolTrait for ChatWithModelTool {
    fn name(&self) -> &str {
        "chat_with_model"
    }

    fn description(&self) -> &str {
        "Send a query straight to the language model and return its answer."
    }

    fn parameters(&self) -> Value {
        object_schema(&[
            Param::required("query", ParamKind::String, "User query"),
            Param::optional("model", ParamKind::String, "Model to use (default gpt-4o)"),
            Param::optional(
                "temperature",
                ParamKind::Number,
                "Sampling temperature from 0 to 1 (default 0.7)",
            ),
        ])
    }

    fn category(&self) -> Option<&str> {
        Some("general")
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: ChatArgs = parse_args(self.name(), args)?;
        let model = args
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model.clone());
        let temperature = args.temperature.unwrap_or(self.default_temperature);
        debug!("chat_with_model: {} (temperature {})", model, temperature);

        let params = ChatParams {
            model: model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(&args.query)],
            max_tokens: self.max_tokens,
            temperature,
            run: RunConfig::new("zAI Direct Model Call").with_metadata("tool", self.name()),
            ..Default::default()
        };

        let result = match self.provider.chat(params).await {
            Ok(response) => json!({
                "model": model,
                "response": response.content.unwrap_or_default(),
                "usage": {
                    "total_tokens": response.usage.total_tokens,
                    "prompt_tokens": response.usage.prompt_tokens,
                    "completion_tokens": response.usage.completion_tokens,
                }
            }),
            Err(e) => {
                error!("Model API call failed: {}", e);
                json!({
                    "error": e.to_string(),
                    "model": model,
                    "query": args.query,
                    "response": format!(
                        "An error occurred while contacting the model API: {}. Check the API key and network connection.",
                        e
                    ),
                })
            }
        };

        Ok(serde_json::to_string_pretty(&result)?)
    }
}
