//! Built-in delegate answering straight from the language model

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use zai_provider::{ChatParams, Message, Provider, RunConfig};

use super::catalog::InProcessDelegate;
use super::envelope::RawOutput;

/// Module key of the built-in delegate
pub const MODEL_MODULE: &str = "zai.model";
/// Entry point of the built-in delegate
pub const MODEL_ENTRY_POINT: &str = "query";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that gives accurate and informative answers.";

pub struct ModelDelegate {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    workflow_name: String,
}

impl ModelDelegate {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: 4096,
            workflow_name: "zAI Model Agent".to_string(),
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &zai_config::Config) -> Self {
        Self {
            max_tokens: config.coordinator.max_tokens,
            ..Self::new(provider, config.default_model())
        }
    }
}

#[async_trait]
impl InProcessDelegate for ModelDelegate {
    async fn query(
        &self,
        query: &str,
    ) -> Result<RawOutput, Box<dyn std::error::Error + Send + Sync>> {
        let params = ChatParams {
            model: self.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(query)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            run: RunConfig::new(&self.workflow_name)
                .with_metadata("delegate", MODEL_MODULE),
            ..Default::default()
        };

        let response = self.provider.chat(params).await?;
        let text = response.content.unwrap_or_default();

        let mut map = serde_json::Map::new();
        map.insert("success".to_string(), json!(true));
        map.insert("response".to_string(), json!(text));
        map.insert("model".to_string(), json!(self.model));
        Ok(RawOutput::Structured(map))
    }
}
