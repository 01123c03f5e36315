//! Web search through SerpAPI

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, error};
use zai_provider::{object_schema, Param, ParamKind};

use super::{parse_args, ToolResult, ToolTrait};

/// Google search via SerpAPI, simplified to answer box, organic results
/// and knowledge graph
pub struct SearchGoogleTool {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    max_results: u32,
}

impl SearchGoogleTool {
    pub fn new(api_key: Option<String>, endpoint: impl Into<String>, max_results: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            endpoint: endpoint.into(),
            max_results: max_results.clamp(1, 10),
        }
    }

    pub fn from_config(config: &zai_config::Config) -> Self {
        Self::new(
            config.search_api_key(),
            config.toolkit.search.endpoint.clone(),
            config.search_max_results(),
        )
    }

    async fn search(&self, api_key: &str, query: &str, num: u32) -> Result<Value, reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", api_key),
                ("num", &num.to_string()),
            ])
            .timeout(Duration::from_secs(15))
            .send()
            .await?
            .error_for_status()?;

        response.json().await
    }
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    num_results: Option<u32>,
}

fn simplify(query: &str, raw: &Value, num: u32) -> Value {
    let mut out = Map::new();
    out.insert("query".to_string(), json!(query));

    if let Some(answer) = raw.get("answer_box") {
        out.insert("direct_answer".to_string(), answer.clone());
    }

    let organic: Vec<Value> = raw
        .get("organic_results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .take(num as usize)
                .map(|r| {
                    json!({
                        "title": r.get("title").and_then(Value::as_str).unwrap_or(""),
                        "link": r.get("link").and_then(Value::as_str).unwrap_or(""),
                        "snippet": r.get("snippet").and_then(Value::as_str).unwrap_or(""),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    out.insert("organic_results".to_string(), Value::Array(organic));

    if let Some(graph) = raw.get("knowledge_graph") {
        out.insert(
            "knowledge_graph".to_string(),
            json!({
                "title": graph.get("title").and_then(Value::as_str).unwrap_or(""),
                "description": graph.get("description").and_then(Value::as_str).unwrap_or(""),
            }),
        );
    }

    Value::Object(out)
}

fn search_error(query: &str, error: impl std::fmt::Display) -> Value {
    json!({
        "error": error.to_string(),
        "query": query,
        "message": "Google search failed. Check the network connection and the SerpAPI key.",
    })
}

#[async_trait]
impl ToolTrait for SearchGoogleTool {
    fn name(&self) -> &str {
        "search_google"
    }

    fn description(&self) -> &str {
        "Search Google and return the top results."
    }

    fn parameters(&self) -> Value {
        object_schema(&[
            Param::required("query", ParamKind::String, "Search query"),
            Param::optional(
                "num_results",
                ParamKind::Integer,
                "Number of results to return (default 5, at most 10)",
            ),
        ])
    }

    fn category(&self) -> Option<&str> {
        Some("search")
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: SearchArgs = parse_args(self.name(), args)?;
        let num = args.num_results.unwrap_or(self.max_results).clamp(1, 10);

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(serde_json::to_string_pretty(&search_error(
                &args.query,
                "SERPAPI_KEY not configured",
            ))?);
        };

        debug!("Google search: {} ({} results)", args.query, num);
        let result = match self.search(api_key, &args.query, num).await {
            Ok(raw) => simplify(&args.query, &raw, num),
            Err(e) => {
                error!("Google search failed: {}", e);
                search_error(&args.query, e)
            }
        };

        Ok(serde_json::to_string_pretty(&result)?)
    }
}
