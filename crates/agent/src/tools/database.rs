//! Bot database tools, backed by the bot's HTTP API

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error};
use zai_provider::{object_schema, Param, ParamKind};

use super::{parse_args, ToolResult, ToolTrait};

const CATEGORY: &str = "database";

fn is_select(sql: &str) -> bool {
    static SELECT: OnceLock<Regex> = OnceLock::new();
    SELECT
        .get_or_init(|| Regex::new(r"(?i)^\s*select\b").expect("valid regex"))
        .is_match(sql)
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("bot database API URL not configured")]
    NotConfigured,

    #[error("{0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the bot database API
pub struct BotDatabaseClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl BotDatabaseClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &zai_config::Config) -> Self {
        Self::new(
            config.toolkit.database.api_url.clone(),
            config.database_api_key().unwrap_or_default(),
        )
    }

    fn url(&self, route: &str) -> Result<String, DatabaseError> {
        if self.api_url.is_empty() {
            return Err(DatabaseError::NotConfigured);
        }
        Ok(format!("{}/{}", self.api_url, route))
    }

    async fn post_sql(&self, route: &str, sql: &str) -> Result<Value, DatabaseError> {
        let url = self.url(route)?;
        debug!("POST {}: {}", url, sql);
        let value = self
            .client
            .post(url)
            .header("X-API-Key", &self.api_key)
            .json(&json!({ "query": sql, "params": [] }))
            .timeout(Duration::from_secs(30))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }

    pub async fn query(&self, sql: &str) -> Result<Value, DatabaseError> {
        self.post_sql("query", sql).await
    }

    pub async fn execute(&self, sql: &str) -> Result<Value, DatabaseError> {
        self.post_sql("execute", sql).await
    }

    pub async fn schema(&self) -> Result<Value, DatabaseError> {
        let url = self.url("schema")?;
        let value = self
            .client
            .get(url)
            .header("X-API-Key", &self.api_key)
            .timeout(Duration::from_secs(30))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

#[derive(Deserialize)]
struct SqlArgs {
    query: String,
}

fn sql_params() -> Value {
    object_schema(&[Param::required("query", ParamKind::String, "SQL statement")])
}

/// SELECT statements only
pub struct QueryBotDatabaseTool {
    db: Arc<BotDatabaseClient>,
}

impl QueryBotDatabaseTool {
    pub fn new(db: Arc<BotDatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolTrait for QueryBotDatabaseTool {
    fn name(&self) -> &str {
        "query_bot_database"
    }

    fn description(&self) -> &str {
        "Run a read-only SELECT query against the bot database."
    }

    fn parameters(&self) -> Value {
        sql_params()
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: SqlArgs = parse_args(self.name(), args)?;
        if !is_select(&args.query) {
            return Ok(json!({
                "error": "Only SELECT queries are allowed with this function",
                "results": []
            })
            .to_string());
        }

        let result = self.db.query(&args.query).await.unwrap_or_else(|e| {
            error!("Bot database query failed: {}", e);
            json!({ "error": e.to_string(), "results": [] })
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

/// INSERT / UPDATE / DELETE and other modifying statements
pub struct ExecuteBotDatabaseTool {
    db: Arc<BotDatabaseClient>,
}

impl ExecuteBotDatabaseTool {
    pub fn new(db: Arc<BotDatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolTrait for ExecuteBotDatabaseTool {
    fn name(&self) -> &str {
        "execute_bot_database"
    }

    fn description(&self) -> &str {
        "Run a modifying statement (INSERT, UPDATE, DELETE) against the bot database."
    }

    fn parameters(&self) -> Value {
        sql_params()
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: SqlArgs = parse_args(self.name(), args)?;
        if is_select(&args.query) {
            return Ok(json!({
                "error": "SELECT queries should use query_bot_database function",
                "success": false
            })
            .to_string());
        }

        let result = self.db.execute(&args.query).await.unwrap_or_else(|e| {
            error!("Bot database execute failed: {}", e);
            json!({ "error": e.to_string(), "success": false })
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

pub struct GetBotDatabaseSchemaTool {
    db: Arc<BotDatabaseClient>,
}

impl GetBotDatabaseSchemaTool {
    pub fn new(db: Arc<BotDatabaseClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolTrait for GetBotDatabaseSchemaTool {
    fn name(&self) -> &str {
        "get_bot_database_schema"
    }

    fn description(&self) -> &str {
        "Get the table schema of the bot database."
    }

    fn parameters(&self) -> Value {
        object_schema(&[])
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let result = self.db.schema().await.unwrap_or_else(|e| {
            error!("Bot database schema request failed: {}", e);
            json!({ "error": e.to_string(), "schema": {} })
        });
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_select() {
        assert!(is_select("SELECT * FROM users"));
        assert!(is_select("  select id from t"));
        assert!(!is_select("SELECTED"));
        assert!(!is_select("DELETE FROM users"));
        assert!(!is_select("UPDATE t SET a = 'select'"));
    }

    #[tokio::test]
    async fn test_unconfigured_url() {
        let db = BotDatabaseClient::new("", "key");
        assert!(matches!(db.schema().await, Err(DatabaseError::NotConfigured)));
    }
}
