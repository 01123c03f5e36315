//! Coordinator self-inspection tools: tool listing, status, query
//! classification, and the built-in knowledge base

use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;
use zai_provider::{object_schema, Param, ParamKind};

use super::{parse_args, FnTool, ToolBuilder, ToolResult, ToolTrait, WeakToolRegistry};
use crate::delegate::AgentRegistry;

const CATEGORY: &str = "master";

/// Lists registered tools, optionally filtered by a name substring
pub struct GetAvailableToolsTool {
    registry: WeakToolRegistry,
}

impl GetAvailableToolsTool {
    pub fn new(registry: WeakToolRegistry) -> Self {
        Self { registry }
    }
}

#[derive(Deserialize, Default)]
struct AvailableToolsArgs {
    category: Option<String>,
}

#[async_trait]
impl ToolTrait for GetAvailableToolsTool {
    fn name(&self) -> &str {
        "get_available_tools"
    }

    fn description(&self) -> &str {
        "List every tool available in the system with its description."
    }

    fn parameters(&self) -> Value {
        object_schema(&[Param::optional(
            "category",
            ParamKind::String,
            "Only list tools whose name contains this text",
        )])
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, args: Value) -> ToolResult {
        let args: AvailableToolsArgs = if args.is_null() {
            AvailableToolsArgs::default()
        } else {
            parse_args(self.name(), args)?
        };

        let mut tools = self
            .registry
            .upgrade()
            .map(|r| r.info())
            .unwrap_or_default();

        if let Some(filter) = args.category.filter(|c| !c.is_empty()) {
            let filter = filter.to_lowercase();
            tools.retain(|t| t.name.to_lowercase().contains(&filter));
        }

        Ok(serde_json::to_string_pretty(&json!({
            "count": tools.len(),
            "tools": tools,
        }))?)
    }
}

/// Reports coordinator liveness, tool count and agent states
pub struct GetSystemStatusTool {
    registry: WeakToolRegistry,
    agents: Arc<AgentRegistry>,
}

impl GetSystemStatusTool {
    pub fn new(registry: WeakToolRegistry, agents: Arc<AgentRegistry>) -> Self {
        Self { registry, agents }
    }
}

#[async_trait]
impl ToolTrait for GetSystemStatusTool {
    fn name(&self) -> &str {
        "get_system_status"
    }

    fn description(&self) -> &str {
        "Get the current status of the zAI system and its components."
    }

    fn parameters(&self) -> Value {
        object_schema(&[])
    }

    fn category(&self) -> Option<&str> {
        Some(CATEGORY)
    }

    async fn execute(&self, _args: Value) -> ToolResult {
        let tool_count = self.registry.upgrade().map(|r| r.len()).unwrap_or(0);

        let mut agents = Map::new();
        for info in self.agents.info() {
            agents.insert(info.name, json!(info.state));
        }

        Ok(serde_json::to_string_pretty(&json!({
            "status": "online",
            "timestamp": Local::now().to_rfc3339(),
            "components": {
                "coordinator": "active",
                "tools_registry": {
                    "status": "active",
                    "tool_count": tool_count,
                },
                "agents": agents,
            }
        }))?)
    }
}

// Scored in this order; the first category with the top score wins.
const KEYWORDS: &[(&str, &[&str])] = &[
    (
        "investment",
        &[
            "инвестиции", "акции", "портфель", "торговля", "биржа", "финансы", "отчет",
            "сделка", "доходность", "дивиденды", "фонд", "трейдинг", "опцион", "фьючерс",
            "invest", "stock", "portfolio", "dividend", "trading", "finance",
        ],
    ),
    (
        "general",
        &[
            "помощь", "информация", "вопрос", "объяснение", "рассказать", "посоветуй",
            "мнение", "что такое", "как сделать", "почему", "когда", "где", "кто", "зачем",
            "help", "explain", "what is", "how to", "why",
        ],
    ),
    (
        "direct_model",
        &[
            "думаешь", "считаешь", "напиши", "сгенерируй", "придумай", "сочини",
            "создай текст", "твое мнение", "твоя оценка", "творческий", "креативный",
            "история", "стихотворение", "write", "generate", "poem", "story",
        ],
    ),
    (
        "system",
        &[
            "статус", "инструменты", "функции", "возможности", "агенты", "система",
            "настройки", "status", "tools", "agents", "system",
        ],
    ),
];

/// Keyword classification of a user query
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: &'static str,
    pub score: usize,
    pub confidence: f64,
    pub scores: Vec<(&'static str, usize)>,
    pub recommended_tool: &'static str,
}

pub fn classify(query: &str) -> Classification {
    let lower = query.to_lowercase();
    let scores: Vec<(&'static str, usize)> = KEYWORDS
        .iter()
        .map(|(category, words)| (*category, words.iter().filter(|w| lower.contains(**w)).count()))
        .collect();

    // Zero everywhere keeps the direct_model fallback.
    let (category, score) = scores
        .iter()
        .fold(("direct_model", 0), |best, &(c, s)| if s > best.1 { (c, s) } else { best });

    let recommended_tool = match category {
        "investment" => "ask_specialized_agent",
        "system" if lower.contains("статус") || lower.contains("status") => "get_system_status",
        "system"
            if ["инструменты", "функции", "tools"]
                .iter()
                .any(|w| lower.contains(*w)) =>
        {
            "get_available_tools"
        }
        "system" => "lookup_information",
        _ => "chat_with_model",
    };

    debug!("Classified query as {} (score {})", category, score);
    Classification {
        category,
        score,
        confidence: (score as f64 / 3.0).min(1.0),
        scores,
        recommended_tool,
    }
}

#[derive(Deserialize)]
struct ClassifyArgs {
    query: String,
}

async fn classify_user_query(args: Value) -> ToolResult {
    let args: ClassifyArgs = parse_args("classify_user_query", args)?;
    let result = classify(&args.query);
    let scores: Map<String, Value> = result
        .scores
        .iter()
        .map(|(c, s)| (c.to_string(), json!(s)))
        .collect();

    Ok(serde_json::to_string_pretty(&json!({
        "query": args.query,
        "classification": result.category,
        "confidence": result.confidence,
        "scores": scores,
        "recommended_tool": result.recommended_tool,
    }))?)
}

pub fn classify_user_query_tool() -> FnTool {
    ToolBuilder::new(
        "classify_user_query",
        "Classify a user query to decide which tool or specialized agent should handle it.",
    )
    .param(Param::required("query", ParamKind::String, "User query to classify"))
    .category(CATEGORY)
    .build(classify_user_query)
}

fn knowledge_base() -> Value {
    json!({
        "zai": {
            "title": "zAI",
            "description": "zAI is a master-agent system coordinating specialized AI agents.",
            "capabilities": ["Agent coordination", "Query routing", "Tool management"]
        },
        "master_agent": {
            "title": "Master agent",
            "description": "The master agent is the central zAI component that processes queries and delegates tasks.",
            "responsibilities": ["Query analysis", "Tool selection", "Coordinating subordinate agents"]
        },
        "investment": {
            "title": "Investment analysis",
            "description": "zAI offers investment analysis through a specialized agent.",
            "features": ["Report analysis", "Portfolio management", "Market monitoring"]
        }
    })
}

/// Search the built-in knowledge base by key or content
pub fn lookup(topic: &str) -> Value {
    let needle = topic.to_lowercase();
    let mut results = Map::new();

    if let Value::Object(entries) = knowledge_base() {
        for (key, entry) in entries {
            let hit = key.contains(&needle)
                || entry
                    .as_object()
                    .map(|fields| {
                        fields
                            .values()
                            .any(|v| v.to_string().to_lowercase().contains(&needle))
                    })
                    .unwrap_or(false);
            if hit {
                results.insert(key, entry);
            }
        }
    }

    if results.is_empty() {
        json!({
            "topic": topic,
            "found": false,
            "message": "No information found on this topic."
        })
    } else {
        json!({
            "topic": topic,
            "found": true,
            "results": results
        })
    }
}

async fn lookup_information(args: Value) -> ToolResult {
    let topic = args
        .get("topic")
        .and_then(Value::as_str)
        .ok_or("missing required argument: topic")?;
    Ok(serde_json::to_string_pretty(&lookup(topic))?)
}

pub fn lookup_information_tool() -> FnTool {
    ToolBuilder::new(
        "lookup_information",
        "Look up information about the zAI system in the built-in knowledge base.",
    )
    .param(Param::required("topic", ParamKind::String, "Topic to look up"))
    .category(CATEGORY)
    .build(lookup_information)
}
