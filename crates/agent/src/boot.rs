//! Boot sequence: catalog, agents, tools, coordinator

use std::sync::Arc;
use tracing::info;
use zai_config::Config;
use zai_provider::Provider;

use crate::coordinator::Coordinator;
use crate::delegate::model::{MODEL_ENTRY_POINT, MODEL_MODULE};
use crate::delegate::{AgentRegistry, AgentSpec, DelegateCatalog, ModelDelegate};
use crate::runner::Runner;
use crate::tools::{
    master, AskSpecializedAgentTool, BotDatabaseClient, ChatWithModelTool,
    ExecuteBotDatabaseTool, GetAvailableAgentsTool, GetAvailableToolsTool,
    GetBotDatabaseSchemaTool, GetSystemStatusTool, QueryBotDatabaseTool, SearchGoogleTool,
    ToolRegistry,
};

/// Linked-in delegates: the built-in model delegate
pub fn build_catalog(provider: Arc<dyn Provider>, config: &Config) -> DelegateCatalog {
    DelegateCatalog::new().with(
        MODEL_MODULE,
        MODEL_ENTRY_POINT,
        Arc::new(ModelDelegate::from_config(provider, config)),
    )
}

/// Register every configured agent, failed ones included
pub fn build_agent_registry(config: &Config, catalog: DelegateCatalog) -> Arc<AgentRegistry> {
    let registry = AgentRegistry::new(catalog);
    for agent in &config.delegates.agents {
        registry.register_agent(AgentSpec::from_config(agent, config.delegates.timeout_secs));
    }
    info!(
        "{} agents registered ({} ready)",
        registry.len(),
        registry.info().iter().filter(|a| a.is_initialized).count()
    );
    Arc::new(registry)
}

/// Register the built-in tools
pub fn build_tool_registry(
    config: &Config,
    provider: Arc<dyn Provider>,
    agents: Arc<AgentRegistry>,
) -> ToolRegistry {
    let registry = ToolRegistry::new();

    // Master
    registry.register(GetAvailableToolsTool::new(registry.downgrade()));
    registry.register(GetSystemStatusTool::new(registry.downgrade(), agents.clone()));
    registry.register(master::classify_user_query_tool());
    registry.register(master::lookup_information_tool());

    // General
    registry.register(ChatWithModelTool::from_config(provider, config));

    // Search
    registry.register(SearchGoogleTool::from_config(config));

    // Database
    let db = Arc::new(BotDatabaseClient::from_config(config));
    registry.register(QueryBotDatabaseTool::new(db.clone()));
    registry.register(ExecuteBotDatabaseTool::new(db.clone()));
    registry.register(GetBotDatabaseSchemaTool::new(db));

    // Delegation
    registry.register(GetAvailableAgentsTool::new(agents.clone()));
    registry.register(AskSpecializedAgentTool::new(agents));

    info!("{} tools registered", registry.len());
    registry
}

/// Full boot: catalog, agents, tools, coordinator
pub fn build_coordinator(config: &Config, provider: Arc<dyn Provider>) -> Coordinator {
    let catalog = build_catalog(provider.clone(), config);
    let agents = build_agent_registry(config, catalog);
    let tools = build_tool_registry(config, provider.clone(), agents.clone());
    let runner = Runner::from_config(provider, tools, &config.coordinator);

    Coordinator::new(runner, agents, config.coordinator.workflow_name.clone())
        .with_history_limit(config.history_limit())
}
