//! Tests for Config serialization, file I/O, and accessors

use zai_config::{
    AgentConfig, Config, ConfigError, CoordinatorConfig, DatabaseConfig, DelegatesConfig,
    SearchConfig, TransportSetting,
};
use tempfile::TempDir;

/// Helper to create a temporary directory for tests
fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert!(config.providers.openai.api_key.is_empty());
    assert!(config.providers.openai.api_base.is_none());
    assert!(config.providers.openrouter.api_key.is_empty());

    assert_eq!(config.coordinator.max_tokens, 4096);
    assert_eq!(config.coordinator.max_tool_iterations, 10);

    assert_eq!(config.toolkit.search.max_results, 5);
    assert!(config.toolkit.database.api_url.is_empty());
}

#[test]
fn test_coordinator_config_defaults() {
    let coordinator = CoordinatorConfig::default();
    assert_eq!(coordinator.model, "gpt-4o");
    assert_eq!(coordinator.temperature, 0.2);
    assert_eq!(coordinator.history_limit, 50);
}

#[test]
fn test_search_and_database_defaults() {
    let search = SearchConfig::default();
    assert!(search.api_key.is_empty());
    assert_eq!(search.endpoint, "https://serpapi.com/search");

    let database = DatabaseConfig::default();
    assert!(database.api_key.is_empty());
}

#[test]
fn test_parse_subprocess_agent() {
    let json = r#"{
        "delegates": {
            "timeout_secs": 60,
            "agents": [
                {
                    "name": "investment_agent",
                    "transport": "subprocess",
                    "location": "~/agents/finance/run_agent.py",
                    "entry_point": "python {location} {query}",
                    "description": "Investment analysis",
                    "categories": ["investments", "finance"],
                    "timeout_secs": 240
                }
            ]
        }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();
    let agent = &config.delegates.agents[0];
    assert_eq!(agent.name, "investment_agent");
    assert_eq!(agent.transport, TransportSetting::Subprocess);
    assert_eq!(agent.categories, vec!["investments", "finance"]);
    assert_eq!(config.delegates.timeout_secs, 60);
    assert_eq!(config.delegates.timeout_for(agent), 240);
}

#[test]
fn test_agent_optional_fields_default() {
    let json = r#"{"name": "a", "transport": "in_process", "location": "zai.model"}"#;
    let agent: AgentConfig = serde_json::from_str(json).unwrap();
    assert!(agent.entry_point.is_empty());
    assert!(agent.description.is_empty());
    assert!(agent.categories.is_empty());
    assert!(agent.timeout_secs.is_none());
}

#[test]
fn test_unknown_transport_rejected() {
    let json = r#"{"name": "a", "transport": "carrier_pigeon", "location": "x"}"#;
    assert!(serde_json::from_str::<AgentConfig>(json).is_err());
}

#[test]
fn test_empty_agents_list_is_kept() {
    let json = r#"{"delegates": {"agents": []}}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.delegates.agents.is_empty());
    assert_eq!(config.delegates.timeout_secs, 180);
}

#[test]
fn test_delegates_default_has_model_agent() {
    let delegates = DelegatesConfig::default();
    assert_eq!(delegates.agents[0].name, "model_agent");
    assert_eq!(delegates.agents[0].entry_point, "query");
}

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let dir = temp_dir();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.coordinator.model = "gpt-4o-mini".to_string();
    config.toolkit.database.api_url = "http://localhost:5001/api".to_string();
    config.save_to(&path).await.unwrap();

    assert!(path.exists());
    let loaded = Config::load_from(&path).await.unwrap();
    assert_eq!(loaded.coordinator.model, "gpt-4o-mini");
    assert_eq!(loaded.toolkit.database.api_url, "http://localhost:5001/api");
    assert_eq!(loaded.delegates.agents.len(), 1);
}

#[tokio::test]
async fn test_load_missing_file_gives_defaults() {
    let dir = temp_dir();
    let config = Config::load_from(&dir.path().join("absent.json"))
        .await
        .unwrap();
    assert_eq!(config.coordinator.model, "gpt-4o");
}

#[tokio::test]
async fn test_load_existing_missing_file_errors() {
    let dir = temp_dir();
    let path = dir.path().join("absent.json");
    match Config::load_existing(&path).await {
        Err(ConfigError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_invalid_json_errors() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Config::load_from(&path).await;
    assert!(matches!(result, Err(ConfigError::Json(_))));
}

#[test]
fn test_explicit_keys_win_over_environment() {
    let mut config = Config::default();
    config.toolkit.search.api_key = "serp-key".to_string();
    config.toolkit.database.api_key = "db-key".to_string();
    config.providers.openai.api_key = "sk-test".to_string();

    assert_eq!(config.search_api_key(), Some("serp-key".to_string()));
    assert_eq!(config.database_api_key(), Some("db-key".to_string()));
    assert_eq!(config.api_key(), Some("sk-test".to_string()));
    assert!(config.has_api_key());
}

#[test]
fn test_openai_custom_base() {
    let mut config = Config::default();
    config.providers.openai.api_key = "sk-test".to_string();
    config.providers.openai.api_base = Some("http://localhost:8000/v1".to_string());
    assert_eq!(
        config.api_base(),
        Some("http://localhost:8000/v1".to_string())
    );
}

#[tokio::test]
async fn test_error_messages_name_the_problem() {
    let dir = temp_dir();

    let missing = dir.path().join("absent.json");
    let err = Config::load_existing(&missing).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("config not found: {}", missing.display())
    );

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"{"coordinator": {"model": 42}}"#).unwrap();
    let err = Config::load_from(&broken).await.unwrap_err();
    assert!(err.to_string().starts_with("invalid config: "), "{}", err);
}

#[tokio::test]
async fn test_directory_in_place_of_config_is_io_error() {
    let dir = temp_dir();
    let path = dir.path().join("config.json");
    std::fs::create_dir(&path).unwrap();

    let err = Config::load_from(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().starts_with("config I/O error: "));
}

#[tokio::test]
async fn test_save_under_a_file_is_io_error() {
    let dir = temp_dir();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let result = Config::default().save_to(&blocker.join("config.json")).await;
    assert!(matches!(result, Err(ConfigError::Io(_))));
}
