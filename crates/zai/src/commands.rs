//! zAI command implementations

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

use zai_agent::{boot, Coordinator};
use zai_config::{self, Config};
use zai_provider::{OpenAiProvider, Provider};
use zai_session::SessionStore;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn build_provider(config: &Config, api_key: String) -> Arc<dyn Provider> {
    Arc::new(OpenAiProvider::new(
        api_key,
        config.api_base(),
        Some(config.default_model()),
    ))
}

/// Boot without requiring an API key; only `ask` talks to the model up front.
async fn boot_offline() -> Result<Coordinator> {
    let config = Config::load().await.context("Failed to load config")?;
    let provider = build_provider(&config, config.api_key().unwrap_or_default());
    Ok(boot::build_coordinator(&config, provider))
}

fn mark(present: bool, yes: &str, no: &str) -> String {
    format!("[{}]", if present { yes } else { no })
}

/// Initialize config and agent directory
pub async fn init_command() -> Result<()> {
    println!("◆ Initializing zAI...");
    println!("{}", RULE);

    let config = zai_config::init()
        .await
        .context("Failed to initialize config")?;

    println!("Config:    {}", zai_config::config_path().display());
    println!("Agents:    {}", zai_config::agents_dir().display());
    println!("Model:     {}", config.default_model());

    println!("\n◆ zAI initialized");
    println!("\nNext steps:");
    println!("  1. Add your API key to ~/.zai/config.json (or set OPENAI_API_KEY)");
    println!("  2. Ask something: zai ask -m \"Что такое P/E ratio?\"");

    Ok(())
}

/// Ask the master agent, once or interactively
pub async fn ask_command(message: Option<String>, session: String) -> Result<()> {
    let config = Config::load().await.context("Failed to load config")?;

    let api_key = config
        .api_key()
        .context("No API key configured. Set one in ~/.zai/config.json or OPENAI_API_KEY")?;
    let provider = build_provider(&config, api_key);
    let coordinator = boot::build_coordinator(&config, provider);

    if let Some(msg) = message {
        let answer = coordinator.process_query(&msg, None).await;
        println!("\n◆ {}", answer);
        return Ok(());
    }

    let mut sessions = SessionStore::with_max_turns(config.history_limit());
    info!("Interactive session '{}'", session);

    println!("◆ Interactive mode (type 'exit' to quit, '/clear' to forget the conversation)");
    println!("{}", RULE);

    loop {
        print!("◆ ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        if input == "/clear" {
            sessions.clear(&session);
            println!("\n◆ History cleared\n");
            continue;
        }

        let history = sessions.get_or_create(&session);
        let answer = coordinator.process_query(input, Some(history.turns())).await;
        history.record_exchange(input, answer.as_str());
        debug!("Session '{}' holds {} turns", session, history.len());

        println!("\n◆ {}\n", answer);
    }

    Ok(())
}

/// Show system status
pub async fn status_command() -> Result<()> {
    let config_path = zai_config::config_path();
    let agents_dir = zai_config::agents_dir();

    println!("◆ zAI System Status");
    println!("{}", RULE);

    println!(
        "Config:    {} {}",
        config_path.display(),
        mark(config_path.exists(), "OK", "Missing")
    );
    println!(
        "Agents:    {} {}",
        agents_dir.display(),
        mark(agents_dir.exists(), "OK", "Missing")
    );

    let config = Config::load().await.context("Failed to load config")?;
    println!("Model:     {}", config.default_model());
    println!("API Key:   {}", mark(config.has_api_key(), "Set", "Missing"));
    println!(
        "SerpAPI:   {}",
        mark(config.search_api_key().is_some(), "Set", "Missing")
    );
    println!(
        "Bot DB:    {}",
        if config.toolkit.database.api_url.is_empty() {
            "[Not configured]".to_string()
        } else {
            config.toolkit.database.api_url.clone()
        }
    );
    println!("Delegates: {} configured", config.delegates.agents.len());
    println!("History:   {} turns", config.history_limit());

    println!("\n◆ Ready");

    Ok(())
}

/// List registered tools
pub async fn tools_command(prefix: Option<String>, category: Option<String>) -> Result<()> {
    let coordinator = boot_offline().await?;
    let registry = coordinator.tools();

    let mut tools = match &prefix {
        Some(prefix) => registry.find_by_prefix(prefix),
        None => registry.list(),
    };
    if let Some(category) = &category {
        tools.retain(|t| t.category() == Some(category.as_str()));
    }

    println!("◆ Tools ({})", tools.len());
    println!("{}", RULE);
    for tool in tools {
        println!(
            "  {} [{}] - {}",
            tool.name(),
            tool.category().unwrap_or("-"),
            tool.description()
        );
    }

    Ok(())
}

/// List specialized agents and their state
pub async fn agents_command() -> Result<()> {
    let coordinator = boot_offline().await?;
    let agents = coordinator.agents_info();

    println!("◆ Agents ({})", agents.len());
    println!("{}", RULE);
    if agents.is_empty() {
        println!("  No agents configured");
    }
    for agent in agents {
        println!(
            "  {} [{}] ({}) - {}",
            agent.name,
            agent.state.as_str(),
            agent.transport.as_str(),
            agent.description
        );
        if !agent.categories.is_empty() {
            println!("      categories: {}", agent.categories.join(", "));
        }
        if let Some(error) = agent.error {
            println!("      error: {}", error);
        }
    }

    Ok(())
}

/// Send a query straight to one agent and print the envelope
pub async fn delegate_command(agent: String, query: String) -> Result<()> {
    let coordinator = boot_offline().await?;
    let envelope = coordinator.agents().invoke(&agent, &query).await;
    println!("{}", envelope.to_json());
    Ok(())
}
