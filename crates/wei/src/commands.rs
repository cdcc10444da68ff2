//! Wei command implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use wei_agent::{configs, AgentGraph, Orchestrator, TurnConfig};
use wei_config::{config_path, sessions_dir, Config};
use wei_provider::OpenRouterProvider;
use wei_scoring::ScoringCaps;
use wei_store::MemoryStore;

fn scoring_caps(config: &Config) -> ScoringCaps {
    ScoringCaps {
        chain: config.scoring.chain_cap,
        streak: config.scoring.streak_cap,
        consistency: config.scoring.consistency_cap,
    }
}

fn build_graph(config: &Config, set: &str) -> Result<AgentGraph> {
    let store = Arc::new(MemoryStore::with_demo_data(Utc::now()));
    let defs = configs::agent_set(set, store, scoring_caps(config))
        .with_context(|| format!("unknown agent set '{set}'"))?;
    AgentGraph::build(defs).context("agent graph failed to build")
}

/// Write a default config file if none exists.
pub async fn init_command() -> Result<()> {
    let path = config_path();
    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    Config::default().save().await?;
    println!("Wrote default config to {}", path.display());
    println!("Set provider.api_key (or WEI_API_KEY) before chatting.");
    Ok(())
}

/// One-shot or interactive chat against a session.
pub async fn chat_command(message: Option<String>, session_key: String, set: String) -> Result<()> {
    let config = Config::load_or_default().await;
    if !config.is_provider_configured() {
        bail!("no API key configured; run `wei init` and set provider.api_key");
    }

    let graph = build_graph(&config, &set)?;
    let entry = configs::entry_agent(&set)
        .with_context(|| format!("unknown agent set '{set}'"))?;

    let provider = OpenRouterProvider::with_timeout(
        config.api_key(),
        config.provider.api_base.clone(),
        Some(config.defaults.model.clone()),
        Duration::from_secs(config.defaults.request_timeout_secs),
    );

    let turn_config = TurnConfig {
        model: config.defaults.model.clone(),
        max_tokens: config.defaults.max_tokens,
        temperature: config.defaults.temperature,
        max_rounds: config.defaults.max_rounds,
        retry_attempts: config.defaults.retry_attempts,
        retry_backoff: Duration::from_millis(config.defaults.retry_backoff_ms),
    };
    let orchestrator = Orchestrator::new(graph, provider, turn_config);

    let mut sessions = wei_session::SessionManager::with_max_messages(
        sessions_dir(),
        config.defaults.session_max_messages,
    );

    match message {
        Some(message) => {
            run_one_turn(&orchestrator, &mut sessions, &session_key, entry, &message).await
        }
        None => interactive_loop(&orchestrator, &mut sessions, &session_key, entry).await,
    }
}

async fn run_one_turn(
    orchestrator: &Orchestrator<OpenRouterProvider>,
    sessions: &mut wei_session::SessionManager,
    session_key: &str,
    entry_agent: &str,
    message: &str,
) -> Result<()> {
    let (active_agent, state) = {
        let session = sessions.get_or_create(session_key, entry_agent).await;
        (session.active_agent.clone(), session.state.clone())
    };

    match orchestrator.run_turn(&active_agent, state, message).await {
        Ok(outcome) => {
            println!("{}", outcome.final_message);

            let session = sessions.get_or_create(session_key, entry_agent).await;
            session.record_turn(outcome.state, outcome.active_agent);
            let snapshot = session.clone();
            if let Err(e) = sessions.save(&snapshot).await {
                warn!("failed to save session {session_key}: {e}");
            }
        }
        Err(e) => {
            info!("turn aborted: {e}");
            println!("{}", e.user_message());
        }
    }

    Ok(())
}

async fn interactive_loop(
    orchestrator: &Orchestrator<OpenRouterProvider>,
    sessions: &mut wei_session::SessionManager,
    session_key: &str,
    entry_agent: &str,
) -> Result<()> {
    println!("Chatting with Wei (exit or Ctrl-D to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        run_one_turn(orchestrator, sessions, session_key, entry_agent, input).await?;
    }

    println!("Bye!");
    Ok(())
}

/// Show configuration and provider readiness.
pub async fn status_command() -> Result<()> {
    let config = Config::load_or_default().await;
    let path = config_path();

    println!("Wei status");
    println!("  Config: {}", path.display());
    println!(
        "  Config file: {}",
        if path.exists() { "present" } else { "missing (using defaults)" }
    );
    println!(
        "  API key: {}",
        if config.is_provider_configured() {
            "[set]"
        } else {
            "[not set]"
        }
    );
    println!("  Model: {}", config.defaults.model);
    println!("  Max rounds per turn: {}", config.defaults.max_rounds);
    println!(
        "  Scoring caps: chain {} / streak {} / consistency {}",
        config.scoring.chain_cap, config.scoring.streak_cap, config.scoring.consistency_cap
    );
    println!("  Agent sets: {}", configs::set_names().join(", "));

    Ok(())
}

/// Print agent sets with their tools and handoff edges.
pub async fn agents_command(only: Option<String>) -> Result<()> {
    let config = Config::load_or_default().await;

    for set in configs::set_names() {
        if only.as_deref().is_some_and(|o| o != *set) {
            continue;
        }

        let graph = build_graph(&config, set)?;
        let entry = configs::entry_agent(set).unwrap_or("?");
        println!("{set} (entry: {entry})");

        for name in graph.agent_names() {
            let agent = graph.get(name).expect("agent listed in its own graph");
            println!("  {name} - {}", agent.public_description());

            let tools: Vec<String> = agent
                .advertised_tools()
                .iter()
                .map(|t| t.function.name.clone())
                .collect();
            if !tools.is_empty() {
                println!("    tools: {}", tools.join(", "));
            }
            if !agent.handoff_targets().is_empty() {
                println!("    handoffs: {}", agent.handoff_targets().join(", "));
            }
        }
        println!();
    }

    if let Some(only) = only {
        if !configs::set_names().contains(&only.as_str()) {
            bail!("unknown agent set '{only}'");
        }
    }

    Ok(())
}
