//! Turns a loaded configuration into a running stack.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use audit_claw_core::{HeuristicAnalyzer, Orchestrator, OrchestratorSettings};
use audit_claw_executor::ProcessRunner;
use audit_claw_tools::ToolRegistry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout belongs to the protocol. `RUST_LOG` overrides
/// the configured level.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn build_registry(config: &AppConfig) -> Result<ToolRegistry> {
    match &config.catalog {
        Some(path) => ToolRegistry::load(path)
            .with_context(|| format!("Failed to load tool catalog {}", path.display())),
        None => Ok(ToolRegistry::builtin(&config.tools_dir)),
    }
}

pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    std::fs::create_dir_all(&config.tools_dir).with_context(|| {
        format!("Failed to create tools directory {}", config.tools_dir.display())
    })?;

    let registry = build_registry(config)?;
    tracing::info!(
        "Loaded {} tool(s), tools directory {}",
        registry.len(),
        config.tools_dir.display()
    );

    let runner = ProcessRunner::with_timeout(config.tool_timeout());
    if let Some(limit) = runner.timeout() {
        tracing::info!("Tool commands time out after {:?}", limit);
    }

    let settings = OrchestratorSettings {
        confirmation_timeout: config.confirmation_timeout(),
    };
    Ok(Orchestrator::new(
        Arc::new(registry),
        Arc::new(runner),
        Arc::new(HeuristicAnalyzer::new()),
    )
    .with_settings(settings))
}
