//! `goalsmith generate`: run the synthesis pipeline once from the terminal.

use anyhow::{Context, Result};

use goalsmith_core::{GoalRequest, Synthesized};

use crate::config::AppConfig;
use crate::serve_cmd::{build_synthesizer, load_catalog};

pub async fn run_generate(config: AppConfig, request: GoalRequest) -> Result<()> {
    let catalog = load_catalog(&config)?;
    let Some(synthesizer) = build_synthesizer(&config, catalog) else {
        anyhow::bail!("goal generation is unavailable; set GEMINI_API_KEY or llm.api_key in the config file");
    };

    let result = synthesizer.generate_goals(&request).await;
    if let Synthesized::Fallback { attempts, reason, .. } = &result {
        eprintln!("note: model output unusable after {attempts} attempt(s) ({reason}); showing template goals");
    }

    let json = serde_json::to_string_pretty(result.value()).context("failed to encode goals")?;
    println!("{json}");
    Ok(())
}
