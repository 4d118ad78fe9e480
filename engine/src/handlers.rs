//! Command handlers for CLI operations
//!
//! - chat: interactive conversation on stdin/stdout
//! - ask: route a fixed list of user turns
//! - macros: run the macro calculator directly
//! - config: show the effective configuration
//!
//! The conversation history lives in memory for the duration of a command.

use anyhow::{Context, Result};
use sdk::errors::EngineError;
use sdk::types::Turn;
use serde_json::json;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::Config;
use crate::conductor::TurnRouter;
use crate::tools::{calculate_macros, meal_split};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Run an interactive conversation on stdin/stdout
pub async fn handle_chat(config: &Config) -> Result<()> {
    let router = TurnRouter::from_config(config).context("Failed to set up the assistant")?;

    println!("NutriPlan AI. Type 'help' to see what I can do, 'bye' to leave.");

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let history = run_chat(&router, stdin.lock(), &mut stdout).await?;

    tracing::info!("Chat ended after {} turns", history.len());
    Ok(())
}

/// Drive a conversation from `input` lines, writing replies to `output`.
///
/// Blank lines are ignored. Stops after the farewell reply or at end of
/// input and returns the full history.
pub async fn run_chat<R: BufRead, W: Write>(
    router: &TurnRouter,
    input: R,
    output: &mut W,
) -> Result<Vec<Turn>> {
    let mut history = Vec::new();
    let mut lines = input.lines();

    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line.context("Failed to read input")?;
        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        history.push(Turn::user(message));
        let outcome = router.handle_turn(&history).await;
        writeln!(output, "\n{}\n", outcome.text)?;
        history.push(Turn::assistant(outcome.text));

        if outcome.responder == "farewell" {
            break;
        }
    }

    Ok(history)
}

/// Route each message as a user turn and print the final reply
pub async fn handle_ask(messages: Vec<String>, config: &Config, format: OutputFormat) -> Result<()> {
    let router = TurnRouter::from_config(config).context("Failed to set up the assistant")?;

    let mut history = Vec::new();
    let mut last = None;
    for message in messages {
        history.push(Turn::user(message));
        let outcome = router.handle_turn(&history).await;
        history.push(Turn::assistant(outcome.text.clone()));
        last = Some(outcome);
    }

    let Some(outcome) = last else {
        anyhow::bail!("No message given");
    };

    match format {
        OutputFormat::Text => println!("{}", outcome.text),
        OutputFormat::Json => {
            let output = json!({
                "responder": outcome.responder,
                "reply": outcome.text,
                "history": history,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the macro breakdown and meal split for a calorie target
pub fn handle_macros(calories: i64, format: OutputFormat) -> Result<()> {
    println!("{}", render_macros(calories, format)?);
    Ok(())
}

/// Render the macro breakdown and meal split for a calorie target
pub fn render_macros(calories: i64, format: OutputFormat) -> Result<String> {
    let daily_calories = u32::try_from(calories)
        .ok()
        .filter(|kcal| *kcal > 0)
        .ok_or(EngineError::InvalidCalories(calories))?;

    let macros = calculate_macros(daily_calories);
    let meals = meal_split(daily_calories);

    let rendered = match format {
        OutputFormat::Text => {
            let mut lines = vec![
                format!("Daily calories: {} kcal", daily_calories),
                String::new(),
                format!("Protein: {} g", macros.protein_g),
                format!("Carbohydrates: {} g", macros.carbs_g),
                format!("Fats: {} g", macros.fats_g),
                String::new(),
            ];
            lines.extend(
                meals
                    .iter()
                    .map(|(slot, kcal)| format!("{:<10} ~{} kcal", slot.name(), kcal)),
            );
            lines.join("\n")
        }
        OutputFormat::Json => {
            let meals: Vec<_> = meals
                .iter()
                .map(|(slot, kcal)| json!({ "slot": slot.name(), "calories": kcal }))
                .collect();
            let output = json!({
                "daily_calories": daily_calories,
                "macros": macros,
                "meals": meals,
            });
            serde_json::to_string_pretty(&output)?
        }
    };

    Ok(rendered)
}

/// Show the configuration file path and its effective values
pub fn handle_config(config: &Config, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Configuration file: {}", path.display());
            println!();
            let body = toml::to_string_pretty(config).context("Failed to render config")?;
            println!("{}", body);
        }
        OutputFormat::Json => {
            let output = json!({
                "path": path.display().to_string(),
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
