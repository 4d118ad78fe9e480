//! CLI interface for NutriPlan
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// NutriPlan AI
///
/// A conversational assistant that collects a daily calorie target and
/// dietary preferences, then builds a one-day meal plan with macros.
#[derive(Parser, Debug)]
#[command(name = "nutri")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive conversation
    Chat,

    /// Route one or more messages as consecutive user turns and print the
    /// final reply
    Ask {
        /// Messages, one per turn
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Show the macro breakdown and meal split for a calorie target
    Macros {
        /// Daily calorie target
        #[arg(allow_negative_numbers = true)]
        calories: i64,
    },

    /// Show the effective configuration
    Config,
}
