use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line client for the Perplexity chat-completion API.
#[derive(Debug, Parser)]
#[command(name = "plexi")]
#[command(version, about = "A CLI tool to interact with the Perplexity API")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the Perplexity API key
    SetKey {
        /// The API key to store
        key: String,
    },

    /// View the currently set API key (masked)
    ViewKey,

    /// Clear the stored API key
    ClearKey,

    /// Send a query to the Perplexity API
    Query(QueryArgs),

    /// List available Perplexity API models
    Models,

    /// View history of recent queries
    History,
}

#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// The question to send
    pub question: String,

    /// Model to use
    #[arg(short, long, default_value = crate::config::DEFAULT_MODEL)]
    pub model: String,

    /// Stream the response as it is generated
    #[arg(short, long)]
    pub stream: bool,

    /// Save the response to a file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}
