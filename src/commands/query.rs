use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use console::{Term, style};
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;

use crate::cli::QueryArgs;
use crate::config::Settings;
use crate::model::{Message, query_messages};
use crate::providers::perplexity::{self, Usage};
use crate::store::ConfigStore;

pub async fn query(
    client: &Client,
    settings: &Settings,
    store: &ConfigStore,
    args: &QueryArgs,
) -> Result<()> {
    let config = store.load();
    let Some(api_key) = config.api_key else {
        bail!("API key not set. Use \"plexi set-key <key>\" to set it.");
    };

    // Recorded before the request goes out, success or not.
    store.record_query(&args.question, &args.model);

    let messages = query_messages(&settings.system_prompt, &args.question);
    let outcome = if args.stream {
        run_streaming(client, settings, &api_key, args, &messages).await
    } else {
        run_buffered(client, settings, &api_key, args, &messages).await
    };

    let full_text = match outcome {
        Ok(full_text) => full_text,
        Err(err) => {
            let mut message = format!("{err:#}");
            if let Some(hint) = error_hint(&message, &args.model) {
                message.push('\n');
                message.push_str(&hint);
            }
            bail!(message);
        }
    };

    if let Some(path) = &args.output {
        save_response(path, &full_text)?;
        println!(
            "\n{} Response saved to {}",
            style("✓").green(),
            path.display()
        );
    }

    Ok(())
}

/// Persist the accumulated response text once the call has completed; used
/// by both the buffered and streaming paths.
fn save_response(path: &Path, full_text: &str) -> Result<()> {
    fs::write(path, full_text)
        .with_context(|| format!("Failed to save response to '{}'", path.display()))
}

async fn run_buffered(
    client: &Client,
    settings: &Settings,
    api_key: &str,
    args: &QueryArgs,
    messages: &[Message],
) -> Result<String> {
    let term = Term::stderr();
    let _ = term.write_str("Thinking...");

    let result = perplexity::chat(client, settings, api_key, &args.model, messages).await;
    let _ = term.clear_line();
    let completion = result?;

    println!("{}", style("Response:").cyan());
    println!("{}", completion.content);

    if let Some(usage) = completion.usage {
        println!(
            "\n{} {}",
            style("Tokens used:").dim(),
            style(format_usage(&usage)).yellow()
        );
    }

    Ok(completion.content)
}

async fn run_streaming(
    client: &Client,
    settings: &Settings,
    api_key: &str,
    args: &QueryArgs,
    messages: &[Message],
) -> Result<String> {
    println!("{}", style("Streaming response:").cyan());

    let mut stream =
        perplexity::chat_stream(client, settings, api_key, &args.model, messages).await?;

    let mut full_response = String::new();
    let mut stdout = io::stdout();
    while let Some(fragment) = stream.next().await {
        let fragment = match fragment {
            Ok(fragment) => fragment,
            Err(err) => {
                println!();
                return Err(err);
            }
        };
        write!(stdout, "{fragment}").context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        full_response.push_str(&fragment);
    }
    println!();

    debug!(response_len = full_response.len(), "stream completed");
    Ok(full_response)
}

fn format_usage(usage: &Usage) -> String {
    format!(
        "{} prompt + {} completion = {} total",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

/// Heuristic hint derived from the error message text, matching the two
/// cases users hit most: a bad key and an unknown model.
fn error_hint(message: &str, model: &str) -> Option<String> {
    if message.contains("API key") {
        Some("Tip: Make sure your Perplexity API key is valid.".to_string())
    } else if message.contains("model") {
        Some(format!(
            "Tip: The model \"{model}\" might not be available. Try using \"sonar\" instead."
        ))
    } else {
        None
    }
}
