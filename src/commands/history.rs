use anyhow::Result;
use chrono::{DateTime, Local};
use console::style;

use crate::store::ConfigStore;

pub fn history(store: &ConfigStore) -> Result<()> {
    let history = store.load().history;

    if history.is_empty() {
        println!("{}", style("No query history found.").yellow());
        return Ok(());
    }

    println!("{}", style("Recent Queries:").cyan());
    for (idx, record) in history.iter().enumerate() {
        println!("{}. {}", idx + 1, record.question);
        println!(
            "   {}",
            style(format!("Date: {}", format_timestamp(record.timestamp))).dim()
        );
        println!("   {}", style(format!("Model: {}", record.model)).dim());
        println!();
    }
    Ok(())
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| "unknown".to_string())
}
