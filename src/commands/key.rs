use anyhow::{Result, bail};
use console::style;

use crate::store::{ConfigStore, mask_key};

pub fn set_key(store: &ConfigStore, key: &str) -> Result<()> {
    let mut config = store.load();
    config.api_key = Some(key.to_string());
    if !store.save(&config) {
        bail!("Failed to save the API key");
    }
    println!("{} API key set successfully.", style("✓").green());
    Ok(())
}

pub fn view_key(store: &ConfigStore) -> Result<()> {
    let config = store.load();
    let Some(api_key) = config.api_key else {
        bail!("API key not set. Use \"plexi set-key <key>\" to set it.");
    };

    println!(
        "{} {}",
        style("Current API key:").blue(),
        style(mask_key(&api_key)).yellow()
    );
    Ok(())
}

pub fn clear_key(store: &ConfigStore) -> Result<()> {
    let mut config = store.load();
    config.api_key = None;
    if !store.save(&config) {
        bail!("Failed to clear the API key");
    }
    println!("{} API key cleared successfully.", style("✓").green());
    Ok(())
}
