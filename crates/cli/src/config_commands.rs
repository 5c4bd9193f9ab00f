//! `unfurl config` — show the resolved configuration or write a starter file.

use {anyhow::Result, clap::Subcommand, unfurl_config::UnfurlConfig};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the resolved configuration as TOML.
    Show,
    /// Write a default config file to the user config directory.
    Init,
}

pub fn handle_config(action: ConfigAction, config: &UnfurlConfig) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", render(config)?);
            Ok(())
        },
        ConfigAction::Init => init(),
    }
}

fn render(config: &UnfurlConfig) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

fn init() -> Result<()> {
    let path = unfurl_config::find_or_default_config_path();
    if path.exists() {
        println!("Config already exists at: {}", path.display());
        return Ok(());
    }
    let path = unfurl_config::save_config(&UnfurlConfig::default())?;
    println!("Wrote default config to: {}", path.display());
    Ok(())
}
