/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When CliConfig schema changes
*/

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, theme::ColorfulTheme};
use std::path::PathBuf;

use taskpad_client::http::DEFAULT_BASE_URL;
use taskpad_cli::CliConfig;

pub fn run_init(output: PathBuf) -> Result<()> {
    println!("{}", style("Welcome to taskpad").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a client configuration.").dim()
    );

    let theme = ColorfulTheme::default();

    let api_url: String = Input::with_theme(&theme)
        .with_prompt("API URL")
        .default(DEFAULT_BASE_URL.to_string())
        .interact_text()?;

    println!("\n{}", style("--- Account ---").bold());
    let email: String = Input::with_theme(&theme)
        .with_prompt("Email")
        .interact_text()?;

    let name: String = Input::with_theme(&theme)
        .with_prompt("Display name (used by register)")
        .allow_empty(true)
        .interact_text()?;

    let store_password = Confirm::with_theme(&theme)
        .with_prompt("Store the password in the config file?")
        .default(false)
        .interact()?;
    let password = if store_password {
        Some(
            Password::with_theme(&theme)
                .with_prompt("Password")
                .interact()?,
        )
    } else {
        None
    };

    let config = CliConfig {
        api_url: Some(api_url),
        email: Some(email),
        password,
        name: Some(name).filter(|name| !name.trim().is_empty()),
        ..CliConfig::default()
    };

    let yaml = config.to_yaml()?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .context(format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, yaml)
        .context(format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}
