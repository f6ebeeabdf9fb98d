//! Configuration view, edit and validation: `foreman config`.

use anyhow::Result;
use console::style;
use std::path::Path;

use foreman::config::Config;
use foreman::foreman_config::{ENV_AUTO_ADVANCE, ENV_REVIEWER, ForemanToml};
use foreman::ui::icons::{CHECK, CROSS};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(project_dir: &Path, cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config = Config::discover(project_dir, cli.verbose)?;

    match command {
        None | Some(ConfigCommands::Show) => show(&config, cli.yes),
        Some(ConfigCommands::Set { key, value }) => {
            let mut settings = config.settings(cli.yes)?;
            settings.toml.set_value(&key, &value)?;
            settings.save()?;
            println!("{}Set {} = {}", CHECK, key, value);

            for warning in settings.validate() {
                println!("{}", style(format!("Warning: {}", warning)).yellow());
            }
            Ok(())
        }
        Some(ConfigCommands::Validate) => {
            let settings = config.settings(cli.yes)?;
            let warnings = settings.validate();
            if warnings.is_empty() {
                println!("{}Configuration is valid", CHECK);
                return Ok(());
            }
            println!("{}Configuration has {} issue(s):", CROSS, warnings.len());
            for warning in &warnings {
                println!("  - {}", warning);
            }
            anyhow::bail!("invalid configuration in {}", config.config_file.display())
        }
    }
}

fn show(config: &Config, yes: bool) -> Result<()> {
    println!();
    println!("Foreman Configuration");
    println!("=====================");
    println!();

    if config.config_file.exists() {
        println!("Config file: {}", config.config_file.display());
    } else {
        println!(
            "No foreman.toml found at {}, using defaults",
            config.config_file.display()
        );
    }
    println!();

    let settings = config.settings(yes)?;
    print_toml(&settings.toml)?;

    println!("Effective values (with env overrides):");
    match settings.toml.workflow() {
        Ok(workflow) => println!("  workflow = {}", workflow),
        Err(e) => println!("  workflow = {}", style(format!("invalid ({})", e)).red()),
    }
    println!("  auto_advance = {}", settings.auto_advance());
    println!("  reviewers.default = {}", settings.default_reviewer());
    if std::env::var_os(ENV_REVIEWER).is_some() || std::env::var_os(ENV_AUTO_ADVANCE).is_some() {
        println!(
            "  {}",
            style(format!("({} / {} are set)", ENV_REVIEWER, ENV_AUTO_ADVANCE)).dim()
        );
    }
    println!();
    Ok(())
}

fn print_toml(toml: &ForemanToml) -> Result<()> {
    let content = toml::to_string_pretty(toml)?;
    for line in content.lines() {
        println!("  {}", line);
    }
    println!();
    Ok(())
}
