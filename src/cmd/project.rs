//! Project creation commands: `foreman init` and `foreman quick`.

use anyhow::Result;
use console::style;
use std::path::Path;

use foreman::brief::{self, IMPL_BRIEF};
use foreman::config::Config;
use foreman::foreman_config::{ForemanToml, env_auto_advance};
use foreman::gates::Reviewer;
use foreman::init::{InitOptions, init_project, init_quick};
use foreman::ui::icons::{CHECK, FOLDER};
use foreman::workflow::{Preset, Stage, Workflow};

pub fn cmd_init(
    project_dir: &Path,
    name: Option<&str>,
    preset: Option<&str>,
    quick: bool,
    tdd: bool,
    workflow: Option<&[String]>,
) -> Result<()> {
    let mut preset = preset.map(Preset::parse).transpose()?;
    if quick && preset.is_none() {
        preset = Some(Preset::Minimal);
    }
    let workflow = workflow.map(Workflow::parse).transpose()?;

    let opts = InitOptions {
        name: name.map(str::to_string),
        preset,
        workflow,
        tdd,
        auto_advance: env_auto_advance(),
    };
    let result = init_project(project_dir, &opts)?;

    let mut mode = match preset {
        Some(Preset::Minimal) => " (minimal mode)".to_string(),
        Some(Preset::Light) => " (light mode)".to_string(),
        Some(Preset::Full) => " (full workflow)".to_string(),
        None => String::new(),
    };
    if tdd {
        mode.push_str(" + TDD");
    }

    println!();
    println!(
        "{}Initialized foreman project '{}'{} in {}",
        CHECK,
        result.name,
        mode,
        project_dir.display()
    );
    println!("  Workflow: {}", result.workflow);
    println!();
    println!("{}", style("Created:").dim());
    for path in &result.created {
        println!("  {}{}", FOLDER, style(path).dim());
    }
    println!();

    println!("{}", style("Next steps:").cyan());
    let first = result.workflow.first();
    match preset {
        Some(Preset::Minimal) => {
            println!("  # Write .foreman/requirements.md with your task");
            println!("  foreman brief impl          # Generate a brief and start building");
        }
        _ => {
            if first == Stage::Requirements {
                println!("  # Write .foreman/requirements.md");
            }
            println!(
                "  foreman gate {:<14} # Validate and advance past {}",
                first.as_str(),
                first
            );
        }
    }
    println!("  foreman status              # Check the current stage");
    println!();
    Ok(())
}

pub fn cmd_quick(
    project_dir: &Path,
    task: &str,
    name: Option<&str>,
    auto_advance: u8,
    generate_brief: bool,
) -> Result<()> {
    let result = init_quick(project_dir, task, name, auto_advance)?;

    println!();
    println!("{}Quick project initialized: {}", CHECK, result.name);
    println!();
    println!("{}", style(format!("Task: {}", task)).dim());
    println!("{}", style(format!("Mode: quick ({})", result.workflow)).dim());
    println!(
        "{}",
        style(format!("Auto-advance: {}% confidence", auto_advance)).dim()
    );
    println!();

    if !generate_brief {
        println!("{}", style("Next steps:").cyan());
        println!("  # Review .foreman/requirements.md");
        println!("  foreman gate requirements   # Approve requirements");
        println!("  foreman brief impl          # Generate a brief for the coding agent");
        println!();
        println!("Or add --brief to generate the brief immediately:");
        println!("  foreman quick {:?} --brief", task);
        println!();
        return Ok(());
    }

    let config = Config::new(project_dir.to_path_buf(), false)?;
    let manager = config.state_manager();
    let mut state = manager.load()?;
    state.approve_gate(Stage::Requirements, Reviewer::Auto)?;
    manager.save(&state)?;

    let settings = ForemanToml::load_or_default(&config.foreman_dir)?;
    let content = brief::generate_and_save(&config, &settings, &state, IMPL_BRIEF)?;

    println!("{}Generated brief: .foreman/briefs/{}.md", CHECK, IMPL_BRIEF);
    println!();
    println!("{}", style("Brief content:").cyan());
    println!("{}", "=".repeat(60));
    print!("{}", content);
    Ok(())
}
