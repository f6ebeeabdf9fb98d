//! Brief generation: `foreman brief`.

use anyhow::{Result, bail};
use console::style;
use std::path::Path;

use foreman::brief::{self, IMPL_BRIEF};
use foreman::ui::icons::CHECK;
use foreman::workflow::Stage;

use super::super::Cli;
use super::open_project;

pub fn cmd_brief(project_dir: &Path, cli: &Cli, name: &str) -> Result<()> {
    let (config, mut state) = open_project(project_dir, cli)?;
    config.sync_phases(&mut state)?;
    config.state_manager().save(&state)?;

    if name != IMPL_BRIEF && state.get_phase(name).is_none() {
        let known: Vec<&str> = state.phases().iter().map(|p| p.name.as_str()).collect();
        if known.is_empty() {
            bail!(
                "Phase '{}' not found. No phase plans exist under {}; use 'foreman brief {}' for a single implementation brief",
                name,
                config.phases_dir.display(),
                IMPL_BRIEF
            );
        }
        bail!(
            "Phase '{}' not found. Known phases: {}",
            name,
            known.join(", ")
        );
    }

    let current = state.current_stage();
    if current != Stage::Implementation && !state.is_complete() {
        eprintln!(
            "{}",
            style(format!(
                "Warning: project is still at the {} stage; the brief may be incomplete",
                current
            ))
            .yellow()
        );
    }

    let settings = config.settings(cli.yes)?;
    let content = brief::generate_and_save(&config, &settings.toml, &state, name)?;

    println!("{}Generated brief: .foreman/briefs/{}.md", CHECK, name);
    println!();
    print!("{}", content);
    Ok(())
}
