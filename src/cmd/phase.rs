//! Project status and phase tracking: `foreman status`, `foreman phase`, `foreman phases`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::path::Path;

use foreman::config::Config;
use foreman::gates::{GateStatus, Reviewer};
use foreman::phase::{Phase, PhaseStatus};
use foreman::state::ProjectState;
use foreman::ui::icons::{ARROW, CHECK, FINISH};
use foreman::ui::{gate_icon, gate_status_styled, phase_icon, phase_status_styled};
use foreman::workflow::Stage;

use super::super::Cli;
use super::open_project;

#[derive(Serialize)]
struct StatusReport<'a> {
    project: String,
    current_stage: Stage,
    complete: bool,
    quick_mode: bool,
    minimal_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_task: Option<&'a str>,
    auto_advance: u8,
    workflow: &'a [Stage],
    gates: Vec<GateReport<'a>>,
    phases: Vec<&'a Phase>,
}

#[derive(Serialize)]
struct GateReport<'a> {
    stage: Stage,
    status: GateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    approved_by: Option<Reviewer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Pick up phase plans added or removed since the last command, persisting any change.
fn sync_and_save(config: &Config, state: &mut ProjectState) -> Result<()> {
    let report = config.sync_phases(state)?;
    if report.is_empty() {
        return Ok(());
    }
    for name in &report.added {
        tracing::info!(phase = %name, "discovered phase plan");
    }
    for name in &report.removed {
        tracing::info!(phase = %name, "phase plan removed, no longer tracked");
    }
    config.state_manager().save(state)
}

fn project_name(config: &Config) -> String {
    config
        .project_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

pub fn cmd_status(project_dir: &Path, cli: &Cli, json: bool) -> Result<()> {
    let (config, mut state) = open_project(project_dir, cli)?;
    sync_and_save(&config, &mut state)?;

    let settings = config.settings(cli.yes)?;
    let name = if settings.toml.project.name.is_empty() {
        project_name(&config)
    } else {
        settings.toml.project.name.clone()
    };

    if json {
        let report = StatusReport {
            project: name,
            current_stage: state.current_stage(),
            complete: state.is_complete(),
            quick_mode: state.quick_mode(),
            minimal_mode: state.minimal_mode(),
            quick_task: state.quick_task(),
            auto_advance: state.confidence(),
            workflow: state.active_stages(),
            gates: state
                .active_stages()
                .iter()
                .filter_map(|&stage| {
                    let gate = state.gate(stage)?;
                    Some(GateReport {
                        stage,
                        status: gate.status(),
                        approved_at: gate.approved_at(),
                        approved_by: gate.approved_by(),
                        reason: Some(gate.reason()).filter(|r| !r.is_empty()),
                    })
                })
                .collect(),
            phases: state.phases().iter().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("{}", style(format!("Project: {}", name)).bold());
    if let Some(task) = state.quick_task() {
        println!("Task: {}", task);
    }
    let mode = if state.minimal_mode() {
        "minimal"
    } else if state.quick_mode() {
        "quick"
    } else {
        "standard"
    };
    println!("Mode: {}", mode);
    if state.confidence() > 0 {
        println!("Auto-advance: {}%", state.confidence());
    }
    println!();

    println!("{}", style("Stages:").cyan());
    let current = state.current_stage();
    for &stage in state.active_stages() {
        let status = state
            .gate(stage)
            .map(|g| g.status())
            .unwrap_or(GateStatus::Blocked);
        let marker = if stage == current && !state.is_complete() {
            ARROW.to_string()
        } else {
            "   ".to_string()
        };
        print!(
            "{}{}{:<16} {}",
            marker,
            gate_icon(status),
            stage.as_str(),
            gate_status_styled(status)
        );
        if let Some(gate) = state.gate(stage) {
            if let Some(by) = gate.approved_by() {
                print!(" {}", style(format!("(by {})", by)).dim());
            }
            if !gate.reason().is_empty() {
                print!(" {}", style(format!("rejected: {}", gate.reason())).red());
            }
        }
        println!();
    }
    println!();

    if !state.phases().is_empty() {
        print_phases(&state);
    }

    if state.is_complete() {
        println!("{}All stages completed!", FINISH);
    } else {
        println!("Next: foreman gate {}", current.as_str());
    }
    println!();
    Ok(())
}

fn print_phases(state: &ProjectState) {
    let phases = state.phases();
    println!(
        "{} ({}/{} done)",
        style("Phases:").cyan(),
        phases.count(PhaseStatus::Done),
        phases.len()
    );
    for phase in phases.iter() {
        println!(
            "  {}{:<32} {}",
            phase_icon(phase.status),
            phase.name,
            phase_status_styled(phase.status)
        );
    }
    println!();
}

pub fn cmd_phase(project_dir: &Path, cli: &Cli, name: &str, status: &str) -> Result<()> {
    let status: PhaseStatus = status.parse()?;
    let (config, mut state) = open_project(project_dir, cli)?;
    config.sync_phases(&mut state)?;

    state.set_phase_status(name, status)?;
    config.state_manager().save(&state)?;

    println!("{}Phase {}: {}", CHECK, name, phase_status_styled(status));

    if state.all_phases_done() {
        println!();
        println!("{}", style("All phases done!").green().bold());
        if state.is_stage_in_workflow(Stage::Implementation) {
            println!("Run 'foreman gate implementation' to complete the project");
        }
    }
    Ok(())
}

pub fn cmd_phases(project_dir: &Path, cli: &Cli) -> Result<()> {
    let (config, mut state) = open_project(project_dir, cli)?;
    let report = config.sync_phases(&mut state)?;
    config.state_manager().save(&state)?;

    println!();
    if state.phases().is_empty() {
        println!(
            "No phases found. Add plans like 01-setup.md to {}",
            config.phases_dir.display()
        );
        println!();
        return Ok(());
    }

    print_phases(&state);
    if !report.added.is_empty() {
        println!("{}", style(format!("New: {}", report.added.join(", "))).dim());
    }
    if !report.removed.is_empty() {
        println!(
            "{}",
            style(format!("Removed: {}", report.removed.join(", "))).dim()
        );
    }
    Ok(())
}
