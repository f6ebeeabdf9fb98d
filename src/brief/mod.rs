//! Markdown briefs handed to a coding agent.
//!
//! A brief is self-contained: it inlines the requirements, design documents,
//! phase overview and plan, so the agent needs nothing else to start work.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::foreman_config::{ForemanToml, TestingStyle};
use crate::phase::{Phase, PhaseStatus};
use crate::state::ProjectState;

/// Brief name reserved for the quick-mode implementation brief.
pub const IMPL_BRIEF: &str = "impl";

fn read_or(path: &Path, placeholder: &str) -> String {
    fs::read_to_string(path)
        .map(|c| c.trim().to_string())
        .ok()
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn read_designs(dir: &Path) -> String {
    let Ok(entries) = fs::read_dir(dir) else {
        return "_No design documents found._".to_string();
    };
    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    let designs: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let content = fs::read_to_string(path).ok()?;
            let content = content.trim();
            if content.is_empty() {
                return None;
            }
            let name = path.file_name()?.to_string_lossy();
            Some(format!("## {}\n\n{}", name, content))
        })
        .collect();

    if designs.is_empty() {
        "_No design documents with content found._".to_string()
    } else {
        designs.join("\n\n---\n\n")
    }
}

fn status_marker(status: PhaseStatus) -> &'static str {
    match status {
        PhaseStatus::Done => "✅",
        PhaseStatus::InProgress => "🔵",
        PhaseStatus::Planned => "⬜",
    }
}

fn write_project_context(b: &mut String, settings: &ForemanToml) {
    let project = &settings.project;
    let _ = writeln!(b, "## Project Context\n");
    let _ = writeln!(b, "**Name:** {}", project.name);
    if !project.description.is_empty() {
        let _ = writeln!(b, "**Description:** {}", project.description);
    }
    if !project.tech_stack.is_empty() {
        let _ = writeln!(b, "**Tech Stack:** {}", project.tech_stack.join(", "));
    }
    b.push('\n');
}

fn write_testing(b: &mut String, settings: &ForemanToml) {
    let Some(testing) = settings.testing.as_ref() else {
        return;
    };
    if testing.style == TestingStyle::None && !testing.required {
        return;
    }
    let _ = writeln!(b, "## Testing\n");
    match testing.style {
        TestingStyle::Tdd => {
            let _ = writeln!(b, "- Write a failing test before each piece of behavior");
            let _ = writeln!(b, "- Make it pass with the smallest change, then refactor");
        }
        TestingStyle::Coverage => {
            let _ = writeln!(b, "- Add tests alongside the code and keep coverage up");
        }
        TestingStyle::None => {}
    }
    if testing.required {
        let _ = writeln!(b, "- Tests are required: the work is not done until they pass");
    }
    b.push('\n');
}

fn write_dependencies(b: &mut String, preceding: &[Phase]) {
    let _ = writeln!(b, "## Dependencies\n");
    if preceding.is_empty() {
        let _ = writeln!(b, "_No dependencies - this is the first phase._\n");
        return;
    }
    for phase in preceding {
        let _ = writeln!(
            b,
            "- **{}**: {} `{}`",
            phase.name,
            status_marker(phase.status),
            phase.status
        );
    }

    let blockers: Vec<&Phase> = preceding
        .iter()
        .filter(|p| p.status != PhaseStatus::Done)
        .collect();
    if !blockers.is_empty() {
        let _ = writeln!(b, "\n### ⚠️  Dependency Warnings\n");
        for phase in blockers {
            let _ = writeln!(
                b,
                "- Phase **{}** is `{}` (not done yet)",
                phase.name, phase.status
            );
        }
    }
    b.push('\n');
}

/// Build the brief for one implementation phase.
pub fn phase_brief(
    config: &Config,
    settings: &ForemanToml,
    state: &ProjectState,
    phase_name: &str,
) -> Result<String> {
    let target = state
        .get_phase(phase_name)
        .ok_or_else(|| anyhow!("Phase '{}' not found. Run 'foreman phases' to list phases", phase_name))?;

    let mut b = String::new();
    let _ = writeln!(b, "# Phase Brief: {}\n", phase_name);
    let _ = writeln!(b, "**Generated:** {}", Utc::now().to_rfc3339());
    let _ = writeln!(b, "**Status:** {}\n", target.status);

    write_project_context(&mut b, settings);

    let _ = writeln!(b, "## Requirements\n");
    let _ = writeln!(
        b,
        "{}\n",
        read_or(&config.requirements_file, "_No requirements defined yet._")
    );

    let _ = writeln!(b, "## Design Context\n");
    let _ = writeln!(b, "{}\n", read_designs(&config.designs_dir));

    let _ = writeln!(b, "## Phase Overview\n");
    let _ = writeln!(
        b,
        "{}\n",
        read_or(&config.phase_overview(), "_No phase overview defined yet._")
    );

    write_dependencies(&mut b, state.phases().preceding(phase_name));

    let _ = writeln!(b, "## Phase Plan: {}\n", phase_name);
    let _ = writeln!(
        b,
        "{}\n",
        read_or(
            &config.phase_plan(phase_name),
            &format!("_No plan defined for phase {}._", phase_name)
        )
    );

    write_testing(&mut b, settings);

    let _ = writeln!(b, "## Implementation Guidelines\n");
    let _ = writeln!(b, "- This phase is currently: **{}**", target.status);
    let _ = writeln!(
        b,
        "{}",
        match target.status {
            PhaseStatus::Planned => "- Ready to start implementation",
            PhaseStatus::InProgress => "- Implementation is ongoing",
            PhaseStatus::Done => "- This phase is marked as completed",
        }
    );

    let _ = writeln!(b, "\n### Related Phases\n");
    for phase in state.phases().iter().filter(|p| p.name != phase_name) {
        let _ = writeln!(
            b,
            "- {} {} (`{}`)",
            status_marker(phase.status),
            phase.name,
            phase.status
        );
    }

    let _ = writeln!(b, "\n### Completion\n");
    let _ = writeln!(b, "When this phase is complete:");
    let _ = writeln!(
        b,
        "- Run `foreman phase {} done` to mark it as finished",
        phase_name
    );
    let _ = writeln!(b, "- Ensure all deliverables are implemented and tested");
    let _ = writeln!(
        b,
        "- Document any changes or decisions made during implementation"
    );

    Ok(b)
}

/// Build the single implementation brief of a quick-mode project.
pub fn quick_brief(config: &Config, settings: &ForemanToml, state: &ProjectState) -> String {
    let task = state
        .quick_task()
        .unwrap_or(settings.project.description.as_str());

    let mut b = String::new();
    let _ = writeln!(b, "# Implementation Brief: {}\n", settings.project.name);
    let _ = writeln!(b, "**Generated:** {}", Utc::now().to_rfc3339());
    let _ = writeln!(b, "**Stage:** {}\n", state.current_stage());

    if !task.is_empty() {
        let _ = writeln!(b, "## Task\n\n{}\n", task);
    }

    write_project_context(&mut b, settings);

    let _ = writeln!(b, "## Requirements\n");
    let _ = writeln!(
        b,
        "{}\n",
        read_or(&config.requirements_file, "_No requirements defined yet._")
    );

    write_testing(&mut b, settings);

    let _ = writeln!(b, "## Completion\n");
    let _ = writeln!(b, "When the task is complete:");
    let _ = writeln!(b, "- Ensure the code builds and the tests pass");
    let _ = writeln!(
        b,
        "- Track the work as a plan in `.foreman/phases/` (e.g. `01-{}.md`) and mark it with `foreman phase <name> done`",
        IMPL_BRIEF
    );
    let _ = writeln!(b, "- Run `foreman gate implementation` to close the project");

    b
}

/// Generate a brief by name and write it to `briefs/<name>.md`.
///
/// `impl` produces the quick implementation brief; anything else names a phase.
pub fn generate_and_save(
    config: &Config,
    settings: &ForemanToml,
    state: &ProjectState,
    name: &str,
) -> Result<String> {
    let content = if name == IMPL_BRIEF {
        quick_brief(config, settings, state)
    } else {
        phase_brief(config, settings, state, name)?
    };
    save(config, name, &content)?;
    Ok(content)
}

pub fn save(config: &Config, name: &str, content: &str) -> Result<()> {
    fs::create_dir_all(&config.briefs_dir).with_context(|| {
        format!(
            "Failed to create briefs directory: {}",
            config.briefs_dir.display()
        )
    })?;
    let path = config.brief_file(name);
    fs::write(&path, content)
        .with_context(|| format!("Failed to write brief: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "brief written");
    Ok(())
}
