//! Gate validation and review: `foreman gate`.

use anyhow::{Result, bail};
use console::style;
use std::path::Path;

use foreman::config::Config;
use foreman::gates::{GateStatus, ReviewDecision, Reviewer, prompt_review};
use foreman::state::{GateOutcome, ProjectState};
use foreman::ui::icons::{CHECK, CROSS, FINISH, GATE_PENDING, SPARKLE};
use foreman::validate::StageValidator;
use foreman::workflow::Stage;

use super::super::Cli;
use super::open_project;

/// What `foreman gate` was asked to do.
#[derive(Debug, Clone)]
pub enum GateAction {
    Validate,
    Approve,
    Reject { reason: String },
    SetReviewer(String),
    Review,
    Confidence(u8),
}

fn resolve_stage(state: &ProjectState, stage: Option<&str>) -> Result<Stage> {
    let stage = match stage {
        Some(name) => name.parse::<Stage>()?,
        None => state.current_stage(),
    };
    if !state.is_stage_in_workflow(stage) {
        let active: Vec<&str> = state.active_stages().iter().map(Stage::as_str).collect();
        bail!(
            "Stage '{}' is not part of this project's workflow (active stages: {})",
            stage,
            active.join(", ")
        );
    }
    Ok(stage)
}

fn gate_status(state: &ProjectState, stage: Stage) -> GateStatus {
    state
        .gate(stage)
        .map(|g| g.status())
        .unwrap_or(GateStatus::Blocked)
}

fn report_advance(advanced_to: Option<Stage>, state: &ProjectState) {
    match advanced_to {
        Some(next) => println!("Advanced to stage: {}", style(next).cyan().bold()),
        None if state.is_complete() => println!("{}All stages completed!", FINISH),
        None => {}
    }
}

fn require_pending(state: &ProjectState, stage: Stage, verb: &str) -> Result<()> {
    let status = gate_status(state, stage);
    if status != GateStatus::PendingReview {
        bail!(
            "Gate {} is {}, can only {} pending-review gates. Run 'foreman gate {}' first",
            stage,
            status,
            verb,
            stage
        );
    }
    Ok(())
}

pub fn cmd_gate(
    project_dir: &Path,
    cli: &Cli,
    stage: Option<&str>,
    action: GateAction,
) -> Result<()> {
    let (config, mut state) = open_project(project_dir, cli)?;
    let stage = resolve_stage(&state, stage)?;

    match action {
        GateAction::Validate => validate(&config, &mut state, stage, cli.yes),
        GateAction::Approve => {
            require_pending(&state, stage, "approve")?;
            approve(&config, &mut state, stage)
        }
        GateAction::Reject { reason } => reject(&config, &mut state, stage, &reason),
        GateAction::SetReviewer(reviewer) => {
            let reviewer: Reviewer = reviewer.parse()?;
            let mut settings = config.settings(cli.yes)?;
            settings.toml.set_reviewer(stage, reviewer);
            settings.save()?;
            println!("{}Set {} gate reviewer to: {}", CHECK, stage, reviewer);
            Ok(())
        }
        GateAction::Review => {
            require_pending(&state, stage, "review")?;
            let decision = if cli.yes {
                ReviewDecision::Approve
            } else {
                prompt_review(stage)?
            };
            match decision {
                ReviewDecision::Approve => approve(&config, &mut state, stage),
                ReviewDecision::Reject { reason } => reject(&config, &mut state, stage, &reason),
                ReviewDecision::Defer => {
                    println!("{}Gate {} left pending review", GATE_PENDING, stage);
                    Ok(())
                }
            }
        }
        GateAction::Confidence(confidence) => {
            if !confidence_meets_threshold(&state, confidence) {
                return Ok(());
            }
            validate(&config, &mut state, stage, cli.yes)
        }
    }
}

fn approve(config: &Config, state: &mut ProjectState, stage: Stage) -> Result<()> {
    let advanced_to = state.approve_gate(stage, Reviewer::Human)?;
    config.state_manager().save(state)?;

    println!("{}Gate {} approved!", CHECK, stage);
    report_advance(advanced_to, state);
    Ok(())
}

fn reject(config: &Config, state: &mut ProjectState, stage: Stage, reason: &str) -> Result<()> {
    state.reject_gate(stage, reason)?;
    config.state_manager().save(state)?;

    println!("{}Gate {} rejected", CROSS, stage);
    if !reason.is_empty() {
        println!("Reason: {}", reason);
    }
    println!("Status reset to 'open' for rework");
    Ok(())
}

/// Report the auto-advance check. Approval itself still goes through
/// validation and the stage's reviewer.
fn confidence_meets_threshold(state: &ProjectState, confidence: u8) -> bool {
    if state.confidence() == 0 {
        println!("Auto-advance is disabled for this project");
        return false;
    }
    if !state.should_auto_advance(confidence) {
        println!(
            "Confidence {}% is below the auto-advance threshold of {}%",
            confidence,
            state.confidence()
        );
        return false;
    }
    println!(
        "{}Confidence {}% meets the auto-advance threshold of {}%",
        SPARKLE,
        confidence,
        state.confidence()
    );
    true
}

fn validate(config: &Config, state: &mut ProjectState, stage: Stage, yes: bool) -> Result<()> {
    let manager = config.state_manager();
    if matches!(stage, Stage::Phases | Stage::Implementation) {
        config.sync_phases(state)?;
        manager.save(state)?;
    }

    let settings = config.settings(yes)?;
    let reviewer = settings.reviewer_for(stage);
    let result = config.validator().validate(stage, state);

    println!("Gate: {}", stage);
    println!("Status: {}", gate_status(state, stage));
    println!("Reviewer: {}", reviewer);
    println!();

    if result.passed {
        println!("{}{}", CHECK, style(&result.message).green().bold());
    } else {
        println!("{}{}", CROSS, style(&result.message).red().bold());
    }
    if !result.details.is_empty() {
        println!();
        for detail in &result.details {
            println!("  {}", detail);
        }
    }
    println!();

    match state.evaluate_gate(stage, &result, reviewer)? {
        GateOutcome::NotReady => {
            println!(
                "Complete the items above, then run 'foreman gate {}' again",
                stage
            );
        }
        GateOutcome::Approved { advanced_to } => {
            manager.save(state)?;
            println!("{}", style(format!("{}Gate approved automatically!", SPARKLE)).cyan().bold());
            report_advance(advanced_to, state);
        }
        GateOutcome::PendingReview => {
            manager.save(state)?;
            println!(
                "{}",
                style(format!("{}Gate validation passed - awaiting human review", GATE_PENDING))
                    .yellow()
                    .bold()
            );
            println!(
                "Run 'foreman gate {} --approve' or 'foreman gate {} --review' to approve",
                stage, stage
            );
        }
        GateOutcome::Unchanged => {
            tracing::debug!(%stage, "gate not open, validation left it unchanged");
        }
    }
    Ok(())
}
