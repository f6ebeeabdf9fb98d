//! Terminal presentation for gates, phases and the watch loop.

pub mod icons;

use console::{Emoji, StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::gates::GateStatus;
use crate::phase::PhaseStatus;

pub fn gate_icon(status: GateStatus) -> Emoji<'static, 'static> {
    match status {
        GateStatus::Approved => icons::CHECK,
        GateStatus::Open => icons::GATE_OPEN,
        GateStatus::PendingReview => icons::GATE_PENDING,
        GateStatus::Blocked => icons::GATE_BLOCKED,
    }
}

pub fn gate_status_styled(status: GateStatus) -> StyledObject<&'static str> {
    let s = style(status.as_str());
    match status {
        GateStatus::Approved => s.green(),
        GateStatus::Open => s.cyan(),
        GateStatus::PendingReview => s.yellow(),
        GateStatus::Blocked => s.dim(),
    }
}

pub fn phase_icon(status: PhaseStatus) -> Emoji<'static, 'static> {
    match status {
        PhaseStatus::Done => icons::CHECK,
        PhaseStatus::InProgress => icons::PHASE_ACTIVE,
        PhaseStatus::Planned => icons::PHASE_PLANNED,
    }
}

pub fn phase_status_styled(status: PhaseStatus) -> StyledObject<&'static str> {
    let s = style(status.as_str());
    match status {
        PhaseStatus::Done => s.green(),
        PhaseStatus::InProgress => s.blue(),
        PhaseStatus::Planned => s.dim(),
    }
}

/// Spinner shown while `foreman watch` waits for changes.
pub fn watch_spinner(interval: Duration) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Watching for changes every {}s (Ctrl+C to stop)",
        interval.as_secs()
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
