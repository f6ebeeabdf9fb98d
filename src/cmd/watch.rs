//! Poll the project and report progress: `foreman watch`.

use anyhow::Result;
use console::style;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use foreman::config::Config;
use foreman::gates::GateStatus;
use foreman::phase::PhaseStatus;
use foreman::state::ProjectState;
use foreman::ui::icons::FINISH;
use foreman::ui::{gate_icon, gate_status_styled, phase_icon, phase_status_styled, watch_spinner};
use foreman::workflow::Stage;

use super::super::Cli;

/// The parts of a project the watch loop reports on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    stage: Stage,
    complete: bool,
    gates: BTreeMap<Stage, GateStatus>,
    phases: BTreeMap<String, PhaseStatus>,
}

impl Snapshot {
    fn take(config: &Config) -> Result<Self> {
        let mut state = config.state_manager().load()?;
        // In-memory only; watch never writes state.
        config.sync_phases(&mut state)?;
        Ok(Self::of(&state))
    }

    fn of(state: &ProjectState) -> Self {
        Self {
            stage: state.current_stage(),
            complete: state.is_complete(),
            gates: state
                .active_stages()
                .iter()
                .filter_map(|&stage| state.gate(stage).map(|g| (stage, g.status())))
                .collect(),
            phases: state
                .phases()
                .iter()
                .map(|p| (p.name.clone(), p.status))
                .collect(),
        }
    }

    /// Human-readable lines describing what changed since `prev`.
    fn changes_since(&self, prev: &Snapshot) -> Vec<String> {
        let mut lines = Vec::new();

        if self.stage != prev.stage {
            lines.push(format!(
                "Stage: {} -> {}",
                prev.stage,
                style(self.stage).cyan().bold()
            ));
        }
        for (stage, &status) in &self.gates {
            if prev.gates.get(stage) != Some(&status) {
                lines.push(format!(
                    "{}Gate {}: {}",
                    gate_icon(status),
                    stage,
                    gate_status_styled(status)
                ));
            }
        }
        for (name, &status) in &self.phases {
            match prev.phases.get(name) {
                None => lines.push(format!("{}New phase: {}", phase_icon(status), name)),
                Some(&old) if old != status => lines.push(format!(
                    "{}Phase {}: {}",
                    phase_icon(status),
                    name,
                    phase_status_styled(status)
                )),
                Some(_) => {}
            }
        }
        for name in prev.phases.keys() {
            if !self.phases.contains_key(name) {
                lines.push(format!("Phase removed: {}", name));
            }
        }
        lines
    }
}

pub async fn cmd_watch(project_dir: &Path, cli: &Cli, interval: u64) -> Result<()> {
    let config = Config::discover(project_dir, cli.verbose)?;
    let interval = Duration::from_secs(interval);

    let mut last = Snapshot::take(&config)?;
    println!(
        "Watching {} (stage: {})",
        config.project_dir.display(),
        style(last.stage).cyan()
    );
    if last.complete {
        println!("{}All stages completed!", FINISH);
        return Ok(());
    }

    let spinner = watch_spinner(interval);
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                spinner.finish_and_clear();
                println!("Stopped watching.");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let current = match Snapshot::take(&config) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("failed to read project state: {:#}", e);
                continue;
            }
        };

        for line in current.changes_since(&last) {
            spinner.println(line);
        }
        if current.complete {
            spinner.finish_and_clear();
            println!("{}All stages completed!", FINISH);
            return Ok(());
        }
        last = current;
    }
}
