//! Phase tracking for the implementation stage.
//!
//! This module provides:
//! - `PhaseStatus` and `Phase`, the units of work inside implementation
//! - `PhaseTracker`, the ordered phase list with status transitions
//! - Reconciliation of the tracker against phase plans found on disk
//! - `discover_phase_definitions` for listing `.foreman/phases/*.md`

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::WorkflowError;

/// Phase plan file that describes the breakdown rather than a phase.
pub const OVERVIEW_STEM: &str = "overview";

static PLAN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+-[A-Za-z0-9_-]+$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseStatus {
    #[default]
    Planned,
    InProgress,
    Done,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Planned => "planned",
            PhaseStatus::InProgress => "in-progress",
            PhaseStatus::Done => "done",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(PhaseStatus::Planned),
            "in-progress" => Ok(PhaseStatus::InProgress),
            "done" => Ok(PhaseStatus::Done),
            _ => Err(WorkflowError::InvalidStatus {
                kind: "phase",
                value: s.to_string(),
                expected: "planned, in-progress, done",
            }),
        }
    }
}

/// A named unit of work tracked during implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub status: PhaseStatus,
}

impl Phase {
    pub fn planned(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: PhaseStatus::Planned,
        }
    }
}

/// What changed during a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Ordered phase list. Names are unique; order is insertion or discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseTracker {
    phases: Vec<Phase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a planned phase. Adding a name that already exists is a no-op.
    pub fn add(&mut self, name: &str) {
        if self.get(name).is_none() {
            self.phases.push(Phase::planned(name));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Phase> {
        self.phases.iter().find(|p| p.name == name)
    }

    pub fn set_status(&mut self, name: &str, status: PhaseStatus) -> Result<(), WorkflowError> {
        let phase = self
            .phases
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| WorkflowError::phase_not_found(name))?;
        phase.status = status;
        Ok(())
    }

    /// True when at least one phase exists and every phase is done.
    pub fn all_done(&self) -> bool {
        !self.phases.is_empty() && self.phases.iter().all(|p| p.status == PhaseStatus::Done)
    }

    /// Rebuild the list from `discovered` names.
    ///
    /// Surviving names keep their status, new names start planned, names no
    /// longer discovered are dropped. The result follows discovery order.
    pub fn reconcile<S: AsRef<str>>(&mut self, discovered: &[S]) -> ReconcileReport {
        let existing: HashMap<&str, PhaseStatus> = self
            .phases
            .iter()
            .map(|p| (p.name.as_str(), p.status))
            .collect();

        let mut report = ReconcileReport::default();
        let mut rebuilt: Vec<Phase> = Vec::with_capacity(discovered.len());
        for name in discovered {
            let name = name.as_ref();
            if rebuilt.iter().any(|p| p.name == name) {
                continue;
            }
            let status = match existing.get(name) {
                Some(status) => *status,
                None => {
                    report.added.push(name.to_string());
                    PhaseStatus::Planned
                }
            };
            rebuilt.push(Phase {
                name: name.to_string(),
                status,
            });
        }

        report.removed = self
            .phases
            .iter()
            .filter(|p| !rebuilt.iter().any(|r| r.name == p.name))
            .map(|p| p.name.clone())
            .collect();

        self.phases = rebuilt;
        report
    }

    pub fn iter(&self) -> impl Iterator<Item = &Phase> {
        self.phases.iter()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn count(&self, status: PhaseStatus) -> usize {
        self.phases.iter().filter(|p| p.status == status).count()
    }

    /// Phases listed before `name`, or all of them if `name` is unknown.
    pub fn preceding(&self, name: &str) -> &[Phase] {
        let idx = self
            .phases
            .iter()
            .position(|p| p.name == name)
            .unwrap_or(self.phases.len());
        &self.phases[..idx]
    }
}

/// True if `name` looks like a numbered phase plan, e.g. `2-backend`.
pub fn is_phase_plan_name(name: &str) -> bool {
    PLAN_NAME_RE.is_match(name)
}

/// List phase names from the `*.md` files in `phases_dir`, sorted, without `overview`.
///
/// A missing directory yields an empty list.
pub fn discover_phase_definitions(phases_dir: &Path) -> Result<Vec<String>> {
    if !phases_dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = phases_dir.join("*.md");
    let pattern = pattern.to_string_lossy();
    let mut names = Vec::new();
    for entry in glob::glob(&pattern)
        .with_context(|| format!("Invalid phase glob pattern: {}", pattern))?
    {
        let path = entry.context("Failed to read phase plan entry")?;
        if !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            && stem != OVERVIEW_STEM
        {
            names.push(stem.to_string());
        }
    }
    names.sort();
    Ok(names)
}
