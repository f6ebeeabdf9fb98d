//! Stage gates and the gate registry.
//!
//! Each stage of the active workflow owns exactly one [`Gate`]. A gate moves
//! through these states:
//!
//! ```text
//! blocked ──(stage becomes current)──▶ open
//! open ──(validated, reviewer auto)──▶ approved
//! open ──(validated, reviewer human)──▶ pending-review
//! pending-review ──(approve)──▶ approved
//! pending-review ──(reject)──▶ open
//! ```
//!
//! The approval timestamp and approver live inside [`GateState::Approved`],
//! so a gate cannot be approved without them or carry them while unapproved.

pub mod prompt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::WorkflowError;
use crate::workflow::Stage;

pub use prompt::{ReviewDecision, prompt_review};

/// Gate status as it appears in state.yaml and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateStatus {
    Blocked,
    Open,
    PendingReview,
    Approved,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateStatus::Blocked => "blocked",
            GateStatus::Open => "open",
            GateStatus::PendingReview => "pending-review",
            GateStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocked" => Ok(GateStatus::Blocked),
            "open" => Ok(GateStatus::Open),
            "pending-review" => Ok(GateStatus::PendingReview),
            "approved" => Ok(GateStatus::Approved),
            _ => Err(WorkflowError::InvalidStatus {
                kind: "gate",
                value: s.to_string(),
                expected: "blocked, open, pending-review, approved",
            }),
        }
    }
}

/// Who approves a gate once its stage validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reviewer {
    /// The gate approves itself as soon as validation passes.
    #[default]
    Auto,
    /// Validation parks the gate in pending-review until a human approves it.
    Human,
}

impl Reviewer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reviewer::Auto => "auto",
            Reviewer::Human => "human",
        }
    }
}

impl fmt::Display for Reviewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reviewer {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Reviewer::Auto),
            "human" => Ok(Reviewer::Human),
            _ => Err(WorkflowError::InvalidStatus {
                kind: "reviewer",
                value: s.to_string(),
                expected: "auto, human",
            }),
        }
    }
}

/// Approval metadata recorded when a gate is approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approval {
    pub at: DateTime<Utc>,
    pub by: Reviewer,
}

/// The state of a gate. Only the approved variant carries approval metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Blocked,
    Open,
    PendingReview,
    Approved(Approval),
}

/// The approval checkpoint guarding advancement out of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGate", into = "RawGate")]
pub struct Gate {
    state: GateState,
    reason: String,
}

impl Gate {
    pub fn blocked() -> Self {
        Self {
            state: GateState::Blocked,
            reason: String::new(),
        }
    }

    pub fn open() -> Self {
        Self {
            state: GateState::Open,
            reason: String::new(),
        }
    }

    pub fn approved(by: Reviewer, at: DateTime<Utc>) -> Self {
        Self {
            state: GateState::Approved(Approval { at, by }),
            reason: String::new(),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn status(&self) -> GateStatus {
        match self.state {
            GateState::Blocked => GateStatus::Blocked,
            GateState::Open => GateStatus::Open,
            GateState::PendingReview => GateStatus::PendingReview,
            GateState::Approved(_) => GateStatus::Approved,
        }
    }

    pub fn approval(&self) -> Option<Approval> {
        match self.state {
            GateState::Approved(approval) => Some(approval),
            _ => None,
        }
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approval().map(|a| a.at)
    }

    pub fn approved_by(&self) -> Option<Reviewer> {
        self.approval().map(|a| a.by)
    }

    /// Rejection reason, empty when none was given or it has been cleared.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn is_approved(&self) -> bool {
        matches!(self.state, GateState::Approved(_))
    }
}

/// Flat on-disk shape of a gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawGate {
    status: GateStatus,
    #[serde(default)]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    approved_by: String,
    #[serde(default)]
    reason: String,
}

impl TryFrom<RawGate> for Gate {
    type Error = String;

    fn try_from(raw: RawGate) -> Result<Self, Self::Error> {
        let state = match raw.status {
            GateStatus::Blocked => GateState::Blocked,
            GateStatus::Open => GateState::Open,
            GateStatus::PendingReview => GateState::PendingReview,
            GateStatus::Approved => {
                let at = raw
                    .approved_at
                    .ok_or_else(|| "approved gate is missing approved_at".to_string())?;
                let by = if raw.approved_by.is_empty() {
                    Reviewer::Auto
                } else {
                    raw.approved_by
                        .parse::<Reviewer>()
                        .map_err(|e| e.to_string())?
                };
                GateState::Approved(Approval { at, by })
            }
        };
        Ok(Gate {
            state,
            reason: raw.reason,
        })
    }
}

impl From<Gate> for RawGate {
    fn from(gate: Gate) -> Self {
        let approval = gate.approval();
        RawGate {
            status: gate.status(),
            approved_at: approval.map(|a| a.at),
            approved_by: approval
                .map(|a| a.by.to_string())
                .unwrap_or_default(),
            reason: gate.reason,
        }
    }
}

/// One gate per stage of the active workflow, keyed by stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GateRegistry {
    gates: BTreeMap<Stage, Gate>,
}

impl GateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stage: Stage, gate: Gate) {
        self.gates.insert(stage, gate);
    }

    pub fn get(&self, stage: Stage) -> Option<&Gate> {
        self.gates.get(&stage)
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.gates.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &Gate)> {
        self.gates.iter().map(|(stage, gate)| (*stage, gate))
    }

    fn gate_mut(&mut self, stage: Stage) -> Result<&mut Gate, WorkflowError> {
        self.gates
            .get_mut(&stage)
            .ok_or_else(|| WorkflowError::gate_not_found(stage))
    }

    /// Approve an open or pending-review gate.
    pub fn approve(
        &mut self,
        stage: Stage,
        by: Reviewer,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let gate = self.gate_mut(stage)?;
        match gate.state {
            GateState::Open | GateState::PendingReview => {
                gate.state = GateState::Approved(Approval { at, by });
                gate.reason.clear();
                Ok(())
            }
            _ => Err(WorkflowError::IllegalTransition(format!(
                "gate {} is {}, cannot approve",
                stage,
                gate.status()
            ))),
        }
    }

    /// Send a pending-review gate back to open with the given reason.
    pub fn reject(&mut self, stage: Stage, reason: &str) -> Result<(), WorkflowError> {
        let gate = self.gate_mut(stage)?;
        if gate.state != GateState::PendingReview {
            return Err(WorkflowError::IllegalTransition(format!(
                "gate {} is {}, can only reject pending-review gates",
                stage,
                gate.status()
            )));
        }
        gate.state = GateState::Open;
        gate.reason = reason.to_string();
        Ok(())
    }

    /// Park an open gate until a human reviews it.
    pub fn request_review(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        let gate = self.gate_mut(stage)?;
        if gate.state != GateState::Open {
            return Err(WorkflowError::IllegalTransition(format!(
                "gate {} is {}, only open gates can be sent for review",
                stage,
                gate.status()
            )));
        }
        gate.state = GateState::PendingReview;
        Ok(())
    }

    /// Open the gate of a stage that just became current, dropping any stale reason.
    pub fn open(&mut self, stage: Stage) -> Result<(), WorkflowError> {
        let gate = self.gate_mut(stage)?;
        gate.state = GateState::Open;
        gate.reason.clear();
        Ok(())
    }

    /// Administrative override of a gate's status.
    ///
    /// Forcing `approved` keeps an existing approval or records a human one at `at`.
    pub fn force_status(
        &mut self,
        stage: Stage,
        status: GateStatus,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let gate = self.gate_mut(stage)?;
        gate.state = match status {
            GateStatus::Blocked => GateState::Blocked,
            GateStatus::Open => GateState::Open,
            GateStatus::PendingReview => GateState::PendingReview,
            GateStatus::Approved => match gate.state {
                GateState::Approved(approval) => GateState::Approved(approval),
                _ => GateState::Approved(Approval {
                    at,
                    by: Reviewer::Human,
                }),
            },
        };
        Ok(())
    }
}
