//! Project state: the workflow gate state machine.
//!
//! [`ProjectState`] owns the gate registry, the phase tracker and the current
//! stage. All mutating operations are atomic; a failed call returns a
//! [`WorkflowError`] and leaves the state exactly as it was.

pub mod manager;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::WorkflowError;
use crate::gates::{Gate, GateRegistry, GateStatus, Reviewer};
use crate::phase::{Phase, PhaseStatus, PhaseTracker, ReconcileReport};
use crate::validate::ValidationResult;
use crate::workflow::{self, FULL_STAGES, Preset, Stage, Workflow};

pub use manager::StateManager;

/// Result of running a validated stage through the gate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Validation failed; nothing changed.
    NotReady,
    /// The gate approved itself. `advanced_to` is set when the stage moved on.
    Approved { advanced_to: Option<Stage> },
    /// Waiting for a human reviewer.
    PendingReview,
    /// The gate was not open, so validation had no effect.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    current_stage: Stage,
    gates: GateRegistry,
    #[serde(default)]
    phases: PhaseTracker,
    #[serde(default)]
    quick_mode: bool,
    #[serde(default)]
    minimal_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quick_task: Option<String>,
    /// Auto-advance threshold, 0-100. Zero disables auto-advance.
    #[serde(default)]
    confidence: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    workflow: Option<Workflow>,
}

impl ProjectState {
    // =========================================
    // Construction
    // =========================================

    fn build(
        stages: &[Stage],
        workflow: Option<Workflow>,
        quick_mode: bool,
        minimal: bool,
        confidence: u8,
    ) -> Self {
        let now = Utc::now();
        let mut gates = GateRegistry::new();
        let last = stages.len().saturating_sub(1);
        let mut current_stage = stages.first().copied().unwrap_or(Stage::Requirements);

        for (i, stage) in stages.iter().enumerate() {
            let gate = if minimal {
                if i == last {
                    current_stage = *stage;
                    Gate::open()
                } else {
                    Gate::approved(Reviewer::Auto, now)
                }
            } else if i == 0 {
                Gate::open()
            } else {
                Gate::blocked()
            };
            gates.insert(*stage, gate);
        }

        Self {
            current_stage,
            gates,
            phases: PhaseTracker::new(),
            quick_mode,
            minimal_mode: minimal,
            quick_task: None,
            confidence: confidence.min(100),
            workflow,
        }
    }

    /// Full four-stage project with no explicit workflow and auto-advance off.
    pub fn new_default() -> Self {
        Self::build(&FULL_STAGES, None, false, false, 0)
    }

    /// Quick project: requirements then implementation.
    pub fn new_quick_mode(task: &str, confidence: u8) -> Self {
        let mut state = Self::build(
            Workflow::quick().stages(),
            Some(Workflow::quick()),
            true,
            false,
            confidence,
        );
        state.quick_task = Some(task.to_string());
        state
    }

    /// Quick project that starts directly in implementation.
    pub fn new_minimal_mode(task: &str) -> Self {
        let mut state = Self::build(
            Workflow::quick().stages(),
            Some(Workflow::quick()),
            true,
            true,
            100,
        );
        state.quick_task = Some(task.to_string());
        state
    }

    /// Project with an explicit workflow.
    ///
    /// Minimal mode pre-approves every stage except the last, which becomes
    /// current. Workflows of two stages or fewer count as quick mode.
    pub fn with_workflow(workflow: Workflow, confidence: u8, minimal: bool) -> Self {
        let quick_mode = workflow.len() <= 2;
        let stages = workflow.stages().to_vec();
        Self::build(&stages, Some(workflow), quick_mode, minimal, confidence)
    }

    /// Project configured by a named preset.
    pub fn from_preset(preset: Preset, task: Option<&str>) -> Self {
        let defaults = preset.defaults();
        let mut state =
            Self::with_workflow(defaults.workflow, defaults.auto_advance, defaults.minimal);
        state.quick_task = task.map(str::to_string);
        state
    }

    // =========================================
    // Accessors
    // =========================================

    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    pub fn gates(&self) -> &GateRegistry {
        &self.gates
    }

    pub fn gate(&self, stage: Stage) -> Option<&Gate> {
        self.gates.get(stage)
    }

    pub fn current_gate(&self) -> Option<&Gate> {
        self.gates.get(self.current_stage)
    }

    pub fn phases(&self) -> &PhaseTracker {
        &self.phases
    }

    pub fn quick_mode(&self) -> bool {
        self.quick_mode
    }

    pub fn minimal_mode(&self) -> bool {
        self.minimal_mode
    }

    pub fn quick_task(&self) -> Option<&str> {
        self.quick_task.as_deref()
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn workflow(&self) -> Option<&Workflow> {
        self.workflow.as_ref()
    }

    /// Stages of the active workflow, in order.
    pub fn active_stages(&self) -> &[Stage] {
        workflow::active_stages(self.workflow.as_ref(), self.quick_mode)
    }

    pub fn is_stage_in_workflow(&self, stage: Stage) -> bool {
        self.active_stages().contains(&stage)
    }

    pub fn next_stage(&self, stage: Stage) -> Option<Stage> {
        workflow::next_stage(self.workflow.as_ref(), self.quick_mode, stage)
    }

    /// True once the final stage of the workflow is approved.
    pub fn is_complete(&self) -> bool {
        self.next_stage(self.current_stage).is_none()
            && self.current_gate().is_some_and(Gate::is_approved)
    }

    // =========================================
    // Gate operations
    // =========================================

    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let mut draft = self.clone();
        let out = f(&mut draft)?;
        *self = draft;
        Ok(out)
    }

    /// Approve an open or pending-review gate.
    ///
    /// Approving the current stage advances to the next one when there is
    /// one; the stage advanced to is returned.
    pub fn approve_gate(
        &mut self,
        stage: Stage,
        approved_by: Reviewer,
    ) -> Result<Option<Stage>, WorkflowError> {
        self.transact(|state| {
            state.gates.approve(stage, approved_by, Utc::now())?;
            tracing::debug!(%stage, by = %approved_by, "gate approved");

            if stage == state.current_stage && state.next_stage(stage).is_some() {
                return state.advance_stage().map(Some);
            }
            Ok(None)
        })
    }

    /// Send a pending-review gate back to open.
    pub fn reject_gate(&mut self, stage: Stage, reason: &str) -> Result<(), WorkflowError> {
        self.transact(|state| {
            state.gates.reject(stage, reason)?;
            tracing::debug!(%stage, reason, "gate rejected");
            Ok(())
        })
    }

    /// Force a gate's status without the usual transition checks.
    pub fn set_gate_status(&mut self, stage: Stage, status: GateStatus) -> Result<(), WorkflowError> {
        self.transact(|state| {
            state.gates.force_status(stage, status, Utc::now())?;
            tracing::debug!(%stage, %status, "gate status forced");
            Ok(())
        })
    }

    /// Route a validation result through the gate of `stage`.
    pub fn evaluate_gate(
        &mut self,
        stage: Stage,
        validation: &ValidationResult,
        reviewer: Reviewer,
    ) -> Result<GateOutcome, WorkflowError> {
        let gate = self
            .gates
            .get(stage)
            .ok_or_else(|| WorkflowError::gate_not_found(stage))?;

        if !validation.passed {
            return Ok(GateOutcome::NotReady);
        }
        if gate.status() != GateStatus::Open {
            return Ok(GateOutcome::Unchanged);
        }

        match reviewer {
            Reviewer::Auto => {
                let advanced_to = self.approve_gate(stage, Reviewer::Auto)?;
                Ok(GateOutcome::Approved { advanced_to })
            }
            Reviewer::Human => {
                self.transact(|state| state.gates.request_review(stage))?;
                tracing::debug!(%stage, "gate pending review");
                Ok(GateOutcome::PendingReview)
            }
        }
    }

    // =========================================
    // Stage advancement
    // =========================================

    pub fn can_advance_stage(&self) -> bool {
        self.current_gate().is_some_and(Gate::is_approved)
    }

    /// Move to the next stage of the workflow and open its gate.
    pub fn advance_stage(&mut self) -> Result<Stage, WorkflowError> {
        if !self.can_advance_stage() {
            return Err(WorkflowError::IllegalTransition(
                "cannot advance: current stage gate not approved".to_string(),
            ));
        }
        let next = self
            .next_stage(self.current_stage)
            .ok_or(WorkflowError::TerminalStage {
                stage: self.current_stage,
            })?;

        self.transact(|state| {
            state.gates.open(next)?;
            tracing::debug!(from = %state.current_stage, to = %next, "stage advanced");
            state.current_stage = next;
            Ok(next)
        })
    }

    /// Whether a reported confidence clears the configured threshold.
    pub fn should_auto_advance(&self, confidence: u8) -> bool {
        self.confidence > 0 && confidence >= self.confidence
    }

    // =========================================
    // Phases
    // =========================================

    pub fn add_phase(&mut self, name: &str) {
        self.phases.add(name);
    }

    pub fn get_phase(&self, name: &str) -> Option<&Phase> {
        self.phases.get(name)
    }

    pub fn set_phase_status(&mut self, name: &str, status: PhaseStatus) -> Result<(), WorkflowError> {
        self.phases.set_status(name, status)?;
        tracing::debug!(phase = name, %status, "phase status set");
        Ok(())
    }

    pub fn all_phases_done(&self) -> bool {
        self.phases.all_done()
    }

    /// Align the phase list with the phase plans discovered on disk.
    pub fn reconcile_phases<S: AsRef<str>>(&mut self, discovered: &[S]) -> ReconcileReport {
        let report = self.phases.reconcile(discovered);
        if !report.is_empty() {
            tracing::debug!(added = ?report.added, removed = ?report.removed, "phases reconciled");
        }
        report
    }

    // =========================================
    // Loading
    // =========================================

    /// Repair a freshly loaded state so every active stage has a gate.
    ///
    /// Missing gates are created blocked, or open for the current stage, and
    /// a blocked current gate is opened. Returns the stages that were touched.
    /// Fails if the current stage is not part of the active workflow.
    pub fn normalize(&mut self) -> Result<Vec<Stage>, WorkflowError> {
        let current = self.current_stage;
        if !self.is_stage_in_workflow(current) {
            return Err(WorkflowError::InvalidWorkflow(format!(
                "current stage '{}' is not part of the workflow",
                current
            )));
        }
        self.confidence = self.confidence.min(100);

        let mut repaired = Vec::new();
        for stage in self.active_stages().to_vec() {
            if !self.gates.contains(stage) {
                let gate = if stage == current {
                    Gate::open()
                } else {
                    Gate::blocked()
                };
                self.gates.insert(stage, gate);
                repaired.push(stage);
            } else if stage == current
                && self.gates.get(stage).map(Gate::status) == Some(GateStatus::Blocked)
            {
                self.gates.open(stage)?;
                repaired.push(stage);
            }
        }
        Ok(repaired)
    }
}

impl Default for ProjectState {
    fn default() -> Self {
        Self::new_default()
    }
}
