//! Stage identifiers and workflow resolution.
//!
//! A workflow is the ordered list of stages a project moves through. Three
//! sources can define it, highest precedence first:
//!
//! 1. an explicit custom workflow (`[workflow] stages = [...]` or `init --workflow`)
//! 2. quick mode, which uses [`QUICK_STAGES`]
//! 3. the full four-stage list, [`FULL_STAGES`]
//!
//! [`next_stage`] is the only place that answers "what comes after this
//! stage"; both gate approval and stage advancement go through it.

pub mod preset;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::WorkflowError;

pub use preset::{Preset, PresetDefaults};

/// A stage of the project lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Requirements,
    Design,
    Phases,
    Implementation,
}

/// Ordered stages of the full workflow.
pub const FULL_STAGES: [Stage; 4] = [
    Stage::Requirements,
    Stage::Design,
    Stage::Phases,
    Stage::Implementation,
];

/// Ordered stages of quick mode (no design or phases).
pub const QUICK_STAGES: [Stage; 2] = [Stage::Requirements, Stage::Implementation];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Requirements => "requirements",
            Stage::Design => "design",
            Stage::Phases => "phases",
            Stage::Implementation => "implementation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "requirements" => Ok(Stage::Requirements),
            "design" => Ok(Stage::Design),
            "phases" => Ok(Stage::Phases),
            "implementation" => Ok(Stage::Implementation),
            _ => Err(WorkflowError::InvalidStage(s.to_string())),
        }
    }
}

/// Returns true if `stage` names a recognized stage.
pub fn is_valid_stage(stage: &str) -> bool {
    stage.parse::<Stage>().is_ok()
}

/// Returns true if `status` names a recognized gate status.
pub fn is_valid_gate_status(status: &str) -> bool {
    status.parse::<crate::gates::GateStatus>().is_ok()
}

/// Returns true if `status` names a recognized phase status.
pub fn is_valid_phase_status(status: &str) -> bool {
    status.parse::<crate::phase::PhaseStatus>().is_ok()
}

/// A validated custom workflow.
///
/// Always non-empty, always contains [`Stage::Implementation`], never repeats
/// a stage. The position of implementation is not constrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Stage>", into = "Vec<Stage>")]
pub struct Workflow(Vec<Stage>);

impl Workflow {
    /// Validate an ordered list of stages.
    pub fn new(stages: Vec<Stage>) -> Result<Self, WorkflowError> {
        if stages.is_empty() {
            return Err(WorkflowError::InvalidWorkflow(
                "workflow cannot be empty".to_string(),
            ));
        }
        if !stages.contains(&Stage::Implementation) {
            return Err(WorkflowError::InvalidWorkflow(
                "workflow must include 'implementation'".to_string(),
            ));
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].contains(stage) {
                return Err(WorkflowError::InvalidWorkflow(format!(
                    "stage '{}' appears more than once",
                    stage
                )));
            }
        }
        Ok(Self(stages))
    }

    /// Parse and validate stage identifiers, e.g. from `--workflow a,b,c`.
    ///
    /// Unrecognized identifiers are reported as `InvalidWorkflow`.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, WorkflowError> {
        let stages = names
            .iter()
            .map(|name| {
                name.as_ref().parse::<Stage>().map_err(|_| {
                    WorkflowError::InvalidWorkflow(format!("unknown stage '{}'", name.as_ref()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(stages)
    }

    /// The full four-stage workflow.
    pub fn full() -> Self {
        Self(FULL_STAGES.to_vec())
    }

    /// The quick two-stage workflow.
    pub fn quick() -> Self {
        Self(QUICK_STAGES.to_vec())
    }

    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Stage {
        self.0[0]
    }

    pub fn last(&self) -> Stage {
        self.0[self.0.len() - 1]
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.0.contains(&stage)
    }
}

impl TryFrom<Vec<Stage>> for Workflow {
    type Error = WorkflowError;

    fn try_from(stages: Vec<Stage>) -> Result<Self, Self::Error> {
        Self::new(stages)
    }
}

impl From<Workflow> for Vec<Stage> {
    fn from(workflow: Workflow) -> Self {
        workflow.0
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Stage::as_str).collect();
        f.write_str(&names.join(" → "))
    }
}

/// The legacy fixed ordering for a project without a custom workflow.
pub fn legacy_stages(quick_mode: bool) -> &'static [Stage] {
    if quick_mode {
        &QUICK_STAGES
    } else {
        &FULL_STAGES
    }
}

/// Resolve the active stage list: custom workflow, then quick mode, then full.
pub fn active_stages(custom: Option<&Workflow>, quick_mode: bool) -> &[Stage] {
    match custom {
        Some(workflow) => workflow.stages(),
        None => legacy_stages(quick_mode),
    }
}

/// The stage following `stage`, or `None` if it is final or not in the ordering.
///
/// Tier one is the custom workflow when one is set. Projects created before
/// custom workflows existed have none, so tier two falls back to the fixed
/// ordering for their mode.
pub fn next_stage(custom: Option<&Workflow>, quick_mode: bool, stage: Stage) -> Option<Stage> {
    let order = active_stages(custom, quick_mode);
    let idx = order.iter().position(|s| *s == stage)?;
    order.get(idx + 1).copied()
}
