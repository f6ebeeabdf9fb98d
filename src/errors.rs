//! Typed errors for the workflow gate state machine.
//!
//! Every core operation on [`crate::state::ProjectState`] returns a
//! [`WorkflowError`] on failure and leaves the state untouched. I/O and parse
//! failures around the core (state.yaml, foreman.toml, phase discovery) are
//! reported through `anyhow` with context instead.

use thiserror::Error;

use crate::workflow::Stage;

/// Errors from workflow resolution, gate transitions and phase tracking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid stage '{0}'. Valid stages: requirements, design, phases, implementation")]
    InvalidStage(String),

    #[error("Invalid {kind} status '{value}'. Valid values: {expected}")]
    InvalidStatus {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error("{0}")]
    IllegalTransition(String),

    #[error("Stage {stage} is the final stage of the workflow")]
    TerminalStage { stage: Stage },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

impl WorkflowError {
    pub(crate) fn gate_not_found(stage: Stage) -> Self {
        WorkflowError::NotFound {
            kind: "Gate",
            name: stage.to_string(),
        }
    }

    pub(crate) fn phase_not_found(name: &str) -> Self {
        WorkflowError::NotFound {
            kind: "Phase",
            name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_stage_lists_valid_stages() {
        let err = WorkflowError::InvalidStage("testing".to_string());
        let msg = err.to_string();
        assert!(msg.contains("testing"));
        assert!(msg.contains("requirements, design, phases, implementation"));
    }

    #[test]
    fn test_terminal_stage_carries_stage() {
        let err = WorkflowError::TerminalStage {
            stage: Stage::Implementation,
        };
        match &err {
            WorkflowError::TerminalStage { stage } => assert_eq!(*stage, Stage::Implementation),
            _ => panic!("Expected TerminalStage"),
        }
        assert!(err.to_string().contains("implementation"));
    }

    #[test]
    fn test_not_found_helpers() {
        let gate = WorkflowError::gate_not_found(Stage::Design);
        assert_eq!(gate.to_string(), "Gate 'design' not found");

        let phase = WorkflowError::phase_not_found("2-backend");
        assert_eq!(phase.to_string(), "Phase '2-backend' not found");
    }

    #[test]
    fn test_workflow_error_implements_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&WorkflowError::InvalidWorkflow("empty".into()));
    }

    #[test]
    fn test_workflow_error_converts_into_anyhow() {
        let err: anyhow::Error = WorkflowError::IllegalTransition("nope".into()).into();
        assert!(err.downcast_ref::<WorkflowError>().is_some());
    }
}
