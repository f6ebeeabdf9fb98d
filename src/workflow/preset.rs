//! Named workflow presets.
//!
//! | Preset    | Aliases   | Stages                         | Auto-advance | Gates before implementation |
//! |-----------|-----------|--------------------------------|--------------|-----------------------------|
//! | `minimal` | `nightly` | requirements → implementation  | 100          | pre-approved                |
//! | `light`   |           | requirements → implementation  | 70           | normal                      |
//! | `full`    | `product` | all four stages                | off          | human review for requirements and design |
//!
//! Mapping a name to its defaults is a pure function so it can be used by
//! `init`, by config resolution and by tests without touching project state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Stage, Workflow};
use crate::errors::WorkflowError;
use crate::gates::Reviewer;

/// A canonical workflow preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Scripts and hotfixes: no review, straight to implementation.
    Minimal,
    /// Small tools: a requirements gate, then implementation.
    Light,
    /// Products: requirements, design, phases, implementation.
    Full,
}

/// Everything a preset implies for a new project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDefaults {
    pub workflow: Workflow,
    /// Confidence threshold for auto-advance (0 disables it).
    pub auto_advance: u8,
    /// Pre-approve every gate except the last one.
    pub minimal: bool,
    pub reviewer_overrides: Vec<(Stage, Reviewer)>,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Minimal => "minimal",
            Preset::Light => "light",
            Preset::Full => "full",
        }
    }

    /// Resolve a preset name, accepting the legacy `nightly` and `product` aliases.
    pub fn parse(name: &str) -> Result<Self, WorkflowError> {
        match name.trim().to_lowercase().as_str() {
            "minimal" | "nightly" => Ok(Preset::Minimal),
            "light" => Ok(Preset::Light),
            "full" | "product" => Ok(Preset::Full),
            other => Err(WorkflowError::InvalidWorkflow(format!(
                "unknown preset '{}'. Valid presets: minimal, light, full (aliases: nightly, product)",
                other
            ))),
        }
    }

    /// Presets that skip design and phases.
    pub fn is_quick(&self) -> bool {
        matches!(self, Preset::Minimal | Preset::Light)
    }

    pub fn defaults(&self) -> PresetDefaults {
        match self {
            Preset::Minimal => PresetDefaults {
                workflow: Workflow::quick(),
                auto_advance: 100,
                minimal: true,
                reviewer_overrides: Vec::new(),
            },
            Preset::Light => PresetDefaults {
                workflow: Workflow::quick(),
                auto_advance: 70,
                minimal: false,
                reviewer_overrides: Vec::new(),
            },
            Preset::Full => PresetDefaults {
                workflow: Workflow::full(),
                auto_advance: 0,
                minimal: false,
                reviewer_overrides: vec![
                    (Stage::Requirements, Reviewer::Human),
                    (Stage::Design, Reviewer::Human),
                ],
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::parse(s)
    }
}
