//! Stage readiness checks.
//!
//! A [`StageValidator`] answers "is this stage's work present?" before the
//! gate pipeline runs. [`FsValidator`] looks at the `.foreman/` tree and only
//! checks presence: files exist and are not empty.

use std::fs;
use std::path::{Path, PathBuf};

use crate::phase::{self, PhaseStatus};
use crate::state::ProjectState;
use crate::workflow::Stage;

/// Outcome of a readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub passed: bool,
    pub message: String,
    pub details: Vec<String>,
}

impl ValidationResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details,
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

pub trait StageValidator {
    fn validate(&self, stage: Stage, state: &ProjectState) -> ValidationResult;
}

/// Validates stages against the files under a `.foreman/` directory.
pub struct FsValidator {
    foreman_dir: PathBuf,
}

fn non_empty(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|content| !content.trim().is_empty())
        .unwrap_or(false)
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FsValidator {
    pub fn new(foreman_dir: PathBuf) -> Self {
        Self { foreman_dir }
    }

    fn requirements(&self) -> ValidationResult {
        let path = self.foreman_dir.join("requirements.md");
        if !path.exists() {
            return ValidationResult::fail(
                "Requirements document missing",
                vec![
                    "Create requirements.md in .foreman/".to_string(),
                    "Describe what the project should accomplish".to_string(),
                ],
            );
        }
        if !non_empty(&path) {
            return ValidationResult::fail(
                "Requirements document is empty",
                vec!["Write the project requirements in .foreman/requirements.md".to_string()],
            );
        }
        ValidationResult::pass("Requirements stage is ready")
            .with_details(vec!["requirements.md exists and has content".to_string()])
    }

    fn design(&self) -> ValidationResult {
        let dir = self.foreman_dir.join("designs");
        if !dir.is_dir() {
            return ValidationResult::fail(
                "Designs directory missing",
                vec![
                    "Create designs/ in .foreman/".to_string(),
                    "Add design documents (.md files) describing the architecture".to_string(),
                ],
            );
        }

        let docs: Vec<String> = markdown_files(&dir)
            .iter()
            .filter(|p| non_empty(p))
            .map(|p| file_name(p))
            .collect();
        if docs.is_empty() {
            return ValidationResult::fail(
                "No design documents found",
                vec!["Add at least one non-empty .md file to .foreman/designs/".to_string()],
            );
        }

        ValidationResult::pass("Design stage is ready").with_details(vec![format!(
            "Found {} design documents: {}",
            docs.len(),
            docs.join(", ")
        )])
    }

    fn phases(&self) -> ValidationResult {
        let dir = self.foreman_dir.join("phases");
        if !dir.is_dir() {
            return ValidationResult::fail(
                "Phases directory missing",
                vec![
                    "Create phases/ in .foreman/".to_string(),
                    "Add overview.md and individual phase plans".to_string(),
                ],
            );
        }

        let overview = dir.join(format!("{}.md", phase::OVERVIEW_STEM));
        if !non_empty(&overview) {
            return ValidationResult::fail(
                "Phase overview missing",
                vec!["Create a non-empty phases/overview.md".to_string()],
            );
        }

        let plans: Vec<String> = markdown_files(&dir)
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .filter(|stem| phase::is_phase_plan_name(stem))
            .collect();
        if plans.is_empty() {
            return ValidationResult::fail(
                "No phase plan files found",
                vec![
                    "Create individual phase plans in phases/".to_string(),
                    "Use the naming convention 1-setup.md, 2-backend.md, ...".to_string(),
                ],
            );
        }

        ValidationResult::pass("Phases stage is ready").with_details(vec![
            "overview.md exists with content".to_string(),
            format!("Found {} phase plans: {}", plans.len(), plans.join(", ")),
        ])
    }

    fn implementation(&self, state: &ProjectState) -> ValidationResult {
        let phases = state.phases();
        if phases.is_empty() {
            return ValidationResult::fail(
                "No phases defined yet",
                vec!["Add phase plans to .foreman/phases/ and run 'foreman phases'".to_string()],
            );
        }

        let incomplete: Vec<String> = phases
            .iter()
            .filter(|p| p.status != PhaseStatus::Done)
            .map(|p| format!("{} ({})", p.name, p.status))
            .collect();
        if !incomplete.is_empty() {
            let mut details = vec![
                "Mark every phase done with 'foreman phase <name> done'".to_string(),
                "Incomplete phases:".to_string(),
            ];
            details.extend(incomplete.iter().map(|p| format!("  {}", p)));
            return ValidationResult::fail(
                format!("{} phases not completed", incomplete.len()),
                details,
            );
        }

        ValidationResult::pass("Implementation stage is ready")
            .with_details(vec![format!("All {} phases completed", phases.len())])
    }
}

impl StageValidator for FsValidator {
    fn validate(&self, stage: Stage, state: &ProjectState) -> ValidationResult {
        let result = match stage {
            Stage::Requirements => self.requirements(),
            Stage::Design => self.design(),
            Stage::Phases => self.phases(),
            Stage::Implementation => self.implementation(state),
        };
        tracing::debug!(%stage, passed = result.passed, message = %result.message, "stage validated");
        result
    }
}
