use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::foreman_config::{CONFIG_FILE, ForemanConfig};
use crate::init::FOREMAN_DIR;
use crate::phase::{self, ReconcileReport};
use crate::state::{ProjectState, StateManager};
use crate::validate::FsValidator;

/// Resolved paths of a foreman project.
///
/// Bridges the project directory layout with the pieces that operate on it:
/// state persistence, configuration, validators and phase discovery.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub foreman_dir: PathBuf,
    pub state_file: PathBuf,
    pub config_file: PathBuf,
    pub requirements_file: PathBuf,
    pub designs_dir: PathBuf,
    pub phases_dir: PathBuf,
    pub briefs_dir: PathBuf,
    pub verbose: bool,
}

impl Config {
    /// Config for a project rooted at `project_dir`.
    pub fn new(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let foreman_dir = project_dir.join(FOREMAN_DIR);

        Ok(Self {
            state_file: foreman_dir.join("state.yaml"),
            config_file: foreman_dir.join(CONFIG_FILE),
            requirements_file: foreman_dir.join("requirements.md"),
            designs_dir: foreman_dir.join("designs"),
            phases_dir: foreman_dir.join("phases"),
            briefs_dir: foreman_dir.join("briefs"),
            project_dir,
            foreman_dir,
            verbose,
        })
    }

    /// Find the project root by walking up from `start` until a `.foreman/` is found.
    pub fn discover(start: &Path, verbose: bool) -> Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", start.display()))?;

        for dir in start.ancestors() {
            if dir.join(FOREMAN_DIR).is_dir() {
                tracing::debug!(root = %dir.display(), "found project root");
                return Self::new(dir.to_path_buf(), verbose);
            }
        }

        bail!(
            "No {} directory found in {} or any parent directory. Run 'foreman init' first",
            FOREMAN_DIR,
            start.display()
        )
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(self.state_file.clone())
    }

    pub fn validator(&self) -> FsValidator {
        FsValidator::new(self.foreman_dir.clone())
    }

    /// foreman.toml with environment and CLI layers applied.
    pub fn settings(&self, yes: bool) -> Result<ForemanConfig> {
        ForemanConfig::with_cli_args(self.project_dir.clone(), self.verbose, yes)
    }

    pub fn phase_plan(&self, name: &str) -> PathBuf {
        self.phases_dir.join(format!("{}.md", name))
    }

    pub fn phase_overview(&self) -> PathBuf {
        self.phases_dir.join(format!("{}.md", phase::OVERVIEW_STEM))
    }

    pub fn brief_file(&self, name: &str) -> PathBuf {
        self.briefs_dir.join(format!("{}.md", name))
    }

    /// Reconcile the tracked phases with the plans under `phases/`.
    pub fn sync_phases(&self, state: &mut ProjectState) -> Result<ReconcileReport> {
        let discovered = phase::discover_phase_definitions(&self.phases_dir)?;
        Ok(state.reconcile_phases(&discovered))
    }
}
