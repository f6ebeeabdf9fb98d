use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;

use super::ProjectState;

/// Loads and saves `.foreman/state.yaml`.
pub struct StateManager {
    state_file: PathBuf,
}

impl StateManager {
    pub fn new(state_file: PathBuf) -> Self {
        Self { state_file }
    }

    pub fn exists(&self) -> bool {
        self.state_file.exists()
    }

    /// Read and normalize the state file.
    pub fn load(&self) -> Result<ProjectState> {
        if !self.exists() {
            bail!(
                "State file not found: {}. Run 'foreman init' to create it",
                self.state_file.display()
            );
        }
        let content = fs::read_to_string(&self.state_file).with_context(|| {
            format!("Failed to read state file: {}", self.state_file.display())
        })?;

        let mut state: ProjectState = serde_yaml::from_str(&content).with_context(|| {
            format!("Failed to parse state file: {}", self.state_file.display())
        })?;

        let repaired = state
            .normalize()
            .with_context(|| format!("Corrupt state file: {}", self.state_file.display()))?;
        if !repaired.is_empty() {
            tracing::warn!(stages = ?repaired, "repaired missing or blocked gates in state file");
        }

        tracing::debug!(path = %self.state_file.display(), stage = %state.current_stage(), "state loaded");
        Ok(state)
    }

    pub fn save(&self, state: &ProjectState) -> Result<()> {
        let content = serde_yaml::to_string(state).context("Failed to serialize state")?;

        if let Some(parent) = self.state_file.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        fs::write(&self.state_file, content).with_context(|| {
            format!("Failed to write state file: {}", self.state_file.display())
        })?;

        tracing::debug!(path = %self.state_file.display(), "state saved");
        Ok(())
    }
}
