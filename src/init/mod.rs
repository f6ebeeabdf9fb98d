//! Project initialization.
//!
//! Creates the `.foreman/` directory for `foreman init` and `foreman quick`:
//!
//! ```text
//! .foreman/
//! ├── foreman.toml     # Project configuration
//! ├── state.yaml       # Workflow state
//! ├── requirements.md  # Written by quick; by hand otherwise
//! ├── designs/         # Only when the workflow has a design stage
//! ├── phases/          # Only when the workflow has a phases stage
//! └── briefs/          # Generated briefs
//! ```

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::foreman_config::{CONFIG_FILE, ForemanToml, TestingSection, TestingStyle};
use crate::state::{ProjectState, StateManager};
use crate::workflow::{Preset, Stage, Workflow};

/// The name of the foreman project directory.
pub const FOREMAN_DIR: &str = ".foreman";

/// Default auto-advance threshold for `foreman quick`.
pub const QUICK_AUTO_ADVANCE: u8 = 70;

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Project name, defaults to the directory name
    pub name: Option<String>,
    pub preset: Option<Preset>,
    /// Explicit stage list; wins over the preset's workflow
    pub workflow: Option<Workflow>,
    pub tdd: bool,
    /// Threshold override for the initial state
    pub auto_advance: Option<u8>,
}

/// Result of initializing a foreman project.
#[derive(Debug)]
pub struct InitResult {
    pub foreman_dir: PathBuf,
    pub name: String,
    pub workflow: Workflow,
    /// Paths created, relative to the project directory
    pub created: Vec<String>,
}

/// Check if a project is already initialized.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(FOREMAN_DIR).exists()
}

pub fn get_foreman_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(FOREMAN_DIR)
}

fn project_name(project_dir: &Path, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => project_dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "project".to_string()),
    }
}

fn ensure_not_initialized(project_dir: &Path) -> Result<PathBuf> {
    if is_initialized(project_dir) {
        bail!(
            "{}/ already exists in {}. Use 'foreman status' to check the existing project",
            FOREMAN_DIR,
            project_dir.display()
        );
    }
    Ok(get_foreman_dir(project_dir))
}

fn create_dir(foreman_dir: &Path, name: &str, created: &mut Vec<String>) -> Result<()> {
    let dir = foreman_dir.join(name);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    created.push(format!("{}/{}/", FOREMAN_DIR, name));
    Ok(())
}

fn write_project(
    foreman_dir: &Path,
    config: &ForemanToml,
    state: &ProjectState,
    created: &mut Vec<String>,
) -> Result<()> {
    config.save(&foreman_dir.join(CONFIG_FILE))?;
    created.push(format!("{}/{}", FOREMAN_DIR, CONFIG_FILE));

    StateManager::new(foreman_dir.join("state.yaml")).save(state)?;
    created.push(format!("{}/state.yaml", FOREMAN_DIR));
    Ok(())
}

fn initial_state(opts: &InitOptions, workflow: &Workflow) -> ProjectState {
    let minimal = opts.preset == Some(Preset::Minimal);
    let default_threshold = opts.preset.map(|p| p.defaults().auto_advance).unwrap_or(0);
    let threshold = opts.auto_advance.unwrap_or(default_threshold);

    if opts.workflow.is_none() && opts.preset.is_none() && threshold == 0 {
        return ProjectState::new_default();
    }
    ProjectState::with_workflow(workflow.clone(), threshold, minimal)
}

/// Initialize a project in `project_dir`. Fails if `.foreman/` already exists.
pub fn init_project(project_dir: &Path, opts: &InitOptions) -> Result<InitResult> {
    let foreman_dir = ensure_not_initialized(project_dir)?;
    let name = project_name(project_dir, opts.name.as_deref());

    let mut config = ForemanToml::for_project(&name, opts.preset);
    if let Some(ref workflow) = opts.workflow {
        config.workflow.stages = Some(workflow.stages().iter().map(|s| s.to_string()).collect());
    }
    if let Some(threshold) = opts.auto_advance {
        config.workflow.auto_advance = u32::from(threshold);
    }
    if opts.tdd {
        config.testing = Some(TestingSection {
            style: TestingStyle::Tdd,
            required: true,
        });
    }
    let workflow = config.workflow()?;
    let state = initial_state(opts, &workflow);

    std::fs::create_dir_all(&foreman_dir)
        .with_context(|| format!("Failed to create directory: {}", foreman_dir.display()))?;

    let mut created = Vec::new();
    write_project(&foreman_dir, &config, &state, &mut created)?;
    if workflow.contains(Stage::Design) {
        create_dir(&foreman_dir, "designs", &mut created)?;
    }
    if workflow.contains(Stage::Phases) {
        create_dir(&foreman_dir, "phases", &mut created)?;
    }
    create_dir(&foreman_dir, "briefs", &mut created)?;

    tracing::debug!(project = %name, workflow = %workflow, "project initialized");
    Ok(InitResult {
        foreman_dir,
        name,
        workflow,
        created,
    })
}

/// Requirements seeded from a one-line task description.
pub fn quick_requirements(name: &str, task: &str) -> String {
    format!(
        "# Task: {name}\n\n\
         ## Goal\n{task}\n\n\
         ## Features\n_To be filled in based on the task above._\n\n\
         ## Tech Stack\n_Specify preferred technologies._\n\n\
         ## Success Criteria\n\
         - Task is complete and working\n\
         - Code is clean and tested\n"
    )
}

/// Initialize a quick-mode project for a single task.
pub fn init_quick(
    project_dir: &Path,
    task: &str,
    name: Option<&str>,
    auto_advance: u8,
) -> Result<InitResult> {
    let foreman_dir = ensure_not_initialized(project_dir)?;
    let name = project_name(project_dir, name);

    let mut config = ForemanToml::for_project(&name, Some(Preset::Light));
    config.project.description = task.to_string();
    config.workflow.auto_advance = u32::from(auto_advance.min(100));
    let state = ProjectState::new_quick_mode(task, auto_advance);

    std::fs::create_dir_all(&foreman_dir)
        .with_context(|| format!("Failed to create directory: {}", foreman_dir.display()))?;

    let mut created = Vec::new();
    write_project(&foreman_dir, &config, &state, &mut created)?;

    let requirements = foreman_dir.join("requirements.md");
    std::fs::write(&requirements, quick_requirements(&name, task)).with_context(|| {
        format!("Failed to create requirements.md: {}", requirements.display())
    })?;
    created.push(format!("{}/requirements.md", FOREMAN_DIR));
    create_dir(&foreman_dir, "briefs", &mut created)?;

    tracing::debug!(project = %name, task, "quick project initialized");
    Ok(InitResult {
        foreman_dir,
        name,
        workflow: Workflow::quick(),
        created,
    })
}
