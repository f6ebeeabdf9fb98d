//! Project configuration read from `.foreman/foreman.toml`.
//!
//! Settings are layered file → environment → CLI:
//! - `FOREMAN_REVIEWER` replaces the default reviewer
//! - `FOREMAN_AUTO_ADVANCE` replaces the auto-advance threshold
//!
//! # Configuration File Format
//!
//! ```toml
//! [project]
//! name = "my-project"
//! description = "A CLI for weather data"
//! tech_stack = ["rust"]
//! created = "2026-01-01T00:00:00Z"
//!
//! [workflow]
//! preset = "full"
//! stages = ["requirements", "design", "implementation"]
//! auto_advance = 0
//!
//! [reviewers]
//! default = "auto"
//!
//! [reviewers.overrides]
//! requirements = "human"
//!
//! [testing]
//! style = "tdd"
//! required = true
//! ```

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::WorkflowError;
use crate::gates::Reviewer;
use crate::workflow::{Preset, Stage, Workflow};

pub const CONFIG_FILE: &str = "foreman.toml";

pub const ENV_REVIEWER: &str = "FOREMAN_REVIEWER";
pub const ENV_AUTO_ADVANCE: &str = "FOREMAN_AUTO_ADVANCE";

/// How the project expects tests to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingStyle {
    /// Tests are written before the code they cover
    Tdd,
    /// Tests are written alongside code, tracked by coverage
    Coverage,
    #[default]
    None,
}

impl std::fmt::Display for TestingStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestingStyle::Tdd => write!(f, "tdd"),
            TestingStyle::Coverage => write!(f, "coverage"),
            TestingStyle::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for TestingStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tdd" => Ok(TestingStyle::Tdd),
            "coverage" => Ok(TestingStyle::Coverage),
            "none" => Ok(TestingStyle::None),
            _ => bail!(
                "Invalid testing style '{}'. Valid values: tdd, coverage, none",
                s
            ),
        }
    }
}

/// Project metadata used in briefs and status output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// Workflow shape and auto-advance threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSection {
    /// Named preset (minimal, light, full, or the nightly/product aliases)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Custom stage list; takes precedence over the preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<String>>,
    /// Confidence threshold for auto-advance (0 disables)
    #[serde(default)]
    pub auto_advance: u32,
}

/// Who approves each stage's gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewersSection {
    #[serde(default)]
    pub default: Reviewer,
    /// Stage name → reviewer
    #[serde(default)]
    pub overrides: BTreeMap<String, Reviewer>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestingSection {
    #[serde(default)]
    pub style: TestingStyle,
    #[serde(default)]
    pub required: bool,
}

/// Parsed contents of foreman.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForemanToml {
    #[serde(default)]
    pub project: ProjectSection,
    #[serde(default)]
    pub workflow: WorkflowSection,
    #[serde(default)]
    pub reviewers: ReviewersSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<TestingSection>,
}

impl ForemanToml {
    /// Fresh configuration for a new project, seeded from an optional preset.
    pub fn for_project(name: &str, preset: Option<Preset>) -> Self {
        let mut config = Self {
            project: ProjectSection {
                name: name.to_string(),
                created: Some(Utc::now()),
                ..Default::default()
            },
            ..Default::default()
        };

        if let Some(preset) = preset {
            let defaults = preset.defaults();
            config.workflow.preset = Some(preset.to_string());
            config.workflow.auto_advance = u32::from(defaults.auto_advance);
            for (stage, reviewer) in defaults.reviewer_overrides {
                config.set_reviewer(stage, reviewer);
            }
        }
        config
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse foreman.toml")
    }

    /// Load `.foreman/foreman.toml`, or defaults when it doesn't exist.
    pub fn load_or_default(foreman_dir: &Path) -> Result<Self> {
        let config_path = foreman_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize foreman.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// The configured preset, with aliases resolved.
    pub fn preset(&self) -> Result<Option<Preset>, WorkflowError> {
        self.workflow.preset.as_deref().map(Preset::parse).transpose()
    }

    /// Effective workflow: custom stages, then preset, then the full workflow.
    pub fn workflow(&self) -> Result<Workflow, WorkflowError> {
        if let Some(stages) = &self.workflow.stages {
            return Workflow::parse(stages);
        }
        Ok(match self.preset()? {
            Some(preset) => preset.defaults().workflow,
            None => Workflow::full(),
        })
    }

    pub fn is_tdd_enabled(&self) -> bool {
        self.testing
            .as_ref()
            .is_some_and(|t| t.style == TestingStyle::Tdd)
    }

    pub fn reviewer_for(&self, stage: Stage) -> Reviewer {
        self.reviewers
            .overrides
            .get(stage.as_str())
            .copied()
            .unwrap_or(self.reviewers.default)
    }

    /// Route a stage to a reviewer.
    ///
    /// The override is always written, even when it matches the file default,
    /// so it still wins over a default taken from the environment.
    pub fn set_reviewer(&mut self, stage: Stage, reviewer: Reviewer) {
        self.reviewers
            .overrides
            .insert(stage.as_str().to_string(), reviewer);
    }

    /// Set a value by dotted key, as used by `foreman config set`.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "project.name" => self.project.name = value.to_string(),
            "project.description" => self.project.description = value.to_string(),
            "project.tech_stack" => {
                self.project.tech_stack = split_list(value);
            }
            "workflow.preset" => {
                let preset = Preset::parse(value)?;
                self.workflow.preset = Some(preset.to_string());
            }
            "workflow.stages" => {
                let stages = split_list(value);
                Workflow::parse(&stages)?;
                self.workflow.stages = Some(stages);
            }
            "workflow.auto_advance" => {
                let threshold: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid auto_advance '{}': expected 0-100", value))?;
                if threshold > 100 {
                    bail!("Invalid auto_advance '{}': expected 0-100", value);
                }
                self.workflow.auto_advance = threshold;
            }
            "reviewers.default" => self.reviewers.default = value.parse()?,
            "testing.style" => {
                self.testing.get_or_insert_with(Default::default).style = value.parse()?;
            }
            "testing.required" => {
                let required: bool = value
                    .parse()
                    .with_context(|| format!("Invalid testing.required '{}': expected true or false", value))?;
                self.testing.get_or_insert_with(Default::default).required = required;
            }
            _ => {
                if let Some(stage) = key.strip_prefix("reviewers.") {
                    let stage: Stage = stage.parse()?;
                    self.set_reviewer(stage, value.parse()?);
                } else {
                    bail!(
                        "Unknown config key '{}'. Valid keys: project.name, project.description, \
                         project.tech_stack, workflow.preset, workflow.stages, workflow.auto_advance, \
                         reviewers.default, reviewers.<stage>, testing.style, testing.required",
                        key
                    );
                }
            }
        }
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = self.preset() {
            warnings.push(e.to_string());
        }

        let workflow = match self.workflow() {
            Ok(workflow) => Some(workflow),
            Err(e) => {
                if self.workflow.stages.is_some() {
                    warnings.push(e.to_string());
                }
                None
            }
        };

        if self.workflow.auto_advance > 100 {
            warnings.push(format!(
                "Invalid auto_advance {}: should be between 0 and 100",
                self.workflow.auto_advance
            ));
        }

        for name in self.reviewers.overrides.keys() {
            match name.parse::<Stage>() {
                Err(_) => warnings.push(format!("Reviewer override for unknown stage '{}'", name)),
                Ok(stage) => {
                    if let Some(ref workflow) = workflow
                        && !workflow.contains(stage)
                    {
                        warnings.push(format!(
                            "Reviewer override for stage '{}' which is not in the workflow ({})",
                            name, workflow
                        ));
                    }
                }
            }
        }

        warnings
    }
}

/// Threshold from `FOREMAN_AUTO_ADVANCE`, capped at 100. Unparseable values are ignored.
pub fn env_auto_advance() -> Option<u8> {
    let value = std::env::var(ENV_AUTO_ADVANCE).ok()?;
    match value.trim().parse::<u32>() {
        Ok(threshold) => Some(threshold.min(100) as u8),
        Err(_) => {
            tracing::warn!("ignoring {}: '{}' is not a number", ENV_AUTO_ADVANCE, value);
            None
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Configuration with environment and CLI layers applied.
#[derive(Debug, Clone)]
pub struct ForemanConfig {
    pub project_dir: PathBuf,
    pub foreman_dir: PathBuf,
    pub toml: ForemanToml,
    /// CLI override: verbose output
    pub verbose: bool,
    /// CLI override: answer yes to prompts
    pub yes: bool,
}

impl ForemanConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let foreman_dir = project_dir.join(crate::init::FOREMAN_DIR);
        let toml = ForemanToml::load_or_default(&foreman_dir)?;

        Ok(Self {
            project_dir,
            foreman_dir,
            toml,
            verbose: false,
            yes: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool, yes: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        config.yes = yes;
        Ok(config)
    }

    pub fn config_file(&self) -> PathBuf {
        self.foreman_dir.join(CONFIG_FILE)
    }

    pub fn save(&self) -> Result<()> {
        self.toml.save(&self.config_file())
    }

    /// Default reviewer (env → file).
    pub fn default_reviewer(&self) -> Reviewer {
        match std::env::var(ENV_REVIEWER) {
            Ok(value) => match value.parse() {
                Ok(reviewer) => reviewer,
                Err(e) => {
                    tracing::warn!("ignoring {}: {}", ENV_REVIEWER, e);
                    self.toml.reviewers.default
                }
            },
            Err(_) => self.toml.reviewers.default,
        }
    }

    /// Reviewer for a stage: explicit override, then the layered default.
    pub fn reviewer_for(&self, stage: Stage) -> Reviewer {
        self.toml
            .reviewers
            .overrides
            .get(stage.as_str())
            .copied()
            .unwrap_or_else(|| self.default_reviewer())
    }

    /// Auto-advance threshold (env → file), capped at 100.
    pub fn auto_advance(&self) -> u8 {
        env_auto_advance().unwrap_or_else(|| self.toml.workflow.auto_advance.min(100) as u8)
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    // =========================================
    // TestingStyle tests
    // =========================================

    #[test]
    fn test_testing_style_from_str() {
        assert_eq!("tdd".parse::<TestingStyle>().unwrap(), TestingStyle::Tdd);
        assert_eq!(
            "COVERAGE".parse::<TestingStyle>().unwrap(),
            TestingStyle::Coverage
        );
        let err = "bdd".parse::<TestingStyle>().unwrap_err();
        assert!(err.to_string().contains("Invalid testing style"));
    }

    // =========================================
    // Parsing tests
    // =========================================

    #[test]
    fn test_parse_full_file() {
        let config = ForemanToml::parse(
            r#"
[project]
name = "weather"
description = "Fetch forecasts"
tech_stack = ["rust", "tokio"]

[workflow]
preset = "product"
auto_advance = 0

[reviewers]
default = "auto"

[reviewers.overrides]
requirements = "human"

[testing]
style = "tdd"
required = true
"#,
        )
        .unwrap();

        assert_eq!(config.project.name, "weather");
        assert_eq!(config.project.tech_stack, vec!["rust", "tokio"]);
        assert_eq!(config.preset().unwrap(), Some(Preset::Full));
        assert_eq!(config.workflow().unwrap(), Workflow::full());
        assert_eq!(config.reviewer_for(Stage::Requirements), Reviewer::Human);
        assert_eq!(config.reviewer_for(Stage::Design), Reviewer::Auto);
        assert!(config.is_tdd_enabled());
        assert!(!config.preset().unwrap().is_some_and(|p| p.is_quick()));
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = ForemanToml::parse("").unwrap();
        assert_eq!(config.reviewers.default, Reviewer::Auto);
        assert_eq!(config.workflow.auto_advance, 0);
        assert_eq!(config.workflow().unwrap(), Workflow::full());
        assert!(config.testing.is_none());
        assert!(!config.is_tdd_enabled());
    }

    #[test]
    fn test_custom_stages_win_over_preset() {
        let config = ForemanToml::parse(
            r#"
[workflow]
preset = "full"
stages = ["design", "implementation"]
"#,
        )
        .unwrap();
        assert_eq!(
            config.workflow().unwrap().stages(),
            &[Stage::Design, Stage::Implementation]
        );
    }

    #[test]
    fn test_quick_preset_aliases() {
        let config = ForemanToml::parse("[workflow]\npreset = \"nightly\"\n").unwrap();
        assert!(config.preset().unwrap().is_some_and(|p| p.is_quick()));
        assert_eq!(config.workflow().unwrap(), Workflow::quick());
    }

    // =========================================
    // Reviewer tests
    // =========================================

    #[test]
    fn test_set_reviewer_keeps_explicit_override() {
        let mut config = ForemanToml::default();
        config.set_reviewer(Stage::Design, Reviewer::Human);
        assert_eq!(config.reviewer_for(Stage::Design), Reviewer::Human);
        assert!(config.reviewers.overrides.contains_key("design"));

        config.set_reviewer(Stage::Design, Reviewer::Auto);
        assert_eq!(config.reviewer_for(Stage::Design), Reviewer::Auto);
        assert_eq!(
            config.reviewers.overrides.get("design"),
            Some(&Reviewer::Auto)
        );
    }

    #[test]
    fn test_for_project_applies_preset() {
        let config = ForemanToml::for_project("app", Some(Preset::Full));
        assert_eq!(config.project.name, "app");
        assert!(config.project.created.is_some());
        assert_eq!(config.workflow.preset.as_deref(), Some("full"));
        assert_eq!(config.reviewer_for(Stage::Requirements), Reviewer::Human);
        assert_eq!(config.reviewer_for(Stage::Design), Reviewer::Human);

        let light = ForemanToml::for_project("tool", Some(Preset::Light));
        assert_eq!(light.workflow.auto_advance, 70);
        assert!(light.reviewers.overrides.is_empty());
    }

    // =========================================
    // set_value tests
    // =========================================

    #[test]
    fn test_set_value_known_keys() {
        let mut config = ForemanToml::default();
        config.set_value("project.name", "renamed").unwrap();
        config.set_value("workflow.preset", "nightly").unwrap();
        config.set_value("workflow.auto_advance", "85").unwrap();
        config.set_value("reviewers.design", "human").unwrap();
        config.set_value("testing.style", "coverage").unwrap();
        config.set_value("project.tech_stack", "rust, sqlite").unwrap();

        assert_eq!(config.project.name, "renamed");
        assert_eq!(config.workflow.preset.as_deref(), Some("minimal"));
        assert_eq!(config.workflow.auto_advance, 85);
        assert_eq!(config.reviewer_for(Stage::Design), Reviewer::Human);
        assert_eq!(config.testing.as_ref().unwrap().style, TestingStyle::Coverage);
        assert_eq!(config.project.tech_stack, vec!["rust", "sqlite"]);
    }

    #[test]
    fn test_set_value_rejects_bad_input() {
        let mut config = ForemanToml::default();
        assert!(config.set_value("workflow.auto_advance", "150").is_err());
        assert!(config.set_value("workflow.stages", "requirements,design").is_err());
        assert!(config.set_value("reviewers.deploy", "human").is_err());
        assert!(config.set_value("nope", "1").is_err());
        assert!(config.workflow.stages.is_none());
    }

    // =========================================
    // Validation tests
    // =========================================

    #[test]
    fn test_validate_clean_config() {
        let config = ForemanToml::for_project("app", Some(Preset::Full));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let config = ForemanToml::parse(
            r#"
[workflow]
stages = ["requirements", "implementation"]
auto_advance = 120

[reviewers.overrides]
design = "human"
deploy = "human"
"#,
        )
        .unwrap();

        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("auto_advance")));
        assert!(warnings.iter().any(|w| w.contains("'design'")));
        assert!(warnings.iter().any(|w| w.contains("'deploy'")));
    }

    #[test]
    fn test_validate_invalid_custom_workflow() {
        let config = ForemanToml::parse("[workflow]\nstages = [\"requirements\"]\n").unwrap();
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("implementation")));
    }

    // =========================================
    // File and layering tests
    // =========================================

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = ForemanToml::for_project("saved", Some(Preset::Light));
        config.save(&path).unwrap();

        let loaded = ForemanToml::load(&path).unwrap();
        assert_eq!(loaded.project.name, "saved");
        assert_eq!(loaded.workflow.auto_advance, 70);
        assert_eq!(loaded.preset().unwrap(), Some(Preset::Light));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = ForemanToml::load_or_default(dir.path()).unwrap();
        assert!(config.project.name.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let foreman_dir = dir.path().join(crate::init::FOREMAN_DIR);
        std::fs::create_dir_all(&foreman_dir).unwrap();
        ForemanToml::for_project("env", Some(Preset::Light))
            .save(&foreman_dir.join(CONFIG_FILE))
            .unwrap();

        let config = ForemanConfig::new(dir.path().to_path_buf()).unwrap();

        unsafe { std::env::remove_var(ENV_REVIEWER) };
        unsafe { std::env::remove_var(ENV_AUTO_ADVANCE) };
        assert_eq!(config.default_reviewer(), Reviewer::Auto);
        assert_eq!(config.auto_advance(), 70);

        unsafe { std::env::set_var(ENV_REVIEWER, "human") };
        unsafe { std::env::set_var(ENV_AUTO_ADVANCE, "250") };
        assert_eq!(config.reviewer_for(Stage::Requirements), Reviewer::Human);
        assert_eq!(config.auto_advance(), 100);

        unsafe { std::env::remove_var(ENV_REVIEWER) };
        unsafe { std::env::remove_var(ENV_AUTO_ADVANCE) };
    }

    #[test]
    fn test_explicit_override_wins_over_env_default() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let foreman_dir = dir.path().join(crate::init::FOREMAN_DIR);
        std::fs::create_dir_all(&foreman_dir).unwrap();
        ForemanToml::for_project("env", None)
            .save(&foreman_dir.join(CONFIG_FILE))
            .unwrap();

        unsafe { std::env::set_var(ENV_REVIEWER, "human") };

        let mut config = ForemanConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.reviewer_for(Stage::Requirements), Reviewer::Human);

        config.toml.set_reviewer(Stage::Requirements, Reviewer::Auto);
        config.save().unwrap();

        let reloaded = ForemanConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reloaded.reviewer_for(Stage::Requirements), Reviewer::Auto);
        assert_eq!(reloaded.reviewer_for(Stage::Design), Reviewer::Human);

        unsafe { std::env::remove_var(ENV_REVIEWER) };
    }
}
