//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module    | Commands handled                |
//! |-----------|---------------------------------|
//! | `project` | `Init`, `Quick`                 |
//! | `phase`   | `Status`, `Phase`, `Phases`     |
//! | `gate`    | `Gate`                          |
//! | `brief`   | `Brief`                         |
//! | `config`  | `Config`                        |
//! | `watch`   | `Watch`                         |

pub mod brief;
pub mod config;
pub mod gate;
pub mod phase;
pub mod project;
pub mod watch;

pub use brief::cmd_brief;
pub use config::cmd_config;
pub use gate::{GateAction, cmd_gate};
pub use phase::{cmd_phase, cmd_phases, cmd_status};
pub use project::{cmd_init, cmd_quick};
pub use watch::cmd_watch;

use anyhow::Result;
use std::path::Path;

use foreman::config::Config;
use foreman::state::ProjectState;

use super::Cli;

/// Locate the project from `project_dir` and load its state.
pub(crate) fn open_project(project_dir: &Path, cli: &Cli) -> Result<(Config, ProjectState)> {
    let config = Config::discover(project_dir, cli.verbose)?;
    let state = config.state_manager().load()?;
    Ok((config, state))
}
