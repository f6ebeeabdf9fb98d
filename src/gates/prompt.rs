use anyhow::Result;
use dialoguer::{Input, Select, theme::ColorfulTheme};

use crate::workflow::Stage;

/// Outcome of an interactive gate review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
    /// Leave the gate in pending-review.
    Defer,
}

/// Ask the reviewer what to do with a gate waiting in pending-review.
pub fn prompt_review(stage: Stage) -> Result<ReviewDecision> {
    let options = &[
        "Approve and advance",
        "Reject and send back to open",
        "Decide later",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("Review the {} gate", stage))
        .items(options)
        .default(0)
        .interact()?;

    match selection {
        0 => Ok(ReviewDecision::Approve),
        1 => {
            let reason: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("Reason for rejection")
                .allow_empty(true)
                .interact_text()?;
            Ok(ReviewDecision::Reject { reason })
        }
        2 => Ok(ReviewDecision::Defer),
        _ => unreachable!(),
    }
}
