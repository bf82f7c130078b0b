pub mod clusters;
pub mod distinct;
pub mod stats;

use crate::model::StreamStatus;
use console::style;

/// Tell the user on stderr that the numbers are incomplete.
pub(crate) fn warn_if_partial(status: &StreamStatus) {
    match status {
        StreamStatus::Cancelled => eprintln!(
            "{}",
            style("Partial results: run was cancelled before all files were blamed").yellow()
        ),
        StreamStatus::Failed { error } => eprintln!(
            "{} {}",
            style("Partial results: extraction stopped early:").yellow(),
            error
        ),
        StreamStatus::Running | StreamStatus::Complete => {}
    }
}
