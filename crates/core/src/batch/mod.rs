//! Batch acquisition: one magnet or catalog code per input line.

mod coordinator;
mod item;
mod report;
mod submitter;

pub use coordinator::{BatchCoordinator, ProgressCallback};
pub use item::{BatchItem, InvalidTransition, ItemStatus};
pub use report::{BatchProgress, BatchReport, BatchSummary, ItemOutcome, RefreshOutcome};
pub use submitter::Submitter;
