//! Per-item state of a batch run.

use serde::Serialize;
use thiserror::Error;

/// Status of one batch item.
///
/// ```text
/// Pending -> Searching -> Found -> Submitted -> Succeeded
///    |           |                    |
///    |           +-> NotFound         +-> Failed
///    +-> Submitted (magnet input)
///
/// Pending and Searching can also go straight to Failed.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Searching,
    Found,
    NotFound,
    Submitted,
    Succeeded,
    Failed,
}

impl ItemStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemStatus::NotFound | ItemStatus::Succeeded | ItemStatus::Failed
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Succeeded)
    }

    pub fn can_transition_to(&self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (*self, next),
            (Pending, Searching | Submitted | Failed)
                | (Searching, Found | NotFound | Failed)
                | (Found, Submitted)
                | (Submitted, Succeeded | Failed)
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot move batch item from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ItemStatus,
    pub to: ItemStatus,
}

/// One line of input and what became of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub raw_input: String,
    pub status: ItemStatus,
    pub message: String,
    /// Magnet submitted (or selected) for this item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
}

impl BatchItem {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: raw_input.into(),
            status: ItemStatus::Pending,
            message: String::new(),
            magnet_uri: None,
        }
    }

    pub fn transition(
        &mut self,
        next: ItemStatus,
        message: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.message = message.into();
        Ok(())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_path_transitions() {
        let mut item = BatchItem::new("ABP-123");
        item.transition(ItemStatus::Searching, "searching").unwrap();
        item.transition(ItemStatus::Found, "ABP-123 FHD").unwrap();
        item.transition(ItemStatus::Submitted, "").unwrap();
        item.transition(ItemStatus::Succeeded, "queued").unwrap();
        assert!(item.is_success());
        assert!(item.status.is_terminal());
    }

    #[test]
    fn test_magnet_path_skips_search() {
        let mut item = BatchItem::new("magnet:?xt=urn:btih:abc");
        item.transition(ItemStatus::Submitted, "").unwrap();
        item.transition(ItemStatus::Failed, "rejected").unwrap();
        assert!(!item.is_success());
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut item = BatchItem::new("ABP-123");
        assert_eq!(
            item.transition(ItemStatus::Succeeded, ""),
            Err(InvalidTransition {
                from: ItemStatus::Pending,
                to: ItemStatus::Succeeded
            })
        );

        item.transition(ItemStatus::Searching, "").unwrap();
        item.transition(ItemStatus::NotFound, "nothing").unwrap();
        assert!(item.transition(ItemStatus::Submitted, "").is_err());
        assert_eq!(item.status, ItemStatus::NotFound);
        assert_eq!(item.message, "nothing");
    }

    #[test]
    fn test_terminal_states() {
        assert!(ItemStatus::NotFound.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
        assert!(!ItemStatus::Found.is_terminal());
        assert!(!ItemStatus::Submitted.is_terminal());
    }
}
