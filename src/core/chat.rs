//! Chat transport capability used by the ledger.
//!
//! The core never talks to Discord directly. It sends, edits and deletes messages
//! through [`ChatTransport`], and describes buttons with the framework-agnostic
//! [`Keyboard`]. Button payloads are plain strings so any transport can carry them.

use crate::{
    config::categories::{CategorySet, PAYLOAD_DELIMITER},
    errors::Result,
};
use std::{future::Future, time::Duration};
use tokio::task::JoinHandle;

const CATEGORY_PREFIX: &str = "category_";
const DELETE_PREFIX: &str = "delete_";

/// Visual weight of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// Ordinary selection
    Choice,
    /// Destroys data
    Destructive,
}

/// One selectable control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text on the button
    pub label: String,
    /// Payload delivered back on press
    pub payload: String,
    /// Rendering hint
    pub kind: ButtonKind,
}

/// Rows of buttons attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    /// Button rows, top to bottom
    pub rows: Vec<Vec<Button>>,
}

/// Builds the category keyboard for a transaction: two categories per row and a
/// final row holding the delete button.
#[must_use]
pub fn category_keyboard(categories: &CategorySet, transaction_id: &str) -> Keyboard {
    let mut rows: Vec<Vec<Button>> = categories
        .names()
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|name| Button {
                    label: name.clone(),
                    payload: ButtonAction::SelectCategory {
                        category: name.clone(),
                        transaction_id: transaction_id.to_string(),
                    }
                    .payload(),
                    kind: ButtonKind::Choice,
                })
                .collect()
        })
        .collect();

    rows.push(vec![Button {
        label: "🗑️ Delete Transaction".to_string(),
        payload: ButtonAction::Delete {
            transaction_id: transaction_id.to_string(),
        }
        .payload(),
        kind: ButtonKind::Destructive,
    }]);

    Keyboard { rows }
}

/// What a button press asks the ledger to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// `category_<name>_<id>`
    SelectCategory {
        /// Chosen category
        category: String,
        /// Target transaction
        transaction_id: String,
    },
    /// `delete_<id>`
    Delete {
        /// Target transaction
        transaction_id: String,
    },
}

impl ButtonAction {
    /// Decodes a button payload. Returns `None` for payloads this ledger did not emit.
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        if let Some(rest) = payload.strip_prefix(CATEGORY_PREFIX) {
            let (category, transaction_id) = rest.split_once(PAYLOAD_DELIMITER)?;
            if category.is_empty() || transaction_id.is_empty() {
                return None;
            }
            return Some(Self::SelectCategory {
                category: category.to_string(),
                transaction_id: transaction_id.to_string(),
            });
        }

        let transaction_id = payload.strip_prefix(DELETE_PREFIX)?;
        (!transaction_id.is_empty()).then(|| Self::Delete {
            transaction_id: transaction_id.to_string(),
        })
    }

    /// Encodes the action as a button payload
    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            Self::SelectCategory {
                category,
                transaction_id,
            } => format!("{CATEGORY_PREFIX}{category}{PAYLOAD_DELIMITER}{transaction_id}"),
            Self::Delete { transaction_id } => format!("{DELETE_PREFIX}{transaction_id}"),
        }
    }
}

/// Handle to a scheduled message removal. Dropping it leaves the timer running.
#[derive(Debug)]
pub struct DeleteTimer {
    handle: JoinHandle<()>,
}

impl DeleteTimer {
    /// Spawns `task` after `delay` on the current tokio runtime.
    pub fn spawn<F>(delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        Self { handle }
    }

    /// Cancels the removal if it has not happened yet
    pub fn cancel(self) {
        self.handle.abort();
    }

    /// Whether the removal already ran (or was cancelled)
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Outbound chat capability. All message ids are opaque strings.
pub trait ChatTransport: Send + Sync {
    /// Posts a message, optionally with buttons, and returns its id.
    fn send_text(
        &self,
        text: &str,
        controls: Option<&Keyboard>,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Replaces the text (and buttons) of a previously sent message.
    fn edit_text(
        &self,
        message_id: &str,
        text: &str,
        controls: Option<&Keyboard>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Removes a message.
    fn delete_message(&self, message_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Uploads a file with a caption and returns the message id.
    fn send_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        caption: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Removes a message after `delay` without blocking the caller.
    fn schedule_delete(&self, message_id: String, delay: Duration) -> DeleteTimer;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn categories() -> CategorySet {
        CategorySet::new(vec![
            "Groceries".into(),
            "Household".into(),
            "Other".into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_parse_category_payload() {
        let action = ButtonAction::parse("category_Groceries_1234").unwrap();
        assert_eq!(
            action,
            ButtonAction::SelectCategory {
                category: "Groceries".into(),
                transaction_id: "1234".into(),
            }
        );
    }

    #[test]
    fn test_parse_category_with_spaces_and_emoji() {
        let action = ButtonAction::parse("category_Dining Out 🍽️_99").unwrap();
        assert!(matches!(
            action,
            ButtonAction::SelectCategory { ref category, ref transaction_id }
                if category == "Dining Out 🍽️" && transaction_id == "99"
        ));
    }

    #[test]
    fn test_parse_delete_payload() {
        assert_eq!(
            ButtonAction::parse("delete_77"),
            Some(ButtonAction::Delete {
                transaction_id: "77".into()
            })
        );
    }

    #[test]
    fn test_parse_rejects_foreign_payloads() {
        assert_eq!(ButtonAction::parse("category_Groceries"), None);
        assert_eq!(ButtonAction::parse("category__5"), None);
        assert_eq!(ButtonAction::parse("delete_"), None);
        assert_eq!(ButtonAction::parse("vote_yes"), None);
    }

    #[test]
    fn test_keyboard_layout() {
        let keyboard = category_keyboard(&categories(), "55");

        assert_eq!(keyboard.rows.len(), 3);
        assert_eq!(keyboard.rows[0].len(), 2);
        assert_eq!(keyboard.rows[1].len(), 1);
        assert_eq!(keyboard.rows[0][1].payload, "category_Household_55");

        let delete_row = keyboard.rows.last().unwrap();
        assert_eq!(delete_row[0].payload, "delete_55");
        assert_eq!(delete_row[0].kind, ButtonKind::Destructive);
    }

    #[test]
    fn test_every_keyboard_payload_parses_back() {
        let keyboard = category_keyboard(&categories(), "55");
        for button in keyboard.rows.iter().flatten() {
            let action = ButtonAction::parse(&button.payload).unwrap();
            assert_eq!(action.payload(), button.payload);
        }
    }

    #[tokio::test]
    async fn test_delete_timer_can_be_cancelled() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let timer = DeleteTimer::spawn(Duration::from_secs(60), async move {
            let _ = tx.send(());
        });
        assert!(!timer.is_finished());
        timer.cancel();
        // The aborted task drops its sender without ever sending.
        assert!(rx.await.is_err());
    }
}
