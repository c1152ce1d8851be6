//! Transaction lifecycle: report, categorize, edit and delete.
//!
//! Every operation reconciles the stored record with the chat messages that
//! describe it. The record is the source of truth; message cleanup is best effort
//! and only logged when it fails.

use crate::{
    config::categories::CategorySet,
    core::{
        chat::{ButtonAction, ChatTransport, DeleteTimer, Keyboard, category_keyboard},
        transaction::{self, parse_amount},
    },
    entities::transaction::Model,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the deletion acknowledgement stays in the chat.
pub const ACK_LIFETIME: Duration = Duration::from_secs(5);

const PROMPT_TEXT: &str = "Select a category:";
const CHANGE_HINT: &str = "Tap a different category to change:";

/// An inbound chat event from the ledger channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    /// A new message was posted
    NewMessage {
        /// Message text
        text: String,
        /// Display name of the sender
        author: String,
        /// Id of the posted message, reused as the transaction id
        message_id: String,
    },
    /// A previously posted message was edited
    EditedMessage {
        /// New text
        text: String,
        /// Id of the edited message
        message_id: String,
    },
    /// A button was pressed
    ButtonPress {
        /// Button payload
        payload: String,
        /// Message carrying the button
        origin_message_id: String,
    },
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// There was no live record; only the stale prompt was cleaned up
    AlreadyGone,
    /// The record was removed
    Deleted {
        /// The removed record
        record: Model,
        /// Pending removal of the acknowledgement, if one was posted
        ack: Option<DeleteTimer>,
    },
}

/// Lifecycle operations over the store and a chat transport.
pub struct Ledger<'a, C: ChatTransport> {
    db: &'a DatabaseConnection,
    chat: &'a C,
    categories: &'a CategorySet,
}

impl<'a, C: ChatTransport> Ledger<'a, C> {
    /// Binds the lifecycle to a store, a transport and the configured categories.
    pub const fn new(db: &'a DatabaseConnection, chat: &'a C, categories: &'a CategorySet) -> Self {
        Self {
            db,
            chat,
            categories,
        }
    }

    fn keyboard(&self, transaction_id: &str) -> Keyboard {
        category_keyboard(self.categories, transaction_id)
    }

    /// Records a reported amount and posts the category prompt.
    pub async fn report_amount(
        &self,
        raw_text: &str,
        author: &str,
        message_id: &str,
    ) -> Result<Model> {
        let amount = parse_amount(raw_text)?;
        let record =
            transaction::create_transaction(self.db, message_id.to_string(), amount, author.to_string())
                .await?;
        info!("New transaction {}: {:.2}$ by {}", record.id, amount, author);

        let keyboard = self.keyboard(&record.id);
        let prompt_id = self.chat.send_text(PROMPT_TEXT, Some(&keyboard)).await?;
        transaction::set_prompt_message(self.db, record, prompt_id).await
    }

    /// Assigns a category and turns the prompt into a confirmation that still
    /// offers every category.
    pub async fn select_category(
        &self,
        transaction_id: &str,
        category: &str,
        origin_message_id: &str,
    ) -> Result<Model> {
        if !self.categories.contains(category) {
            return Err(Error::UnknownCategory {
                name: category.to_string(),
            });
        }
        let record = self.require(transaction_id).await?;

        if let Some(confirmation_id) = &record.confirmation_message_id {
            if let Err(e) = self.chat.delete_message(confirmation_id).await {
                warn!("Could not remove confirmation {confirmation_id}: {e}");
            }
        }

        let record = transaction::set_category(self.db, record, category.to_string()).await?;
        info!("Transaction {} categorized as {}", record.id, category);

        let text = format!(
            "✅ Added {:.2}$ to {category} category.\n\n{CHANGE_HINT}",
            record.amount.abs()
        );
        self.chat
            .edit_text(origin_message_id, &text, Some(&self.keyboard(&record.id)))
            .await?;
        Ok(record)
    }

    /// Replaces the amount of an existing record. `Ok(None)` when no live record
    /// matches the edited message.
    pub async fn edit_amount(&self, transaction_id: &str, raw_text: &str) -> Result<Option<Model>> {
        let amount = parse_amount(raw_text)?;
        let Some(record) = transaction::get_transaction_by_id(self.db, transaction_id).await? else {
            return Ok(None);
        };

        let record = transaction::set_amount(self.db, record, amount).await?;
        info!("Transaction {} amount changed to {:.2}$", record.id, amount);

        if let Some(prompt_id) = &record.category_prompt_message_id {
            let text = match &record.category {
                Some(category) => format!(
                    "✅ Updated to {:.2}$ in {category} category.\n\n{CHANGE_HINT}",
                    amount.abs()
                ),
                None => PROMPT_TEXT.to_string(),
            };
            self.chat
                .edit_text(prompt_id, &text, Some(&self.keyboard(&record.id)))
                .await?;
        }
        Ok(Some(record))
    }

    /// Removes a record and its messages, then posts a short-lived acknowledgement.
    pub async fn delete_transaction(
        &self,
        transaction_id: &str,
        origin_message_id: &str,
    ) -> Result<DeleteOutcome> {
        let Some(record) = transaction::get_transaction_by_id(self.db, transaction_id).await? else {
            self.remove_quietly(origin_message_id).await;
            return Ok(DeleteOutcome::AlreadyGone);
        };

        transaction::delete_transaction(self.db, &record.id).await?;
        info!("Deleted transaction {} ({:.2}$)", record.id, record.amount.abs());

        let prompt_id = record
            .category_prompt_message_id
            .as_deref()
            .unwrap_or(origin_message_id);
        self.remove_quietly(prompt_id).await;
        if let Some(confirmation_id) = &record.confirmation_message_id {
            self.remove_quietly(confirmation_id).await;
        }

        let text = format!("🗑️ Deleted transaction: {:.2}$", record.amount.abs());
        let ack = match self.chat.send_text(&text, None).await {
            Ok(ack_id) => Some(self.chat.schedule_delete(ack_id, ACK_LIFETIME)),
            Err(e) => {
                warn!("Could not acknowledge deletion of {}: {e}", record.id);
                None
            }
        };

        Ok(DeleteOutcome::Deleted { record, ack })
    }

    /// Routes one inbound event. Chat noise and stale buttons are not errors.
    pub async fn handle_event(&self, event: LedgerEvent) -> Result<()> {
        let result = match event {
            LedgerEvent::NewMessage {
                text,
                author,
                message_id,
            } => self.report_amount(&text, &author, &message_id).await.map(drop),
            LedgerEvent::EditedMessage { text, message_id } => {
                self.edit_amount(&message_id, &text).await.map(drop)
            }
            LedgerEvent::ButtonPress {
                payload,
                origin_message_id,
            } => match ButtonAction::parse(&payload) {
                Some(ButtonAction::SelectCategory {
                    category,
                    transaction_id,
                }) => self
                    .select_category(&transaction_id, &category, &origin_message_id)
                    .await
                    .map(drop),
                Some(ButtonAction::Delete { transaction_id }) => self
                    .delete_transaction(&transaction_id, &origin_message_id)
                    .await
                    .map(drop),
                None => {
                    debug!("Ignoring unknown button payload {payload:?}");
                    Ok(())
                }
            },
        };

        match result {
            Err(Error::InvalidAmount { input }) => {
                debug!("Ignoring non-amount message {input:?}");
                Ok(())
            }
            Err(Error::TransactionNotFound { id }) => {
                warn!("Button pressed for missing transaction {id}");
                Ok(())
            }
            other => other,
        }
    }

    async fn require(&self, transaction_id: &str) -> Result<Model> {
        transaction::get_transaction_by_id(self.db, transaction_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound {
                id: transaction_id.to_string(),
            })
    }

    async fn remove_quietly(&self, message_id: &str) {
        if let Err(e) = self.chat.delete_message(message_id).await {
            warn!("Could not remove message {message_id}: {e}");
        }
    }
}
