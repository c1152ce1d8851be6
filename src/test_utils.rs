//! Shared test utilities for `ExpenseBuddy`.
//!
//! This module provides an in-memory database, fixed fixtures for records and
//! archives, and [`RecordingChat`], a transport that remembers every outbound request.

#![allow(clippy::unwrap_used)]

use crate::{
    config::categories::CategorySet,
    core::{
        archive::{MonthId, MonthlyArchive},
        chat::{ChatTransport, DeleteTimer, Keyboard},
    },
    entities::transaction,
    errors::{Error, Result},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::{
    collections::{BTreeMap, HashSet},
    sync::Mutex,
    time::Duration,
};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// 2025-03-14 12:00:00 UTC
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
}

/// The category list shipped in config.toml
pub fn test_categories() -> CategorySet {
    CategorySet::new(
        ["Groceries", "Household", "Entertainment", "LCBO", "Dining Out", "Other"]
            .map(String::from)
            .to_vec(),
    )
    .unwrap()
}

/// Builds an unsaved transaction created at [`fixed_time`].
pub fn transaction_model(
    id: &str,
    amount: f64,
    author: &str,
    category: Option<&str>,
) -> transaction::Model {
    transaction::Model {
        id: id.to_string(),
        amount,
        author: author.to_string(),
        category: category.map(String::from),
        category_prompt_message_id: None,
        confirmation_message_id: None,
        created_at: fixed_time(),
    }
}

/// Records a confirmation message on a stored transaction. The ledger itself never
/// posts one, but records written by older clients may carry it.
pub async fn set_confirmation_message(
    db: &DatabaseConnection,
    transaction: transaction::Model,
    message_id: &str,
) -> Result<transaction::Model> {
    let mut active_model: transaction::ActiveModel = transaction.into();
    active_model.confirmation_message_id = Set(Some(message_id.to_string()));
    active_model.update(db).await.map_err(Into::into)
}

/// An archive with two evenly split participants and no categories.
///
/// # Defaults
/// * `total_transactions`: 2, each worth half of `total_spent`
/// * `user_totals`: alice and bob with a quarter each
/// * `days_with_spending`: 1
pub fn sample_archive(month: MonthId, total_spent: f64) -> MonthlyArchive {
    let half = total_spent / 2.0;
    MonthlyArchive {
        month,
        total_spent,
        total_transactions: 2,
        balance: 0.0,
        user_totals: BTreeMap::from([("alice".into(), half / 2.0), ("bob".into(), half / 2.0)]),
        category_totals: BTreeMap::new(),
        avg_transaction: half,
        highest_transaction: half,
        lowest_transaction: half,
        days_with_spending: 1,
        transactions: Vec::new(),
        archived_at: fixed_time(),
    }
}

/// Outbound operations [`RecordingChat`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatOp {
    /// `send_text`
    Send,
    /// `edit_text`
    Edit,
    /// `delete_message`
    Delete,
    /// `send_file`
    File,
}

/// A posted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Assigned id
    pub id: String,
    /// Text
    pub text: String,
    /// Attached buttons
    pub controls: Option<Keyboard>,
}

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFile {
    /// Assigned id
    pub id: String,
    /// Upload name
    pub filename: String,
    /// Caption
    pub caption: String,
    /// Contents
    pub bytes: Vec<u8>,
}

/// Everything a [`RecordingChat`] has been asked to do.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    /// Successful `send_text` calls
    pub sent: Vec<SentMessage>,
    /// Successful `edit_text` calls, `id` being the edited message
    pub edits: Vec<SentMessage>,
    /// Successfully deleted message ids
    pub deleted: Vec<String>,
    /// Every message id a delete was attempted for
    pub delete_attempts: Vec<String>,
    /// Successful uploads
    pub files: Vec<SentFile>,
    /// `schedule_delete` requests
    pub scheduled: Vec<(String, Duration)>,
}

/// In-memory [`ChatTransport`] for tests.
#[derive(Debug, Default)]
pub struct RecordingChat {
    log: Mutex<ChatLog>,
    failing: Mutex<HashSet<ChatOp>>,
    next_id: Mutex<u64>,
}

impl RecordingChat {
    /// Creates a transport where every operation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of `op` fail with a transport error.
    pub fn fail_on(&self, op: ChatOp) {
        self.failing.lock().unwrap().insert(op);
    }

    /// Snapshot of everything recorded so far.
    pub fn log(&self) -> ChatLog {
        self.log.lock().unwrap().clone()
    }

    fn check(&self, op: ChatOp) -> Result<()> {
        if self.failing.lock().unwrap().contains(&op) {
            return Err(Error::Transport {
                message: format!("{op:?} refused by test transport"),
            });
        }
        Ok(())
    }

    fn allocate_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("msg-{next}")
    }
}

impl ChatTransport for RecordingChat {
    async fn send_text(&self, text: &str, controls: Option<&Keyboard>) -> Result<String> {
        self.check(ChatOp::Send)?;
        let id = self.allocate_id();
        self.log.lock().unwrap().sent.push(SentMessage {
            id: id.clone(),
            text: text.to_string(),
            controls: controls.cloned(),
        });
        Ok(id)
    }

    async fn edit_text(
        &self,
        message_id: &str,
        text: &str,
        controls: Option<&Keyboard>,
    ) -> Result<()> {
        self.check(ChatOp::Edit)?;
        self.log.lock().unwrap().edits.push(SentMessage {
            id: message_id.to_string(),
            text: text.to_string(),
            controls: controls.cloned(),
        });
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.log
            .lock()
            .unwrap()
            .delete_attempts
            .push(message_id.to_string());
        self.check(ChatOp::Delete)?;
        self.log.lock().unwrap().deleted.push(message_id.to_string());
        Ok(())
    }

    async fn send_file(&self, bytes: Vec<u8>, filename: &str, caption: &str) -> Result<String> {
        self.check(ChatOp::File)?;
        let id = self.allocate_id();
        self.log.lock().unwrap().files.push(SentFile {
            id: id.clone(),
            filename: filename.to_string(),
            caption: caption.to_string(),
            bytes,
        });
        Ok(id)
    }

    fn schedule_delete(&self, message_id: String, delay: Duration) -> DeleteTimer {
        self.log
            .lock()
            .unwrap()
            .scheduled
            .push((message_id, delay));
        DeleteTimer::spawn(delay, async {})
    }
}
