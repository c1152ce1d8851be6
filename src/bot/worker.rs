//! Ledger event worker.
//!
//! Gateway callbacks only enqueue [`LedgerEvent`]s. A single task drains the queue in
//! arrival order and handles each event to completion while holding the ledger gate,
//! so a monthly close or reset can never interleave with a half-handled event.

use crate::{
    config::categories::CategorySet,
    core::{
        chat::ChatTransport,
        lifecycle::{Ledger, LedgerEvent},
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
};
use tracing::{error, info};

/// Everything the worker needs to apply events.
pub struct LedgerWorker<C> {
    /// Store
    pub database: DatabaseConnection,
    /// Outbound transport
    pub chat: Arc<C>,
    /// Configured categories
    pub categories: CategorySet,
    /// Gate shared with the monthly close and reset
    pub gate: Arc<Mutex<()>>,
}

impl<C: ChatTransport + 'static> LedgerWorker<C> {
    /// Spawns the worker on the current runtime.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<LedgerEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    /// Processes events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<LedgerEvent>) {
        info!("Ledger worker started");
        let ledger = Ledger::new(&self.database, self.chat.as_ref(), &self.categories);

        while let Some(event) = events.recv().await {
            let _guard = self.gate.lock().await;
            if let Err(e) = ledger.handle_event(event).await {
                error!("Failed to handle ledger event: {e}");
                if let Err(e) = self.chat.send_text(&e.user_notice(), None).await {
                    error!("Could not post failure notice: {e}");
                }
            }
        }

        info!("Ledger worker stopped");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::transaction::{get_all_transactions, get_transaction_by_id},
        errors::Result,
        test_utils::*,
    };

    fn worker(db: &DatabaseConnection, chat: &Arc<RecordingChat>) -> LedgerWorker<RecordingChat> {
        LedgerWorker {
            database: db.clone(),
            chat: Arc::clone(chat),
            categories: test_categories(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    #[tokio::test]
    async fn test_events_applied_in_arrival_order() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = Arc::new(RecordingChat::new());
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(LedgerEvent::NewMessage {
            text: "12".into(),
            author: "alice".into(),
            message_id: "1".into(),
        })
        .unwrap();
        tx.send(LedgerEvent::EditedMessage {
            text: "15".into(),
            message_id: "1".into(),
        })
        .unwrap();
        tx.send(LedgerEvent::ButtonPress {
            payload: "category_Other_1".into(),
            origin_message_id: "msg-1".into(),
        })
        .unwrap();
        drop(tx);

        worker(&db, &chat).run(rx).await;

        let record = get_transaction_by_id(&db, "1").await?.unwrap();
        assert_eq!(record.amount, 15.0);
        assert_eq!(record.category.as_deref(), Some("Other"));
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_post_notice_and_keep_running() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = Arc::new(RecordingChat::new());
        let (tx, rx) = mpsc::unbounded_channel();

        for (text, id) in [("5", "1"), ("6", "1"), ("7", "2")] {
            tx.send(LedgerEvent::NewMessage {
                text: text.into(),
                author: "bob".into(),
                message_id: id.into(),
            })
            .unwrap();
        }
        drop(tx);

        worker(&db, &chat).run(rx).await;

        assert_eq!(get_all_transactions(&db).await?.len(), 2);
        let notices: Vec<_> = chat
            .log()
            .sent
            .into_iter()
            .filter(|m| m.text.contains("Something went wrong"))
            .collect();
        assert_eq!(notices.len(), 1);
        Ok(())
    }
}
