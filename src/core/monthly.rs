//! Monthly close: archive, report, export and reset.
//!
//! Each step runs even when an earlier one failed and reports its own status, so a
//! broken upload never blocks the reset. The only exception is a month that could be
//! neither archived nor rebuilt from live records: its transactions are kept so the
//! close can be retried. Callers must hold the ledger gate for the whole close.

use crate::{
    core::{
        archive::{MonthId, MonthlyArchive, archive_snapshot, build_archive},
        chat::ChatTransport,
        export,
        report::{MESSAGE_LIMIT, format_close_failure, format_close_report, split_message},
        transaction::{delete_all_transactions, get_all_transactions},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

const CLEAR_FAILED_NOTICE: &str =
    "⚠️ Warning: Failed to clear transactions. Manual cleanup may be needed.";

/// How the archive step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// The month was written to the archive store
    Archived,
    /// Nothing to archive
    Empty,
    /// Archiving failed; the report was built from live records
    Failed {
        /// Why archiving failed
        reason: String,
    },
}

/// How the CSV export step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// The file was uploaded
    Sent,
    /// No archive, so nothing to export
    Skipped,
    /// Generation or upload failed and users were told to retry
    Failed {
        /// Why the export failed
        reason: String,
    },
}

/// How the reset step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearStatus {
    /// Live records were deleted
    Cleared {
        /// Number of records removed
        removed: u64,
    },
    /// Deletion failed and users were warned
    Failed {
        /// Why deletion failed
        reason: String,
    },
    /// Nothing could be archived or reported, so the records were left in place
    Kept {
        /// Why the month could not be read
        reason: String,
    },
}

/// Per-step results of a monthly close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCloseOutcome {
    /// The month that was closed
    pub month: MonthId,
    /// Archive step
    pub archive: ArchiveStatus,
    /// Whether the whole report reached the chat
    pub report_delivered: bool,
    /// Export step
    pub export: ExportStatus,
    /// Reset step
    pub clear: ClearStatus,
}

impl MonthlyCloseOutcome {
    /// One line per step, for the operator who triggered a manual close.
    #[must_use]
    pub fn summary(&self) -> String {
        let archive = match &self.archive {
            ArchiveStatus::Archived => "✅ archived".to_string(),
            ArchiveStatus::Empty => "➖ nothing to archive".to_string(),
            ArchiveStatus::Failed { reason } => format!("⚠️ failed ({reason})"),
        };
        let report = if self.report_delivered {
            "✅ posted"
        } else {
            "⚠️ not fully delivered"
        };
        let export = match &self.export {
            ExportStatus::Sent => "✅ uploaded".to_string(),
            ExportStatus::Skipped => "➖ skipped".to_string(),
            ExportStatus::Failed { reason } => format!("⚠️ failed ({reason})"),
        };
        let clear = match &self.clear {
            ClearStatus::Cleared { removed } => format!("✅ {removed} transactions cleared"),
            ClearStatus::Failed { reason } => format!("⚠️ failed ({reason})"),
            ClearStatus::Kept { reason } => format!("⏸️ transactions kept ({reason})"),
        };

        format!(
            "📅 Closed {}\n• Archive: {archive}\n• Report: {report}\n• CSV: {export}\n• Reset: {clear}",
            self.month.label()
        )
    }
}

/// Closes `month`: archives live records, posts the report, uploads the CSV and
/// clears the ledger.
pub async fn perform_monthly_close<C: ChatTransport>(
    db: &DatabaseConnection,
    chat: &C,
    month: MonthId,
    now: DateTime<Utc>,
) -> MonthlyCloseOutcome {
    info!("Starting monthly close for {month}");

    let (archive_status, data) = match archive_snapshot(db, month, now).await {
        Ok(archive) => (ArchiveStatus::Archived, Some(archive)),
        Err(Error::NoTransactions) => {
            info!("No transactions to archive for {month}");
            (ArchiveStatus::Empty, None)
        }
        Err(e) => {
            error!("Archiving {month} failed, reporting from live records: {e}");
            let reason = e.to_string();
            (ArchiveStatus::Failed { reason }, live_fallback(db, month, now).await)
        }
    };
    let archived = archive_status == ArchiveStatus::Archived;
    let unreadable = match (&archive_status, &data) {
        (ArchiveStatus::Failed { reason }, None) => Some(reason.clone()),
        _ => None,
    };

    let report = match &unreadable {
        Some(reason) => format_close_failure(month, reason),
        None => format_close_report(month, data.as_ref(), archived),
    };
    let report_delivered = send_chunked(chat, &report).await;

    let export = match data.as_ref().filter(|_| archived) {
        Some(archive) => export_archive(chat, archive, now).await,
        None => ExportStatus::Skipped,
    };

    if let Some(reason) = unreadable {
        warn!("Keeping live transactions: {month} could not be archived or summarized");
        return MonthlyCloseOutcome {
            month,
            archive: archive_status,
            report_delivered,
            export,
            clear: ClearStatus::Kept { reason },
        };
    }

    let clear = match delete_all_transactions(db).await {
        Ok(removed) => {
            info!("Monthly close for {month} complete, cleared {removed} transactions");
            ClearStatus::Cleared { removed }
        }
        Err(e) => {
            error!("Failed to clear transactions after closing {month}: {e}");
            if let Err(e) = chat.send_text(CLEAR_FAILED_NOTICE, None).await {
                error!("Could not deliver the cleanup warning: {e}");
            }
            ClearStatus::Failed {
                reason: e.to_string(),
            }
        }
    };

    MonthlyCloseOutcome {
        month,
        archive: archive_status,
        report_delivered,
        export,
        clear,
    }
}

async fn live_fallback(
    db: &DatabaseConnection,
    month: MonthId,
    now: DateTime<Utc>,
) -> Option<MonthlyArchive> {
    let built = match get_all_transactions(db).await {
        Ok(transactions) => build_archive(month, transactions, now),
        Err(e) => Err(e),
    };
    match built {
        Ok(data) => Some(data),
        Err(Error::NoTransactions) => None,
        Err(e) => {
            warn!("Live totals unavailable for the {month} report: {e}");
            None
        }
    }
}

/// Posts text that may exceed the message limit. Returns whether every part was sent.
pub async fn send_chunked<C: ChatTransport>(chat: &C, text: &str) -> bool {
    let mut delivered = true;
    for chunk in split_message(text, MESSAGE_LIMIT) {
        if let Err(e) = chat.send_text(&chunk, None).await {
            error!("Failed to post report: {e}");
            delivered = false;
        }
    }
    delivered
}

async fn export_archive<C: ChatTransport>(
    chat: &C,
    archive: &MonthlyArchive,
    now: DateTime<Utc>,
) -> ExportStatus {
    match upload_archive(chat, archive, now).await {
        Ok(()) => ExportStatus::Sent,
        Err(e) => {
            error!("CSV export for {} failed: {e}", archive.month);
            let notice = format!(
                "⚠️ CSV export failed. Data is still archived; retry later with /export {}",
                archive.month
            );
            if let Err(e) = chat.send_text(&notice, None).await {
                error!("Could not deliver the export warning: {e}");
            }
            ExportStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Generates and uploads the CSV for one archived month.
pub async fn upload_archive<C: ChatTransport>(
    chat: &C,
    archive: &MonthlyArchive,
    now: DateTime<Utc>,
) -> Result<()> {
    let bytes = export::monthly_csv(archive, now)?;
    chat.send_file(
        bytes,
        &export::monthly_filename(archive.month),
        &export::monthly_caption(archive),
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{archive::find_archive, transaction::create_transaction_at},
        test_utils::*,
    };
    use sea_orm::ConnectionTrait;

    fn march() -> MonthId {
        MonthId::new(2025, 3).unwrap()
    }

    async fn seed(db: &DatabaseConnection) -> Result<()> {
        create_transaction_at(db, "1".into(), 20.0, "alice".into(), fixed_time()).await?;
        create_transaction_at(db, "2".into(), 10.0, "bob".into(), fixed_time()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_close_archives_reports_exports_and_clears() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert_eq!(outcome.archive, ArchiveStatus::Archived);
        assert!(outcome.report_delivered);
        assert_eq!(outcome.export, ExportStatus::Sent);
        assert_eq!(outcome.clear, ClearStatus::Cleared { removed: 2 });

        let stored = find_archive(&db, march()).await?.unwrap();
        assert_eq!(stored.total_transactions, 2);
        assert!(get_all_transactions(&db).await?.is_empty());

        let log = chat.log();
        assert!(log.sent[0].text.contains("MONTHLY EXPENSE REPORT: March 2025"));
        assert!(log.sent[0].text.contains("✅ Data archived successfully"));
        assert_eq!(log.files.len(), 1);
        assert_eq!(log.files[0].filename, "expenses_March_2025.csv");
        assert!(log.files[0].caption.contains("2 transactions, 30.00$ total"));
        Ok(())
    }

    #[tokio::test]
    async fn test_close_on_empty_ledger_still_reports_and_clears() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert_eq!(outcome.archive, ArchiveStatus::Empty);
        assert_eq!(outcome.export, ExportStatus::Skipped);
        assert_eq!(outcome.clear, ClearStatus::Cleared { removed: 0 });
        let log = chat.log();
        assert!(log.sent[0].text.contains("No transactions this month"));
        assert!(log.files.is_empty());
        assert!(find_archive(&db, march()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_failure_warns_and_still_clears() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        chat.fail_on(ChatOp::File);

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert!(matches!(outcome.export, ExportStatus::Failed { .. }));
        assert_eq!(outcome.clear, ClearStatus::Cleared { removed: 2 });
        let log = chat.log();
        let warning = &log.sent.last().unwrap().text;
        assert!(warning.contains("/export 2025-03"));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_failure_does_not_block_reset() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        chat.fail_on(ChatOp::Send);

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert!(!outcome.report_delivered);
        assert_eq!(outcome.archive, ArchiveStatus::Archived);
        assert_eq!(outcome.clear, ClearStatus::Cleared { removed: 2 });
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_month_keeps_transactions() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        create_transaction_at(&db, "3".into(), 10.0, "carol".into(), fixed_time()).await?;

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert!(matches!(outcome.archive, ArchiveStatus::Failed { .. }));
        assert_eq!(outcome.export, ExportStatus::Skipped);
        assert!(matches!(outcome.clear, ClearStatus::Kept { ref reason } if reason.contains("carol")));
        assert_eq!(get_all_transactions(&db).await?.len(), 3);
        assert!(find_archive(&db, march()).await?.is_none());

        let log = chat.log();
        assert_eq!(log.sent.len(), 1);
        let report = &log.sent[0].text;
        assert!(report.contains("Could not archive or summarize this month"));
        assert!(report.contains("carol"));
        assert!(!report.contains("No transactions this month"));
        assert!(outcome.summary().contains("transactions kept"));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_failure_keeps_ledger_and_reports_it() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        db.execute_unprepared("DROP TABLE transactions").await?;

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert!(matches!(outcome.archive, ArchiveStatus::Failed { .. }));
        assert_eq!(outcome.export, ExportStatus::Skipped);
        assert!(matches!(outcome.clear, ClearStatus::Kept { .. }));
        let log = chat.log();
        assert!(log.sent[0].text.contains("Transactions were kept"));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_failure_is_reported_not_swallowed() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        db.execute_unprepared(
            "CREATE TRIGGER refuse_delete BEFORE DELETE ON transactions \
             BEGIN SELECT RAISE(ABORT, 'ledger locked'); END;",
        )
        .await?;

        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert_eq!(outcome.archive, ArchiveStatus::Archived);
        assert!(matches!(outcome.clear, ClearStatus::Failed { .. }));
        assert!(find_archive(&db, march()).await?.is_some());
        let log = chat.log();
        assert_eq!(log.sent.last().unwrap().text, CLEAR_FAILED_NOTICE);
        Ok(())
    }

    #[test]
    fn test_summary_lists_every_step() {
        let outcome = MonthlyCloseOutcome {
            month: march(),
            archive: ArchiveStatus::Archived,
            report_delivered: false,
            export: ExportStatus::Failed {
                reason: "timeout".into(),
            },
            clear: ClearStatus::Cleared { removed: 4 },
        };

        let summary = outcome.summary();
        assert!(summary.starts_with("📅 Closed March 2025"));
        assert!(summary.contains("Archive: ✅ archived"));
        assert!(summary.contains("Report: ⚠️ not fully delivered"));
        assert!(summary.contains("CSV: ⚠️ failed (timeout)"));
        assert!(summary.contains("4 transactions cleared"));
    }

    #[tokio::test]
    async fn test_rerunning_close_keeps_single_archive() -> Result<()> {
        let db = setup_test_db().await?;
        let chat = RecordingChat::new();
        seed(&db).await?;
        perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        create_transaction_at(&db, "3".into(), 5.0, "alice".into(), fixed_time()).await?;
        let outcome = perform_monthly_close(&db, &chat, march(), fixed_time()).await;

        assert_eq!(outcome.archive, ArchiveStatus::Archived);
        let stored = find_archive(&db, march()).await?.unwrap();
        assert_eq!(stored.total_transactions, 1);
        Ok(())
    }
}
