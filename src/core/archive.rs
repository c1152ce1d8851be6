//! Monthly archive snapshots.
//!
//! An archive freezes the month's aggregates together with the full transaction list.
//! Archives are keyed by [`MonthId`]; writing the same month twice replaces the
//! earlier row, which makes a failed close safe to re-run.

use crate::{
    core::{
        totals::{Settlement, calculate_totals, settlement, spending_stats},
        transaction::get_all_transactions,
    },
    entities::{MonthlyArchive as MonthlyArchiveEntity, monthly_archive, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Month, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use std::{collections::BTreeMap, fmt, str::FromStr};
use tracing::info;

/// Calendar month identifier, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthId {
    year: i32,
    month: u8,
}

impl MonthId {
    /// Builds a month id, `None` if `month` is not 1-12.
    #[must_use]
    pub fn new(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The month containing `date`.
    #[must_use]
    pub fn of<D: Datelike>(date: &D) -> Self {
        // Datelike::month() is always 1-12
        #[allow(clippy::cast_possible_truncation)]
        let month = date.month() as u8;
        Self {
            year: date.year(),
            month,
        }
    }

    /// The month before this one.
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Calendar year
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Calendar month, 1-12
    #[must_use]
    pub const fn month(self) -> u8 {
        self.month
    }

    /// English month name, e.g. `"January"`
    #[must_use]
    pub fn month_name(self) -> &'static str {
        Month::try_from(self.month).map_or("Unknown", |m| m.name())
    }

    /// Human label, e.g. `"January 2025"`
    #[must_use]
    pub fn label(self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }
}

impl fmt::Display for MonthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Config {
            message: format!("Invalid month '{s}', expected YYYY-MM"),
        };

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// A closed month: aggregates plus the full transaction snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyArchive {
    /// Archived month, also the storage key
    pub month: MonthId,
    /// Sum of absolute amounts
    pub total_spent: f64,
    /// Number of transactions
    pub total_transactions: usize,
    /// Signed balance (first participant by name is the positive reference)
    pub balance: f64,
    /// Author to 50/50 contribution
    pub user_totals: BTreeMap<String, f64>,
    /// Category to amount
    pub category_totals: BTreeMap<String, f64>,
    /// Mean transaction amount
    pub avg_transaction: f64,
    /// Largest transaction amount
    pub highest_transaction: f64,
    /// Smallest transaction amount
    pub lowest_transaction: f64,
    /// Distinct days with spending
    pub days_with_spending: usize,
    /// Snapshot of the archived transactions, oldest first
    pub transactions: Vec<transaction::Model>,
    /// When the snapshot was taken
    pub archived_at: DateTime<Utc>,
}

impl MonthlyArchive {
    /// Who owed whom when the month closed
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        settlement(self.balance, &self.user_totals)
    }
}

/// Aggregates `transactions` into an archive for `month`.
///
/// Fails with [`Error::NoTransactions`] on an empty ledger rather than recording an
/// all-zero month.
pub fn build_archive(
    month: MonthId,
    transactions: Vec<transaction::Model>,
    archived_at: DateTime<Utc>,
) -> Result<MonthlyArchive> {
    let stats = spending_stats(&transactions).ok_or(Error::NoTransactions)?;
    let totals = calculate_totals(&transactions)?;

    Ok(MonthlyArchive {
        month,
        total_spent: stats.total_spent,
        total_transactions: stats.count,
        balance: totals.balance,
        user_totals: totals.user_totals,
        category_totals: totals.category_totals,
        avg_transaction: stats.avg_transaction,
        highest_transaction: stats.highest_transaction,
        lowest_transaction: stats.lowest_transaction,
        days_with_spending: stats.days_with_spending,
        transactions,
        archived_at,
    })
}

/// Snapshots every live transaction into the archive for `month` and persists it.
/// Live transactions are left in place; clearing them is the caller's next step.
pub async fn archive_snapshot(
    db: &DatabaseConnection,
    month: MonthId,
    now: DateTime<Utc>,
) -> Result<MonthlyArchive> {
    let transactions = get_all_transactions(db).await?;
    let archive = build_archive(month, transactions, now)?;
    upsert_archive(db, &archive).await?;

    info!(
        "Archived {} transactions ({:.2} total) as {}",
        archive.total_transactions, archive.total_spent, archive.month
    );
    Ok(archive)
}

/// Inserts the archive, replacing any existing row for the same month.
pub async fn upsert_archive(db: &DatabaseConnection, archive: &MonthlyArchive) -> Result<()> {
    let active_model = to_active_model(archive)?;

    let existing = MonthlyArchiveEntity::find_by_id(archive.month.to_string())
        .one(db)
        .await?;

    if existing.is_some() {
        active_model.update(db).await?;
    } else {
        active_model.insert(db).await?;
    }

    Ok(())
}

/// Retrieves the archive for one month.
pub async fn find_archive(db: &DatabaseConnection, month: MonthId) -> Result<Option<MonthlyArchive>> {
    MonthlyArchiveEntity::find_by_id(month.to_string())
        .one(db)
        .await?
        .map(MonthlyArchive::try_from)
        .transpose()
}

/// Retrieves up to `limit` archives, most recent month first.
pub async fn recent_archives(db: &DatabaseConnection, limit: u64) -> Result<Vec<MonthlyArchive>> {
    MonthlyArchiveEntity::find()
        .order_by_desc(monthly_archive::Column::Id)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(MonthlyArchive::try_from)
        .collect()
}

fn to_active_model(archive: &MonthlyArchive) -> Result<monthly_archive::ActiveModel> {
    Ok(monthly_archive::ActiveModel {
        id: Set(archive.month.to_string()),
        year: Set(archive.month.year()),
        month: Set(i32::from(archive.month.month())),
        month_name: Set(archive.month.month_name().to_string()),
        total_spent: Set(archive.total_spent),
        total_transactions: Set(i64::try_from(archive.total_transactions).unwrap_or(i64::MAX)),
        balance: Set(archive.balance),
        user_totals: Set(serde_json::to_value(&archive.user_totals)?),
        category_totals: Set(serde_json::to_value(&archive.category_totals)?),
        avg_transaction: Set(archive.avg_transaction),
        highest_transaction: Set(archive.highest_transaction),
        lowest_transaction: Set(archive.lowest_transaction),
        days_with_spending: Set(i64::try_from(archive.days_with_spending).unwrap_or(i64::MAX)),
        transactions: Set(serde_json::to_value(&archive.transactions)?),
        archived_at: Set(archive.archived_at),
    })
}

impl TryFrom<monthly_archive::Model> for MonthlyArchive {
    type Error = Error;

    fn try_from(model: monthly_archive::Model) -> Result<Self> {
        let month = u8::try_from(model.month)
            .ok()
            .and_then(|m| MonthId::new(model.year, m))
            .ok_or_else(|| Error::Config {
                message: format!("Archive {} has an invalid month {}", model.id, model.month),
            })?;

        Ok(Self {
            month,
            total_spent: model.total_spent,
            total_transactions: usize::try_from(model.total_transactions).unwrap_or_default(),
            balance: model.balance,
            user_totals: serde_json::from_value(model.user_totals)?,
            category_totals: serde_json::from_value(model.category_totals)?,
            avg_transaction: model.avg_transaction,
            highest_transaction: model.highest_transaction,
            lowest_transaction: model.lowest_transaction,
            days_with_spending: usize::try_from(model.days_with_spending).unwrap_or_default(),
            transactions: serde_json::from_value(model.transactions)?,
            archived_at: model.archived_at,
        })
    }
}
