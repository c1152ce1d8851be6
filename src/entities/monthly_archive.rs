//! Monthly archive entity - Snapshot of one closed month.
//!
//! Keyed by the `YYYY-MM` month id so that re-running a close for the same month
//! replaces the row. Maps and the transaction snapshot are stored as JSON columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Monthly archive database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "monthly_archives")]
pub struct Model {
    /// Month id, e.g. `"2025-01"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Calendar year of the archived month
    pub year: i32,
    /// Calendar month (1-12)
    pub month: i32,
    /// English month name used in reports
    pub month_name: String,
    /// Sum of absolute transaction amounts
    pub total_spent: f64,
    /// Number of archived transactions
    pub total_transactions: i64,
    /// Signed 50/50 balance at close time
    pub balance: f64,
    /// Author to contribution map
    pub user_totals: Json,
    /// Category to amount map
    pub category_totals: Json,
    /// Mean transaction amount
    pub avg_transaction: f64,
    /// Largest transaction amount
    pub highest_transaction: f64,
    /// Smallest transaction amount
    pub lowest_transaction: f64,
    /// Distinct calendar days with at least one transaction
    pub days_with_spending: i64,
    /// Full transaction snapshot
    pub transactions: Json,
    /// When the archive was (last) written
    pub archived_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
