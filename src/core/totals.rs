//! Aggregation over live transactions: 50/50 contributions, category totals,
//! the signed balance and per-month spending statistics.
//!
//! All maps are `BTreeMap`s so iteration (and therefore report output and the
//! balance sign) is deterministic.

use crate::{
    entities::transaction,
    errors::{Error, Result},
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Result of [`calculate_totals`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Totals {
    /// `user_totals[first] - user_totals[second]`, participants sorted by name
    pub balance: f64,
    /// Category name to summed absolute amount
    pub category_totals: BTreeMap<String, f64>,
    /// Author to 50/50 contribution
    pub user_totals: BTreeMap<String, f64>,
}

/// Who owes whom, derived from a signed balance.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// Nothing owed, or fewer than two participants
    Settled,
    /// `debtor` owes `creditor` the given amount
    Owes {
        /// Participant who owes
        debtor: String,
        /// Participant who is owed
        creditor: String,
        /// Positive amount owed
        amount: f64,
    },
}

/// Computes contributions, category totals and the balance.
///
/// Each transaction contributes `abs(amount) / 2` to its author. Uncategorized
/// transactions count towards user totals only. With two participants the one whose
/// name sorts first is the positive reference: a positive balance means the second
/// participant owes the first. With fewer than two the balance is zero; with more
/// than two this fails with [`Error::TooManyParticipants`].
pub fn calculate_totals(transactions: &[transaction::Model]) -> Result<Totals> {
    let mut totals = Totals::default();

    for tx in transactions {
        let amount = tx.amount.abs();
        *totals.user_totals.entry(tx.author.clone()).or_insert(0.0) += amount / 2.0;

        if let Some(category) = &tx.category {
            *totals.category_totals.entry(category.clone()).or_insert(0.0) += amount;
        }
    }

    let participants: Vec<&String> = totals.user_totals.keys().collect();
    totals.balance = match participants.as_slice() {
        [] | [_] => 0.0,
        [first, second] => totals.user_totals[*first] - totals.user_totals[*second],
        _ => {
            return Err(Error::TooManyParticipants {
                participants: participants.iter().map(|name| (*name).clone()).collect(),
            });
        }
    };

    Ok(totals)
}

impl Totals {
    /// Interprets the balance under the lexicographic sign convention.
    #[must_use]
    pub fn settlement(&self) -> Settlement {
        settlement(self.balance, &self.user_totals)
    }

    /// Sum of all category totals (categorized spending only)
    #[must_use]
    pub fn categorized_spend(&self) -> f64 {
        self.category_totals.values().sum()
    }
}

/// Interprets a stored balance against the participants it was computed from.
#[must_use]
pub fn settlement(balance: f64, user_totals: &BTreeMap<String, f64>) -> Settlement {
    let mut names = user_totals.keys();
    let (Some(first), Some(second)) = (names.next(), names.next()) else {
        return Settlement::Settled;
    };

    if balance > 0.0 {
        Settlement::Owes {
            debtor: second.clone(),
            creditor: first.clone(),
            amount: balance,
        }
    } else if balance < 0.0 {
        Settlement::Owes {
            debtor: first.clone(),
            creditor: second.clone(),
            amount: -balance,
        }
    } else {
        Settlement::Settled
    }
}

/// Count, sum and extremes over a set of transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendingStats {
    /// Number of transactions
    pub count: usize,
    /// Sum of absolute amounts
    pub total_spent: f64,
    /// `total_spent / count`
    pub avg_transaction: f64,
    /// Largest absolute amount
    pub highest_transaction: f64,
    /// Smallest absolute amount
    pub lowest_transaction: f64,
    /// Distinct UTC calendar days with at least one transaction
    pub days_with_spending: usize,
}

/// Linear scan statistics. `None` for an empty slice.
#[must_use]
pub fn spending_stats(transactions: &[transaction::Model]) -> Option<SpendingStats> {
    if transactions.is_empty() {
        return None;
    }

    let mut total_spent = 0.0;
    let mut highest_transaction = 0.0_f64;
    let mut lowest_transaction = f64::MAX;
    let mut days: BTreeSet<NaiveDate> = BTreeSet::new();

    for tx in transactions {
        let amount = tx.amount.abs();
        total_spent += amount;
        highest_transaction = highest_transaction.max(amount);
        lowest_transaction = lowest_transaction.min(amount);
        days.insert(tx.created_at.date_naive());
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_transaction = total_spent / transactions.len() as f64;

    Some(SpendingStats {
        count: transactions.len(),
        total_spent,
        avg_transaction,
        highest_transaction,
        lowest_transaction,
        days_with_spending: days.len(),
    })
}

/// `part / whole * 100`, or `None` when `whole` is zero.
#[must_use]
pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    (whole != 0.0).then(|| part / whole * 100.0)
}

/// A category with its share of some total.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    /// Category name
    pub name: String,
    /// Amount spent
    pub amount: f64,
    /// Share of the total, `None` when the total is zero
    pub percent: Option<f64>,
}

/// Ranks categories by amount, highest first. Ties keep name order.
#[must_use]
pub fn rank_categories(category_totals: &BTreeMap<String, f64>, total: f64) -> Vec<CategoryShare> {
    let mut shares: Vec<CategoryShare> = category_totals
        .iter()
        .map(|(name, amount)| CategoryShare {
            name: name.clone(),
            amount: *amount,
            percent: percent_of(*amount, total),
        })
        .collect();

    shares.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    shares
}
