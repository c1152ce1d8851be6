//! Month-over-month comparison and multi-month trend analysis over archives.

use crate::core::{archive::MonthlyArchive, archive::MonthId, totals::percent_of};
use std::collections::BTreeMap;

/// Volatility below this percentage is "low".
pub const LOW_VOLATILITY_LIMIT: f64 = 20.0;
/// Volatility at or above this percentage is "high".
pub const HIGH_VOLATILITY_LIMIT: f64 = 40.0;
/// Trend analysis looks at no more than this many months.
pub const TREND_WINDOW: usize = 6;
/// Volatility is only meaningful with at least this many months.
pub const MIN_MONTHS_FOR_VOLATILITY: usize = 3;

/// Growth of `current` over `previous` in percent, `None` when `previous` is zero.
#[must_use]
pub fn growth_rate(current: f64, previous: f64) -> Option<f64> {
    percent_of(current - previous, previous)
}

/// How a category moved between two months.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryChange {
    /// Not present (or zero) last month
    New,
    /// Same amount as last month
    Unchanged,
    /// Percentage change against last month
    Percent(f64),
}

/// One category in a comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDelta {
    /// Category name
    pub name: String,
    /// Amount this month
    pub current: f64,
    /// Amount last month, zero when absent
    pub previous: f64,
    /// Classified change
    pub change: CategoryChange,
}

/// Deltas between the two most recent archived months.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonMetrics {
    /// The newer month
    pub current: MonthId,
    /// The month before it
    pub previous: MonthId,
    /// Absolute change in total spent
    pub spending_change: f64,
    /// Growth of total spent
    pub spending_growth: Option<f64>,
    /// Change in transaction count
    pub transaction_change: i64,
    /// Growth of transaction count
    pub transaction_growth: Option<f64>,
    /// Growth of the average transaction
    pub avg_transaction_growth: Option<f64>,
    /// Change in the number of days with spending
    pub spending_days_change: i64,
    /// Every category of the current month, highest amount first
    pub categories: Vec<CategoryDelta>,
}

/// Compares the first two archives of a most-recent-first list.
/// `None` when fewer than two archives are given.
#[must_use]
pub fn compare_months(archives: &[MonthlyArchive]) -> Option<ComparisonMetrics> {
    let [current, previous, ..] = archives else {
        return None;
    };

    let current_count = count_as_f64(current.total_transactions);
    let previous_count = count_as_f64(previous.total_transactions);

    let mut categories: Vec<CategoryDelta> = current
        .category_totals
        .iter()
        .map(|(name, &amount)| {
            let before = previous.category_totals.get(name).copied().unwrap_or(0.0);
            let change = if before <= 0.0 {
                CategoryChange::New
            } else if amount == before {
                CategoryChange::Unchanged
            } else {
                CategoryChange::Percent((amount - before) / before * 100.0)
            };
            CategoryDelta {
                name: name.clone(),
                current: amount,
                previous: before,
                change,
            }
        })
        .collect();
    categories.sort_by(|a, b| b.current.total_cmp(&a.current));

    Some(ComparisonMetrics {
        current: current.month,
        previous: previous.month,
        spending_change: current.total_spent - previous.total_spent,
        spending_growth: growth_rate(current.total_spent, previous.total_spent),
        transaction_change: count_as_i64(current.total_transactions)
            - count_as_i64(previous.total_transactions),
        transaction_growth: growth_rate(current_count, previous_count),
        avg_transaction_growth: growth_rate(current.avg_transaction, previous.avg_transaction),
        spending_days_change: count_as_i64(current.days_with_spending)
            - count_as_i64(previous.days_with_spending),
        categories,
    })
}

/// Qualitative volatility band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityBand {
    /// Below 20%
    Low,
    /// 20% up to 40%
    Moderate,
    /// 40% and above
    High,
}

impl VolatilityBand {
    /// Classifies a volatility percentage.
    #[must_use]
    pub fn classify(percent: f64) -> Self {
        if percent < LOW_VOLATILITY_LIMIT {
            Self::Low
        } else if percent < HIGH_VOLATILITY_LIMIT {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// Relative standard deviation of monthly totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volatility {
    /// `stddev / mean * 100`
    pub percent: f64,
    /// Band the percentage falls in
    pub band: VolatilityBand,
}

/// Spending pattern over a window of archived months.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendMetrics {
    /// `(month, total_spent)` oldest first
    pub monthly_totals: Vec<(MonthId, f64)>,
    /// Mean of the monthly totals
    pub average_monthly_spend: f64,
    /// Category to average per month it appeared in, highest first
    pub category_averages: Vec<(String, f64)>,
    /// Transactions across the window
    pub total_transactions: usize,
    /// Mean transactions per month
    pub avg_transactions_per_month: f64,
    /// Month with the most spending
    pub highest_month: (MonthId, f64),
    /// Month with the least spending
    pub lowest_month: (MonthId, f64),
    /// Present once enough months are available and spending is non-zero
    pub volatility: Option<Volatility>,
}

/// Analyses up to [`TREND_WINDOW`] archives given most-recent-first.
/// `None` for an empty list.
#[must_use]
pub fn analyze_trends(archives: &[MonthlyArchive]) -> Option<TrendMetrics> {
    let window = &archives[..archives.len().min(TREND_WINDOW)];
    if window.is_empty() {
        return None;
    }

    let monthly_totals: Vec<(MonthId, f64)> = window
        .iter()
        .rev()
        .map(|a| (a.month, a.total_spent))
        .collect();
    let months = count_as_f64(monthly_totals.len());
    let average_monthly_spend = monthly_totals.iter().map(|(_, t)| t).sum::<f64>() / months;

    let mut category_sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for archive in window {
        for (name, amount) in &archive.category_totals {
            let entry = category_sums.entry(name.as_str()).or_insert((0.0, 0));
            entry.0 += amount;
            entry.1 += 1;
        }
    }
    let mut category_averages: Vec<(String, f64)> = category_sums
        .into_iter()
        .map(|(name, (sum, n))| (name.to_string(), sum / count_as_f64(n)))
        .collect();
    category_averages.sort_by(|a, b| b.1.total_cmp(&a.1));

    let total_transactions: usize = window.iter().map(|a| a.total_transactions).sum();

    let mut highest_month = monthly_totals[0];
    let mut lowest_month = monthly_totals[0];
    for &(month, total) in &monthly_totals {
        if total > highest_month.1 {
            highest_month = (month, total);
        }
        if total < lowest_month.1 {
            lowest_month = (month, total);
        }
    }

    let volatility = (monthly_totals.len() >= MIN_MONTHS_FOR_VOLATILITY)
        .then(|| {
            let totals: Vec<f64> = monthly_totals.iter().map(|(_, t)| *t).collect();
            volatility(&totals)
        })
        .flatten();

    Some(TrendMetrics {
        monthly_totals,
        average_monthly_spend,
        category_averages,
        total_transactions,
        avg_transactions_per_month: count_as_f64(total_transactions) / months,
        highest_month,
        lowest_month,
        volatility,
    })
}

/// Population standard deviation over mean, in percent. `None` when the mean is zero.
#[must_use]
pub fn volatility(totals: &[f64]) -> Option<Volatility> {
    if totals.is_empty() {
        return None;
    }
    let n = count_as_f64(totals.len());
    let mean = totals.iter().sum::<f64>() / n;
    let variance = totals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;

    percent_of(variance.sqrt(), mean).map(|percent| Volatility {
        percent,
        band: VolatilityBand::classify(percent),
    })
}

#[allow(clippy::cast_precision_loss)]
const fn count_as_f64(n: usize) -> f64 {
    n as f64
}

fn count_as_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::sample_archive;

    fn month(m: u8) -> MonthId {
        MonthId::new(2025, m).unwrap()
    }

    #[test]
    fn test_growth_rate_zero_previous_is_unavailable() {
        assert_eq!(growth_rate(50.0, 0.0), None);
        assert_eq!(growth_rate(150.0, 100.0), Some(50.0));
        assert_eq!(growth_rate(50.0, 100.0), Some(-50.0));
    }

    #[test]
    fn test_compare_needs_two_months() {
        assert!(compare_months(&[]).is_none());
        assert!(compare_months(&[sample_archive(month(1), 10.0)]).is_none());
    }

    #[test]
    fn test_compare_months_deltas() {
        let mut current = sample_archive(month(2), 150.0);
        current.total_transactions = 6;
        current.avg_transaction = 25.0;
        current.category_totals =
            BTreeMap::from([("Groceries".into(), 100.0), ("Dining".into(), 50.0)]);
        let mut previous = sample_archive(month(1), 100.0);
        previous.total_transactions = 4;
        previous.avg_transaction = 25.0;
        previous.category_totals = BTreeMap::from([("Groceries".into(), 80.0)]);

        let metrics = compare_months(&[current, previous]).unwrap();

        assert_eq!(metrics.current, month(2));
        assert_eq!(metrics.previous, month(1));
        assert_eq!(metrics.spending_change, 50.0);
        assert_eq!(metrics.spending_growth, Some(50.0));
        assert_eq!(metrics.transaction_change, 2);
        assert_eq!(metrics.transaction_growth, Some(50.0));
        assert_eq!(metrics.avg_transaction_growth, Some(0.0));

        assert_eq!(metrics.categories[0].name, "Groceries");
        assert_eq!(metrics.categories[0].change, CategoryChange::Percent(25.0));
        assert_eq!(metrics.categories[1].name, "Dining");
        assert_eq!(metrics.categories[1].change, CategoryChange::New);
    }

    #[test]
    fn test_compare_with_empty_previous_month() {
        let mut previous = sample_archive(month(1), 0.0);
        previous.total_transactions = 0;
        previous.avg_transaction = 0.0;

        let metrics = compare_months(&[sample_archive(month(2), 80.0), previous]).unwrap();

        assert_eq!(metrics.spending_growth, None);
        assert_eq!(metrics.transaction_growth, None);
        assert_eq!(metrics.avg_transaction_growth, None);
    }

    #[test]
    fn test_unchanged_category() {
        let mut current = sample_archive(month(2), 40.0);
        current.category_totals = BTreeMap::from([("Other".into(), 40.0)]);
        let mut previous = sample_archive(month(1), 40.0);
        previous.category_totals = BTreeMap::from([("Other".into(), 40.0)]);

        let metrics = compare_months(&[current, previous]).unwrap();
        assert_eq!(metrics.categories[0].change, CategoryChange::Unchanged);
    }

    #[test]
    fn test_volatility_bands() {
        assert_eq!(VolatilityBand::classify(0.0), VolatilityBand::Low);
        assert_eq!(VolatilityBand::classify(19.99), VolatilityBand::Low);
        assert_eq!(VolatilityBand::classify(20.0), VolatilityBand::Moderate);
        assert_eq!(VolatilityBand::classify(39.9), VolatilityBand::Moderate);
        assert_eq!(VolatilityBand::classify(40.0), VolatilityBand::High);
    }

    #[test]
    fn test_volatility_values() {
        let flat = volatility(&[100.0, 100.0, 100.0]).unwrap();
        assert_eq!(flat.percent, 0.0);
        assert_eq!(flat.band, VolatilityBand::Low);

        // mean 100, population stddev 50
        let swinging = volatility(&[50.0, 150.0]).unwrap();
        assert_eq!(swinging.percent, 50.0);
        assert_eq!(swinging.band, VolatilityBand::High);

        assert!(volatility(&[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_analyze_trends() {
        let mut march = sample_archive(month(3), 300.0);
        march.category_totals = BTreeMap::from([("Groceries".into(), 200.0)]);
        let mut feb = sample_archive(month(2), 100.0);
        feb.category_totals =
            BTreeMap::from([("Groceries".into(), 100.0), ("Other".into(), 30.0)]);
        let jan = sample_archive(month(1), 200.0);

        let trends = analyze_trends(&[march, feb, jan]).unwrap();

        let months: Vec<MonthId> = trends.monthly_totals.iter().map(|(m, _)| *m).collect();
        assert_eq!(months, [month(1), month(2), month(3)]);
        assert_eq!(trends.average_monthly_spend, 200.0);
        assert_eq!(trends.category_averages[0], ("Groceries".to_string(), 150.0));
        assert_eq!(trends.category_averages[1], ("Other".to_string(), 30.0));
        assert_eq!(trends.highest_month, (month(3), 300.0));
        assert_eq!(trends.lowest_month, (month(2), 100.0));
        assert_eq!(trends.volatility.unwrap().band, VolatilityBand::High);
    }

    #[test]
    fn test_trends_window_and_small_samples() {
        assert!(analyze_trends(&[]).is_none());

        let two = [sample_archive(month(2), 10.0), sample_archive(month(1), 10.0)];
        assert!(analyze_trends(&two).unwrap().volatility.is_none());

        let many: Vec<_> = (1..=8).rev().map(|m| sample_archive(month(m), 10.0)).collect();
        let trends = analyze_trends(&many).unwrap();
        assert_eq!(trends.monthly_totals.len(), TREND_WINDOW);
        assert_eq!(trends.monthly_totals[0].0, month(3));
    }
}
