//! Chat-facing report text.
//!
//! Every function here is pure: it takes already aggregated data and returns the
//! markdown the bot posts. Nothing in this module touches the store.

use crate::{
    core::{
        analytics::{CategoryChange, ComparisonMetrics, TrendMetrics, VolatilityBand},
        archive::{MonthId, MonthlyArchive},
        totals::{Settlement, SpendingStats, Totals, percent_of, rank_categories},
    },
    entities::transaction,
};
use chrono::NaiveDate;
use std::fmt::Write;

/// Discord rejects messages longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

const RULE: &str = "═══════════════════";
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Generates a bar for a share of a total, e.g. `█████░░░░░`.
///
/// Any non-zero share gets at least one filled cell so small categories stay visible.
#[must_use]
pub fn format_share_bar(percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = percent.clamp(0.0, 100.0);

    // clamped ∈ [0, 100] and length is small, so the product fits in usize.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let mut filled = ((clamped / 100.0) * length as f64).floor() as usize;
    if filled == 0 && clamped > 0.0 {
        filled = 1;
    }
    let empty = length.saturating_sub(filled);

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

fn settlement_line(settlement: &Settlement, settled_text: &str) -> String {
    match settlement {
        Settlement::Owes {
            debtor,
            creditor,
            amount,
        } => format!("   {debtor} owes **{amount:.2}$** to {creditor}\n"),
        Settlement::Settled => format!("   {settled_text}\n"),
    }
}

/// The `/totals` summary: balance, contributions, categories and analytics.
#[must_use]
pub fn format_totals(totals: &Totals, stats: Option<&SpendingStats>) -> String {
    let mut text = format!("📊 **EXPENSE SUMMARY**\n{RULE}\n\n");

    let Some(stats) = stats else {
        text.push_str("❌ No transactions found\n");
        return text;
    };

    text.push_str("💰 **Balance:**\n");
    text.push_str(&settlement_line(&totals.settlement(), "✅ All settled! (0$)"));
    text.push('\n');

    text.push_str("👥 **User Contributions:**\n");
    for (user, amount) in &totals.user_totals {
        writeln!(text, "   {user}: {amount:.2}$").ok();
    }
    text.push('\n');

    let ranked = rank_categories(&totals.category_totals, stats.total_spent);
    if !ranked.is_empty() {
        text.push_str("📈 **Category Breakdown:**\n");
        for share in &ranked {
            let percent = share.percent.unwrap_or(0.0);
            writeln!(
                text,
                "   {} **{:.2}$** ({percent:.1}%)\n   {}",
                share.name,
                share.amount,
                format_share_bar(percent, None)
            )
            .ok();
        }
        let uncategorized = stats.total_spent - totals.categorized_spend();
        if uncategorized > 0.005 {
            writeln!(text, "   Uncategorized **{uncategorized:.2}$**").ok();
        }
    }

    write!(text, "\n💵 **TOTAL SPENT: {:.2}$**\n\n", stats.total_spent).ok();

    text.push_str("📊 **Analytics:**\n");
    writeln!(text, "   • Total transactions: {}", stats.count).ok();
    writeln!(text, "   • Average per transaction: {:.2}$", stats.avg_transaction).ok();
    writeln!(text, "   • Highest transaction: {:.2}$", stats.highest_transaction).ok();
    writeln!(text, "   • Lowest transaction: {:.2}$", stats.lowest_transaction).ok();
    if let Some(top) = ranked.first() {
        writeln!(
            text,
            "   • Top category: {} ({:.1}%)",
            top.name,
            top.percent.unwrap_or(0.0)
        )
        .ok();
    }

    text.push_str("\n🔄 Use /history to see all transactions");
    text
}

/// The `/history` listing; `transactions` are expected newest first.
#[must_use]
pub fn format_history(transactions: &[transaction::Model]) -> String {
    if transactions.is_empty() {
        return "📭 No transactions found.".to_string();
    }

    let mut text = String::from("**📜 Recent Transactions:**\n");
    for (i, tx) in transactions.iter().enumerate() {
        writeln!(
            text,
            "{}. **{:.2}$** by {} ({}) - {}",
            i + 1,
            tx.amount.abs(),
            tx.author,
            tx.category.as_deref().unwrap_or("Uncategorized"),
            tx.created_at.format("%b %-d, %H:%M")
        )
        .ok();
    }
    text
}

fn days_in_month(month: MonthId) -> i64 {
    let (year, m) = (month.year(), u32::from(month.month()));
    let first = NaiveDate::from_ymd_opt(year, m, 1);
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, m + 1, 1)
    };
    first
        .zip(next)
        .map_or(30, |(first, next)| (next - first).num_days())
}

/// The report posted when a month closes.
///
/// `data` is the archived month when archiving worked, or the same aggregates built
/// from live records when it did not. `None` means there was nothing to report.
#[must_use]
pub fn format_close_report(month: MonthId, data: Option<&MonthlyArchive>, archived: bool) -> String {
    let mut text = format!("📅 **MONTHLY EXPENSE REPORT: {}**\n{RULE}\n\n", month.label());

    match data {
        None => text.push_str("❌ No transactions this month\n"),
        Some(archive) => {
            text.push_str("📊 **Month Summary:**\n");
            writeln!(text, "   • Total transactions: {}", archive.total_transactions).ok();
            writeln!(text, "   • Total spent: **{:.2}$**", archive.total_spent).ok();
            writeln!(text, "   • Average per transaction: {:.2}$", archive.avg_transaction).ok();
            #[allow(clippy::cast_precision_loss)]
            let per_day = archive.total_spent / days_in_month(month) as f64;
            write!(text, "   • Average per day: {per_day:.2}$\n\n").ok();

            if archived {
                text.push_str("💾 **Archive Status:** ✅ Data archived successfully\n\n");
            } else {
                text.push_str("💾 **Archive Status:** ⚠️ Archive failed (data in report only)\n\n");
            }

            if archive.user_totals.len() >= 2 {
                text.push_str("💰 **Final Balance:**\n");
                text.push_str(&settlement_line(&archive.settlement(), "✅ Perfect balance! (0$)"));
                text.push('\n');
            }

            let contributed: f64 = archive.user_totals.values().sum();
            text.push_str("👥 **User Spending:**\n");
            for (user, amount) in &archive.user_totals {
                let percent = percent_of(*amount, contributed).unwrap_or(0.0);
                writeln!(text, "   {user}: {amount:.2}$ ({percent:.1}%)").ok();
            }
            text.push('\n');

            let ranked = rank_categories(&archive.category_totals, archive.total_spent);
            if !ranked.is_empty() {
                text.push_str("🏆 **Top Categories:**\n");
                for (medal, share) in MEDALS.iter().zip(&ranked) {
                    writeln!(
                        text,
                        "   {medal} {}: {:.2}$ ({:.1}%)",
                        share.name,
                        share.amount,
                        share.percent.unwrap_or(0.0)
                    )
                    .ok();
                }
                text.push('\n');
            }

            text.push_str("🎯 **Month Insights:**\n");
            writeln!(text, "   • Biggest splurge: {:.2}$", archive.highest_transaction).ok();
            writeln!(text, "   • Smallest expense: {:.2}$", archive.lowest_transaction).ok();
            writeln!(text, "   • Days with spending: {}", archive.days_with_spending).ok();
        }
    }

    text.push_str("\n🔄 **Starting fresh for next month!**\n");
    if archived {
        text.push_str("All transactions have been archived.\n📊 CSV export will be sent shortly...");
    } else {
        text.push_str("Transactions cleared (archive failed).");
    }
    text
}

/// The report posted when a month could be neither archived nor summarized from live
/// records. The ledger is left untouched in that case.
#[must_use]
pub fn format_close_failure(month: MonthId, reason: &str) -> String {
    format!(
        "📅 **MONTHLY EXPENSE REPORT: {}**\n{RULE}\n\n\
        ⚠️ **Could not archive or summarize this month:**\n   {reason}\n\n\
        💾 Transactions were kept. Fix the problem and run /close to try again.",
        month.label()
    )
}

fn direction(change: f64) -> &'static str {
    if change < 0.0 { "📉" } else { "📈" }
}

fn signed_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |p| format!("{p:+.1}%"))
}

/// The `/compare` report. `archives` are most recent first, as used for `metrics`.
#[must_use]
pub fn format_comparison(archives: &[MonthlyArchive], metrics: &ComparisonMetrics) -> String {
    let mut text = format!("📊 **MONTHLY COMPARISON**\n{RULE}\n\n");

    text.push_str("📈 **Spending Overview:**\n");
    for (i, archive) in archives.iter().enumerate() {
        let marker = if i == 0 { "🆕" } else { "📅" };
        writeln!(
            text,
            "{marker} {}: **{:.2}$** ({} transactions)",
            archive.month.label(),
            archive.total_spent,
            archive.total_transactions
        )
        .ok();
    }
    text.push('\n');

    text.push_str("📈 **Month-over-Month:**\n");
    writeln!(
        text,
        "{} Spending: {:.2}$ ({})",
        direction(metrics.spending_change),
        metrics.spending_change,
        signed_percent(metrics.spending_growth)
    )
    .ok();
    #[allow(clippy::cast_precision_loss)]
    let transaction_direction = direction(metrics.transaction_change as f64);
    write!(
        text,
        "{transaction_direction} Transactions: {:+}\n\n",
        metrics.transaction_change
    )
    .ok();

    if !metrics.categories.is_empty() {
        text.push_str("🏆 **Top Categories Comparison:**\n");
        for delta in metrics.categories.iter().take(3) {
            let change = match delta.change {
                CategoryChange::New => "new category".to_string(),
                CategoryChange::Unchanged => "no change".to_string(),
                CategoryChange::Percent(p) => format!("{p:+.1}%"),
            };
            writeln!(text, "   {}: {:.2}$ ({change})", delta.name, delta.current).ok();
        }
        text.push('\n');
    }

    text.push_str("💡 **Insights:**\n");
    match metrics.avg_transaction_growth {
        Some(g) if g > 0.0 => text.push_str("   • Average transaction amount increased\n"),
        Some(g) if g < 0.0 => text.push_str("   • Average transaction amount decreased\n"),
        _ => {}
    }
    match metrics.spending_days_change {
        d if d > 0 => text.push_str("   • More active spending days\n"),
        d if d < 0 => text.push_str("   • Fewer active spending days\n"),
        _ => text.push_str("   • Same number of spending days\n"),
    }

    text.push_str("\n📄 Use /export compare to get the detailed CSV comparison");
    text
}

/// The `/trends` report.
#[must_use]
pub fn format_trends(trends: &TrendMetrics) -> String {
    let mut text = format!("📈 **SPENDING TRENDS ANALYSIS**\n{RULE}\n\n");

    text.push_str("💰 **Monthly Spending Trend:**\n");
    let mut previous: Option<f64> = None;
    for (month, total) in &trends.monthly_totals {
        let marker = match previous {
            Some(p) if *total > p => "📈",
            Some(p) if *total < p => "📉",
            _ => "📊",
        };
        writeln!(text, "{marker} {}: {total:.2}$", month.label()).ok();
        previous = Some(*total);
    }
    write!(
        text,
        "\n📊 **Average Monthly Spending:** {:.2}$\n\n",
        trends.average_monthly_spend
    )
    .ok();

    if !trends.category_averages.is_empty() {
        text.push_str("🏷️ **Category Trends (Avg/Month):**\n");
        for (name, avg) in &trends.category_averages {
            let share = percent_of(*avg, trends.average_monthly_spend).unwrap_or(0.0);
            writeln!(text, "   {name}: {avg:.2}$/month ({share:.1}%)").ok();
        }
        text.push('\n');
    }

    text.push_str("📱 **Transaction Patterns:**\n");
    writeln!(
        text,
        "   • Avg transactions/month: {:.1}",
        trends.avg_transactions_per_month
    )
    .ok();
    writeln!(
        text,
        "   • Total months analyzed: {}",
        trends.monthly_totals.len()
    )
    .ok();
    writeln!(text, "   • Total transactions: {}", trends.total_transactions).ok();

    if let Some(volatility) = trends.volatility {
        text.push_str("\n🔍 **Insights:**\n");
        let (high_month, high) = trends.highest_month;
        let (low_month, low) = trends.lowest_month;
        writeln!(text, "   • Highest spending: {} ({high:.2}$)", high_month.label()).ok();
        writeln!(text, "   • Lowest spending: {} ({low:.2}$)", low_month.label()).ok();
        writeln!(text, "   • Spending volatility: {:.1}%", volatility.percent).ok();
        text.push_str(match volatility.band {
            VolatilityBand::Low => "   • 🟢 Consistent spending pattern\n",
            VolatilityBand::Moderate => "   • 🟡 Moderate spending variation\n",
            VolatilityBand::High => "   • 🔴 High spending volatility\n",
        });
    }

    text
}

/// Splits text into chunks under `limit` characters, breaking between lines.
/// A single line longer than `limit` is split at character boundaries.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let mut line = line;
        while line.chars().count() > limit {
            let split_at = line
                .char_indices()
                .nth(limit)
                .map_or(line.len(), |(i, _)| i);
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.push(line[..split_at].to_string());
            line = &line[split_at..];
        }

        let needed = current.chars().count() + line.chars().count() + usize::from(!current.is_empty());
        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
