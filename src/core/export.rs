//! CSV export of archived months.
//!
//! The files are meant to be opened in a spreadsheet, so they are made of labelled
//! sections separated by blank lines rather than a single rectangular table.

use crate::{
    core::{
        analytics::growth_rate,
        archive::{MonthId, MonthlyArchive},
        totals::{percent_of, rank_categories},
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};

type SectionWriter<'a> = Writer<&'a mut Vec<u8>>;

/// A CSV file made of sections separated by truly empty lines. Each section gets its
/// own writer because the csv writer renders an empty record as `""`.
#[derive(Default)]
struct Document {
    bytes: Vec<u8>,
}

impl Document {
    fn section<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&mut SectionWriter<'_>) -> csv::Result<()>,
    {
        if !self.bytes.is_empty() {
            self.bytes.push(b'\n');
        }
        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut self.bytes);
        write(&mut wtr)?;
        wtr.flush()?;
        Ok(())
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |p| format!("{p:.1}%"))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders one archived month with SUMMARY, USER SPENDING, CATEGORY BREAKDOWN and
/// DETAILED TRANSACTIONS sections.
pub fn monthly_csv(archive: &MonthlyArchive, generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut doc = Document::default();

    doc.section(|wtr| {
        wtr.write_record(["Monthly Expense Report"])?;
        wtr.write_record(["Month", &archive.month.label()])?;
        wtr.write_record(["Generated", &timestamp(generated_at)])
    })?;

    doc.section(|wtr| {
        wtr.write_record(["SUMMARY"])?;
        wtr.write_record(["Total Spent", &money(archive.total_spent)])?;
        wtr.write_record(["Total Transactions", &archive.total_transactions.to_string()])?;
        wtr.write_record(["Average Transaction", &money(archive.avg_transaction)])?;
        wtr.write_record(["Highest Transaction", &money(archive.highest_transaction)])?;
        wtr.write_record(["Lowest Transaction", &money(archive.lowest_transaction)])?;
        wtr.write_record(["Days with Spending", &archive.days_with_spending.to_string()])?;
        wtr.write_record(["Balance", &money(archive.balance)])
    })?;

    if !archive.user_totals.is_empty() {
        let contributed: f64 = archive.user_totals.values().sum();
        doc.section(|wtr| {
            wtr.write_record(["USER SPENDING"])?;
            wtr.write_record(["User", "Amount", "Percentage"])?;
            for (user, amount) in &archive.user_totals {
                wtr.write_record([
                    user.as_str(),
                    &money(*amount),
                    &percent(percent_of(*amount, contributed)),
                ])?;
            }
            Ok(())
        })?;
    }

    if !archive.category_totals.is_empty() {
        doc.section(|wtr| {
            wtr.write_record(["CATEGORY BREAKDOWN"])?;
            wtr.write_record(["Category", "Amount", "Percentage"])?;
            for share in rank_categories(&archive.category_totals, archive.total_spent) {
                wtr.write_record([share.name.as_str(), &money(share.amount), &percent(share.percent)])?;
            }
            Ok(())
        })?;
    }

    if !archive.transactions.is_empty() {
        doc.section(|wtr| {
            wtr.write_record(["DETAILED TRANSACTIONS"])?;
            wtr.write_record(["Date", "Time", "Amount", "Author", "Category"])?;
            for tx in &archive.transactions {
                wtr.write_record([
                    tx.created_at.format("%Y-%m-%d").to_string().as_str(),
                    &tx.created_at.format("%H:%M:%S").to_string(),
                    &money(tx.amount.abs()),
                    &tx.author,
                    tx.category.as_deref().unwrap_or("Uncategorized"),
                ])?;
            }
            Ok(())
        })?;
    }

    Ok(doc.into_bytes())
}

/// Renders several archived months side by side, oldest month first, followed by
/// month-over-month growth rates. `archives` is given most recent first.
pub fn comparison_csv(archives: &[MonthlyArchive], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
    if archives.is_empty() {
        return Err(Error::Export {
            message: "No archives available for comparison".to_string(),
        });
    }

    let chronological: Vec<&MonthlyArchive> = archives.iter().rev().collect();
    let mut doc = Document::default();

    doc.section(|wtr| {
        wtr.write_record(["Monthly Comparison Report"])?;
        wtr.write_record(["Generated", &timestamp(generated_at)])
    })?;

    let metrics: [(&str, fn(&MonthlyArchive) -> String); 7] = [
        ("Total Spent", |a| money(a.total_spent)),
        ("Total Transactions", |a| a.total_transactions.to_string()),
        ("Average Transaction", |a| money(a.avg_transaction)),
        ("Highest Transaction", |a| money(a.highest_transaction)),
        ("Lowest Transaction", |a| money(a.lowest_transaction)),
        ("Days with Spending", |a| a.days_with_spending.to_string()),
        ("Balance", |a| money(a.balance)),
    ];
    doc.section(|wtr| {
        let mut header = vec!["Metric".to_string()];
        header.extend(chronological.iter().map(|a| a.month.label()));
        wtr.write_record(&header)?;

        for (label, value) in metrics {
            let mut row = vec![label.to_string()];
            row.extend(chronological.iter().map(|a| value(a)));
            wtr.write_record(&row)?;
        }
        Ok(())
    })?;

    if chronological.len() > 1 {
        #[allow(clippy::cast_precision_loss)]
        let growth_metrics: [(&str, fn(&MonthlyArchive) -> f64); 3] = [
            ("Total Spent", |a| a.total_spent),
            ("Total Transactions", |a| a.total_transactions as f64),
            ("Average Transaction", |a| a.avg_transaction),
        ];
        doc.section(|wtr| {
            wtr.write_record(["GROWTH RATES (Month-over-Month)"])?;

            let mut header = vec!["Metric".to_string()];
            header.extend(
                chronological
                    .windows(2)
                    .map(|pair| format!("{} vs {}", pair[1].month.label(), pair[0].month.label())),
            );
            wtr.write_record(&header)?;

            for (label, value) in growth_metrics {
                let mut row = vec![label.to_string()];
                row.extend(
                    chronological
                        .windows(2)
                        .map(|pair| percent(growth_rate(value(pair[1]), value(pair[0])))),
                );
                wtr.write_record(&row)?;
            }
            Ok(())
        })?;
    }

    Ok(doc.into_bytes())
}

/// `expenses_March_2025.csv`
#[must_use]
pub fn monthly_filename(month: MonthId) -> String {
    format!("expenses_{}_{}.csv", month.month_name(), month.year())
}

/// `comparison_2025-03.csv`, named after the month it was generated in
#[must_use]
pub fn comparison_filename(generated_in: MonthId) -> String {
    format!("comparison_{generated_in}.csv")
}

/// Caption attached to a monthly export upload
#[must_use]
pub fn monthly_caption(archive: &MonthlyArchive) -> String {
    format!(
        "📊 Monthly expense data for {}\n💾 {} transactions, {:.2}$ total",
        archive.month.label(),
        archive.total_transactions,
        archive.total_spent
    )
}

/// Caption attached to a comparison export upload
#[must_use]
pub fn comparison_caption(months: usize) -> String {
    format!("📊 Monthly comparison report\n📈 {months} months analyzed")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{fixed_time, sample_archive, transaction_model};
    use std::collections::BTreeMap;

    fn month(m: u8) -> MonthId {
        MonthId::new(2025, m).unwrap()
    }

    fn render(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_monthly_csv_sections() {
        let mut archive = sample_archive(month(3), 60.0);
        archive.user_totals = BTreeMap::from([("alice".into(), 10.0), ("bob".into(), 20.0)]);
        archive.category_totals = BTreeMap::from([("Groceries".into(), 20.0)]);
        archive.transactions = vec![
            transaction_model("1", 20.0, "alice", Some("Groceries")),
            transaction_model("2", 40.0, "bob", None),
        ];

        let csv = render(monthly_csv(&archive, fixed_time()).unwrap());

        assert!(csv.starts_with("Monthly Expense Report\nMonth,March 2025\n"));
        assert!(csv.contains("\n\nSUMMARY\nTotal Spent,60.00\n"));
        assert!(csv.contains("USER SPENDING\nUser,Amount,Percentage\nalice,10.00,33.3%\nbob,20.00,66.7%\n"));
        assert!(csv.contains("CATEGORY BREAKDOWN\nCategory,Amount,Percentage\nGroceries,20.00,33.3%\n"));
        assert!(csv.contains("DETAILED TRANSACTIONS\nDate,Time,Amount,Author,Category\n"));
        assert!(csv.contains("2025-03-14,12:00:00,40.00,bob,Uncategorized\n"));
    }

    #[test]
    fn test_sections_separated_by_bare_empty_lines() {
        let mut archive = sample_archive(month(3), 30.0);
        archive.category_totals = BTreeMap::from([("Other".into(), 30.0)]);

        let csv = render(monthly_csv(&archive, fixed_time()).unwrap());

        assert!(!csv.contains("\"\""));
        assert_eq!(csv.matches("\n\n").count(), 3);
        assert!(csv.contains("Balance,0.00\n\nUSER SPENDING\n"));
        assert!(csv.contains("bob,7.50,50.0%\n\nCATEGORY BREAKDOWN\n"));
        assert!(csv.ends_with("Other,30.00,100.0%\n"));

        let comparison = render(
            comparison_csv(&[sample_archive(month(4), 30.0), archive], fixed_time()).unwrap(),
        );
        assert!(comparison.contains("Generated,2025-03-14 12:00:00\n\nMetric,"));
        assert!(comparison.contains("\n\nGROWTH RATES (Month-over-Month)\n"));
    }

    #[test]
    fn test_monthly_csv_quotes_awkward_values() {
        let mut archive = sample_archive(month(3), 5.0);
        archive.category_totals = BTreeMap::from([("Food, misc".into(), 5.0)]);

        let csv = render(monthly_csv(&archive, fixed_time()).unwrap());
        assert!(csv.contains("\"Food, misc\",5.00,100.0%"));
    }

    #[test]
    fn test_comparison_csv_columns_oldest_first() {
        let archives = [
            sample_archive(month(3), 150.0),
            sample_archive(month(2), 100.0),
            sample_archive(month(1), 0.0),
        ];

        let csv = render(comparison_csv(&archives, fixed_time()).unwrap());

        assert!(csv.contains("Metric,January 2025,February 2025,March 2025\n"));
        assert!(csv.contains("Total Spent,0.00,100.00,150.00\n"));
        assert!(csv.contains("GROWTH RATES (Month-over-Month)\n"));
        assert!(csv.contains("Metric,February 2025 vs January 2025,March 2025 vs February 2025\n"));
        assert!(csv.contains("Total Spent,N/A,50.0%\n"));
    }

    #[test]
    fn test_comparison_csv_single_month_has_no_growth() {
        let csv = render(comparison_csv(&[sample_archive(month(3), 10.0)], fixed_time()).unwrap());
        assert!(!csv.contains("GROWTH RATES"));
    }

    #[test]
    fn test_comparison_csv_requires_archives() {
        assert!(matches!(
            comparison_csv(&[], fixed_time()),
            Err(Error::Export { .. })
        ));
    }

    #[test]
    fn test_filenames() {
        assert_eq!(monthly_filename(month(3)), "expenses_March_2025.csv");
        assert_eq!(comparison_filename(month(11)), "comparison_2025-11.csv");
    }
}
