//! Archive Discord commands - `compare`, `trends`, `export` and `close`.
//!
//! These work on closed months. `close` is the manual trigger for the same monthly
//! close the scheduler runs.

use crate::core::archive::MonthId;

/// What `/export` should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    /// The most recently archived month
    Latest,
    /// Comparison of recent months
    Compare,
    /// One specific month
    Month(MonthId),
}

impl ExportTarget {
    /// Parses the optional `/export` argument. `None` means the input was invalid.
    #[must_use]
    pub fn parse(input: Option<&str>) -> Option<Self> {
        match input.map(str::trim) {
            None | Some("") => Some(Self::Latest),
            Some(arg) if arg.eq_ignore_ascii_case("compare") => Some(Self::Compare),
            Some(arg) => arg.parse().ok().map(Self::Month),
        }
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::ExportTarget;
    use crate::{
        bot::{BotData, commands::say_chunked, handlers::autocomplete},
        core::{
            analytics::{TREND_WINDOW, analyze_trends, compare_months},
            archive::{MonthId, find_archive, recent_archives},
            export,
            monthly::perform_monthly_close,
            report::{format_comparison, format_trends},
        },
        errors::{Error, Result},
    };
    use chrono::{Local, Utc};
    use poise::serenity_prelude as serenity;
    use tracing::info;

    const COMPARE_WINDOW: u64 = 3;

    async fn send_csv(
        ctx: poise::Context<'_, BotData, Error>,
        bytes: Vec<u8>,
        filename: String,
        caption: String,
    ) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(caption)
                .attachment(serenity::CreateAttachment::bytes(bytes, filename)),
        )
        .await?;
        Ok(())
    }

    /// Compares the most recent archived months.
    #[poise::command(slash_command, prefix_command)]
    pub async fn compare(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let archives = recent_archives(&ctx.data().database, COMPARE_WINDOW).await?;

        let Some(metrics) = compare_months(&archives) else {
            let message = if archives.is_empty() {
                "❌ No archived months found for comparison.\n\
                Use the bot for a month and wait for the monthly close to generate archives."
            } else {
                "📊 Only one month archived. Need at least 2 months for comparison.\n\
                Check back after the next monthly close!"
            };
            ctx.say(message).await?;
            return Ok(());
        };

        say_chunked(ctx, &format_comparison(&archives, &metrics)).await
    }

    /// Analyzes spending trends over the last six archived months.
    #[poise::command(slash_command, prefix_command)]
    pub async fn trends(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let archives = recent_archives(&ctx.data().database, TREND_WINDOW as u64).await?;

        let Some(trends) = analyze_trends(&archives) else {
            ctx.say("❌ No archived data found for trend analysis.").await?;
            return Ok(());
        };

        say_chunked(ctx, &format_trends(&trends)).await
    }

    /// Exports archived data as CSV: the latest month, a given month, or a comparison.
    #[poise::command(slash_command, prefix_command)]
    pub async fn export(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Month as YYYY-MM, or \"compare\""]
        #[autocomplete = "autocomplete::autocomplete_export_target"]
        target: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let now = Utc::now();

        let Some(target) = ExportTarget::parse(target.as_deref()) else {
            ctx.say("❌ Invalid format. Use: /export 2025-01 or /export compare")
                .await?;
            return Ok(());
        };

        let archive = match target {
            ExportTarget::Compare => {
                let archives = recent_archives(db, TREND_WINDOW as u64).await?;
                if archives.len() < 2 {
                    ctx.say("❌ Need at least 2 archived months for comparison.")
                        .await?;
                    return Ok(());
                }
                let bytes = export::comparison_csv(&archives, now)?;
                let filename = export::comparison_filename(MonthId::of(&Local::now()));
                return send_csv(ctx, bytes, filename, export::comparison_caption(archives.len()))
                    .await;
            }
            ExportTarget::Latest => {
                let Some(archive) = recent_archives(db, 1).await?.into_iter().next() else {
                    ctx.say(
                        "❌ No archived data found.\nUsage: /export [YYYY-MM] or /export compare",
                    )
                    .await?;
                    return Ok(());
                };
                archive
            }
            ExportTarget::Month(month) => {
                let Some(archive) = find_archive(db, month).await? else {
                    ctx.say(format!("❌ No archive found for {month}")).await?;
                    return Ok(());
                };
                archive
            }
        };

        let bytes = export::monthly_csv(&archive, now)?;
        send_csv(
            ctx,
            bytes,
            export::monthly_filename(archive.month),
            export::monthly_caption(&archive),
        )
        .await
    }

    /// Closes the current month now: archive, report, CSV and reset.
    #[poise::command(slash_command, prefix_command)]
    pub async fn close(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let month = MonthId::of(&Local::now());
        info!("{} triggered a manual close of {month}", ctx.author().name);

        let outcome = {
            let _guard = data.ledger_gate.lock().await;
            perform_monthly_close(&data.database, data.chat.as_ref(), month, Utc::now()).await
        };

        ctx.say(outcome.summary()).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
