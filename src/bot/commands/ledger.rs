//! Ledger Discord commands - `totals`, `history` and `reset`.
//!
//! These read or wipe the live transactions of the current month.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::say_chunked},
        core::{
            report::{format_history, format_totals},
            totals::{calculate_totals, spending_stats},
            transaction,
        },
        errors::{Error, Result},
    };
    use tracing::info;

    /// Shows the balance, contributions and category breakdown for this month.
    #[poise::command(slash_command, prefix_command)]
    pub async fn totals(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;

        let transactions = transaction::get_all_transactions(db).await?;
        let totals = calculate_totals(&transactions)?;
        let stats = spending_stats(&transactions);

        say_chunked(ctx, &format_totals(&totals, stats.as_ref())).await
    }

    /// Lists every live transaction, newest first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn history(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;

        let transactions = transaction::get_recent_transactions(db, None).await?;
        say_chunked(ctx, &format_history(&transactions)).await
    }

    /// Deletes all live transactions without archiving them.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reset(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();

        let removed = {
            let _guard = data.ledger_gate.lock().await;
            transaction::delete_all_transactions(&data.database).await?
        };
        info!("{} reset the ledger, {removed} transactions removed", ctx.author().name);

        ctx.say(format!(
            "🗑️ All transactions deleted. Fresh start! ({removed} removed)"
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
