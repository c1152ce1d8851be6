//! General Discord commands - ping and help.
//! These commands don't touch the ledger and provide basic bot functionality
//! and user assistance.

/// Builds the `/help` text for the configured categories and close hour.
#[must_use]
pub fn help_text(categories: &[String], close_hour: u32) -> String {
    format!(
        "**📊 ExpenseBuddy Help**\n\n\
        **🏠 Basic Commands:**\n\
        • `/totals` - Show current month summary\n\
        • `/history` - Show all transactions\n\
        • `/help` - Show this help\n\n\
        **📈 Analytics & Comparison:**\n\
        • `/compare` - Compare recent months\n\
        • `/trends` - Analyze spending trends\n\
        • `/export` - Export CSV for the latest archived month\n\
        • `/export compare` - Export comparison CSV\n\
        • `/export 2025-01` - Export a specific month\n\n\
        **🔧 Management:**\n\
        • `/close` - Close the current month now\n\
        • `/reset` - Reset all transactions ⚠️\n\n\
        **💰 Adding Transactions:**\n\
        • Send a number (e.g., 25.50) to add an expense\n\
        • Edit your message to update the amount\n\
        • Use the 🗑️ Delete button to remove a transaction\n\n\
        **🗂️ Categories:**\n{}\n\n\
        **📅 Monthly Process:**\n\
        • Each expense is split 50/50 between the two of you\n\
        • On the 1st of each month at {close_hour:02}:00 the month is archived, \
        reported, exported as CSV and cleared",
        categories.join(", ")
    )
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    ///
    /// Lists the categories from config.toml so the help always matches the buttons.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let config = &ctx.data().config;
        let text = super::help_text(config.categories.names(), config.schedule.close_hour);

        ctx.say(text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
