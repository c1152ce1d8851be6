//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Archive commands (compare, trends, export, close)
pub mod archive;

/// General utility commands
pub mod general;

/// Live ledger commands (totals, history, reset)
pub mod ledger;

use crate::{
    bot::BotData,
    core::report::{MESSAGE_LIMIT, split_message},
    errors::{Error, Result},
};

/// Replies with `text`, split into as many messages as the length limit requires.
pub async fn say_chunked(ctx: poise::Context<'_, BotData, Error>, text: &str) -> Result<()> {
    for chunk in split_message(text, MESSAGE_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// Every slash command the bot registers.
#[must_use]
pub fn all_commands() -> Vec<poise::Command<BotData, Error>> {
    vec![
        general::ping(),
        general::help(),
        ledger::totals(),
        ledger::history(),
        ledger::reset(),
        archive::compare(),
        archive::trends(),
        archive::export(),
        archive::close(),
    ]
}
