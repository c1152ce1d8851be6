//! Gateway event handler.
//!
//! Translates Discord messages, edits and button presses in the ledger channel into
//! [`LedgerEvent`]s and hands them to the worker queue. Only the two configured
//! participants can drive the ledger. Nothing here touches the store; the worker
//! applies events in arrival order.

use crate::{
    bot::BotData,
    config::AppConfig,
    core::lifecycle::LedgerEvent,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{debug, warn};

/// Whether traffic from `channel_id` belongs to the ledger.
#[must_use]
pub const fn in_ledger_channel(config: &AppConfig, channel_id: u64) -> bool {
    channel_id == config.channel_id
}

/// The author name to record for a message, or `None` when the message must not
/// feed the ledger: wrong channel, a bot, or someone other than the two participants.
#[must_use]
pub fn ledger_author<'a>(
    config: &'a AppConfig,
    channel_id: u64,
    user_id: u64,
    from_bot: bool,
) -> Option<&'a str> {
    if from_bot || !in_ledger_channel(config, channel_id) {
        return None;
    }
    config.participants.author_for(&user_id.to_string())
}

/// Poise `command_check`: commands only run in the ledger channel.
pub async fn ledger_channel_only(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
    let allowed = in_ledger_channel(&ctx.data().config, ctx.channel_id().get());
    if !allowed {
        debug!(
            "Ignoring /{} from {} outside the ledger channel",
            ctx.command().name,
            ctx.author().name
        );
    }
    Ok(allowed)
}

/// Poise `event_handler` hook.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    let config = data.config.as_ref();

    let ledger_event = match event {
        serenity::FullEvent::Message { new_message } => {
            let author = &new_message.author;
            let Some(name) =
                ledger_author(config, new_message.channel_id.get(), author.id.get(), author.bot)
            else {
                return Ok(());
            };
            LedgerEvent::NewMessage {
                text: new_message.content.clone(),
                author: name.to_string(),
                message_id: new_message.id.to_string(),
            }
        }
        serenity::FullEvent::MessageUpdate { event, .. } => {
            // Partial updates may omit the author; the record itself was created by a participant
            let permitted = event.author.as_ref().map_or_else(
                || in_ledger_channel(config, event.channel_id.get()),
                |author| {
                    ledger_author(config, event.channel_id.get(), author.id.get(), author.bot)
                        .is_some()
                },
            );
            if !permitted {
                return Ok(());
            }
            // Embed-only updates carry no content
            let Some(text) = event.content.clone() else {
                return Ok(());
            };
            LedgerEvent::EditedMessage {
                text,
                message_id: event.id.to_string(),
            }
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            let user = &component.user;
            if ledger_author(config, component.channel_id.get(), user.id.get(), user.bot).is_none() {
                return Ok(());
            }
            component
                .create_response(ctx, serenity::CreateInteractionResponse::Acknowledge)
                .await?;
            LedgerEvent::ButtonPress {
                payload: component.data.custom_id.clone(),
                origin_message_id: component.message.id.to_string(),
            }
        }
        _ => return Ok(()),
    };

    debug!("Queueing {ledger_event:?}");
    if data.events.send(ledger_event).is_err() {
        warn!("Ledger worker is gone; dropping event");
    }
    Ok(())
}
