//! Discord implementation of the ledger's chat transport.
//!
//! Every request targets the single configured ledger channel. Message ids cross the
//! boundary as decimal strings.

use crate::{
    core::chat::{ButtonKind, ChatTransport, DeleteTimer, Keyboard},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};
use tracing::warn;

/// Sends, edits and deletes messages in the ledger channel.
#[derive(Clone)]
pub struct DiscordChat {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
}

impl DiscordChat {
    /// Binds the HTTP client to the ledger channel.
    #[must_use]
    pub fn new(http: Arc<serenity::Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: serenity::ChannelId::new(channel_id),
        }
    }
}

fn parse_message_id(message_id: &str) -> Result<serenity::MessageId> {
    message_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(serenity::MessageId::new)
        .ok_or_else(|| Error::Transport {
            message: format!("'{message_id}' is not a Discord message id"),
        })
}

fn action_rows(keyboard: Option<&Keyboard>) -> Vec<serenity::CreateActionRow> {
    keyboard.map_or_else(Vec::new, |keyboard| {
        keyboard
            .rows
            .iter()
            .map(|row| {
                serenity::CreateActionRow::Buttons(
                    row.iter()
                        .map(|button| {
                            let style = match button.kind {
                                ButtonKind::Choice => serenity::ButtonStyle::Secondary,
                                ButtonKind::Destructive => serenity::ButtonStyle::Danger,
                            };
                            serenity::CreateButton::new(button.payload.as_str())
                                .label(button.label.as_str())
                                .style(style)
                        })
                        .collect(),
                )
            })
            .collect()
    })
}

impl ChatTransport for DiscordChat {
    async fn send_text(&self, text: &str, controls: Option<&Keyboard>) -> Result<String> {
        let mut builder = serenity::CreateMessage::new().content(text);
        if controls.is_some() {
            builder = builder.components(action_rows(controls));
        }
        let message = self.channel_id.send_message(&*self.http, builder).await?;
        Ok(message.id.to_string())
    }

    async fn edit_text(
        &self,
        message_id: &str,
        text: &str,
        controls: Option<&Keyboard>,
    ) -> Result<()> {
        let id = parse_message_id(message_id)?;
        let builder = serenity::EditMessage::new()
            .content(text)
            .components(action_rows(controls));
        self.channel_id
            .edit_message(&*self.http, id, builder)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        self.channel_id.delete_message(&*self.http, id).await?;
        Ok(())
    }

    async fn send_file(&self, bytes: Vec<u8>, filename: &str, caption: &str) -> Result<String> {
        let builder = serenity::CreateMessage::new()
            .content(caption)
            .add_file(serenity::CreateAttachment::bytes(bytes, filename));
        let message = self
            .channel_id
            .send_message(&*self.http, builder)
            .await
            .map_err(|e| Error::Export {
                message: format!("upload of {filename} failed: {e}"),
            })?;
        Ok(message.id.to_string())
    }

    fn schedule_delete(&self, message_id: String, delay: Duration) -> DeleteTimer {
        let http = Arc::clone(&self.http);
        let channel_id = self.channel_id;

        DeleteTimer::spawn(delay, async move {
            let result = match parse_message_id(&message_id) {
                Ok(id) => channel_id
                    .delete_message(&*http, id)
                    .await
                    .map_err(Error::from),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                warn!("Scheduled removal of message {message_id} failed: {e}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::chat::category_keyboard, test_utils::test_categories};

    #[test]
    fn test_parse_message_id() {
        assert_eq!(
            parse_message_id("1234567890").unwrap(),
            serenity::MessageId::new(1_234_567_890)
        );
        assert!(parse_message_id("0").is_err());
        assert!(parse_message_id("msg-1").is_err());
    }

    #[test]
    fn test_action_rows_follow_keyboard_layout() {
        let keyboard = category_keyboard(&test_categories(), "42");
        assert_eq!(action_rows(Some(&keyboard)).len(), keyboard.rows.len());
        assert!(action_rows(None).is_empty());
    }
}
