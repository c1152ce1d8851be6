//! Bot layer - Discord-specific interface and command handlers
//!
//! This module connects the ledger to Discord: slash commands, the gateway event
//! handler feeding the ledger worker, the outbound transport, and the monthly close
//! scheduler.

/// Discord command implementations (ledger, archive, general)
pub mod commands;
/// Discord interaction handlers (events, autocomplete)
pub mod handlers;
/// Monthly close scheduling
pub mod scheduler;
/// Discord implementation of the chat transport
pub mod transport;
/// Serialized processing of ledger events
pub mod worker;

use crate::{
    config::AppConfig,
    core::lifecycle::LedgerEvent,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, instrument};
use transport::DiscordChat;
use worker::LedgerWorker;

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Runtime configuration
    pub config: Arc<AppConfig>,
    /// Outbound transport bound to the ledger channel
    pub chat: Arc<DiscordChat>,
    /// Queue consumed by the ledger worker
    pub events: mpsc::UnboundedSender<LedgerEvent>,
    /// Held while an event, a monthly close or a reset touches the ledger
    pub ledger_gate: Arc<Mutex<()>>,
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error}", ctx.command().name);
            if let Err(e) = ctx.say(error.user_notice()).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CommandCheckFailed { error: None, ctx, .. } => {
            let reply = poise::CreateReply::default()
                .content("This bot only works in the shared expense channel.")
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send channel notice: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Connects to Discord and runs until the gateway connection ends.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let (events, events_rx) = mpsc::unbounded_channel();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all_commands(),
            on_error: |error| Box::pin(on_error(error)),
            command_check: Some(|ctx| Box::pin(handlers::events::ledger_channel_only(ctx))),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);

                let chat = Arc::new(DiscordChat::new(Arc::clone(&ctx.http), config.channel_id));
                let ledger_gate = Arc::new(Mutex::new(()));

                LedgerWorker {
                    database: database.clone(),
                    chat: Arc::clone(&chat),
                    categories: config.categories.clone(),
                    gate: Arc::clone(&ledger_gate),
                }
                .spawn(events_rx);
                scheduler::spawn_scheduler(
                    database.clone(),
                    Arc::clone(&chat),
                    Arc::clone(&ledger_gate),
                    config.schedule,
                );

                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                Ok(BotData {
                    database,
                    config,
                    chat,
                    events,
                    ledger_gate,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;
    Ok(())
}
