/// Database configuration and connection management
pub mod database;

/// Category and schedule loading from config.toml
pub mod categories;

/// Participant ids and nicknames from environment variables
pub mod users;

use crate::errors::{Error, Result};
use categories::{CategorySet, ScheduleConfig};
use users::Participants;
use tracing::info;

/// Everything the bot needs at runtime, assembled from config.toml and the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Selectable categories
    pub categories: CategorySet,
    /// Monthly close schedule
    pub schedule: ScheduleConfig,
    /// The one chat channel the ledger listens to
    pub channel_id: u64,
    /// The two people allowed to record expenses
    pub participants: Participants,
}

/// Loads config.toml from the working directory plus the `LEDGER_CHANNEL_ID` and
/// participant environment variables.
pub fn load_app_config() -> Result<AppConfig> {
    let file = categories::load_default_config()?;
    let categories = CategorySet::new(file.categories)?;

    let channel_id = std::env::var("LEDGER_CHANNEL_ID")?
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::Config {
            message: format!("LEDGER_CHANNEL_ID must be a numeric channel id: {e}"),
        })?;
    if channel_id == 0 {
        return Err(Error::Config {
            message: "LEDGER_CHANNEL_ID cannot be 0".to_string(),
        });
    }

    let participants = Participants::from_env()?;
    info!(
        "Loaded {} categories, participants {} and {}, close at {:02}:00 on the 1st",
        categories.names().len(),
        participants.members()[0].name,
        participants.members()[1].name,
        file.schedule.close_hour
    );

    Ok(AppConfig {
        categories,
        schedule: file.schedule,
        channel_id,
        participants,
    })
}
