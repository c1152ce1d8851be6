//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::archive::recent_archives, errors::Error};

/// Keyword that selects the comparison export
pub const COMPARE_TARGET: &str = "compare";

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Filters export targets by the user's partial input. `compare` is always offered
/// first, followed by archived month ids, most recent first.
#[must_use]
pub fn matching_targets(months: &[String], partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();

    std::iter::once(COMPARE_TARGET.to_string())
        .chain(months.iter().cloned())
        .filter(|target| target.contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// Suggests `/export` targets: `compare` plus every archived month.
pub async fn autocomplete_export_target(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(archives) = recent_archives(db, MAX_SUGGESTIONS as u64).await else {
        return vec![COMPARE_TARGET.to_string()];
    };
    let months: Vec<String> = archives
        .iter()
        .map(|archive| archive.month.to_string())
        .collect();

    matching_targets(&months, partial)
}
