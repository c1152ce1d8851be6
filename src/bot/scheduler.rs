//! Monthly close scheduler.
//!
//! Sleeps until the 1st of the next month at the configured local hour, then closes
//! the month that just ended while holding the ledger gate.

use crate::{
    config::categories::ScheduleConfig,
    core::{archive::MonthId, chat::ChatTransport, monthly::perform_monthly_close},
};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info};

/// The first "1st of the month at `hour`:00" strictly after `now`.
#[must_use]
pub fn next_trigger(now: NaiveDateTime, hour: u32) -> Option<NaiveDateTime> {
    let this_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)?.and_hms_opt(hour, 0, 0)?;
    if this_month > now {
        return Some(this_month);
    }

    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(hour, 0, 0)
}

/// The month a close firing at `fired_at` is responsible for.
#[must_use]
pub fn closing_month(fired_at: NaiveDateTime) -> MonthId {
    MonthId::of(&fired_at).previous()
}

/// Spawns the scheduler loop on the current runtime.
pub fn spawn_scheduler<C: ChatTransport + 'static>(
    database: DatabaseConnection,
    chat: Arc<C>,
    gate: Arc<Mutex<()>>,
    schedule: ScheduleConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now().naive_local();
            let Some(fire_at) = next_trigger(now, schedule.close_hour) else {
                error!(
                    "Cannot compute the next close time for hour {}; scheduler stopped",
                    schedule.close_hour
                );
                return;
            };
            info!("Next monthly close scheduled for {fire_at}");

            let wait = (fire_at - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let month = closing_month(fire_at);
            let _guard = gate.lock().await;
            let outcome = perform_monthly_close(&database, chat.as_ref(), month, Utc::now()).await;
            info!("Scheduled close finished: {outcome:?}");
        }
    })
}
