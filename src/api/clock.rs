//! Scheduled clock in/out

use chrono::{Datelike, Weekday};

use super::client::{AttendanceClient, RemoteClockIn};
use super::Direction;
use crate::auth;
use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The punch was accepted
    Punched,
    /// Weekend in the business timezone; nothing was sent
    Skipped,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        self == Outcome::Punched
    }
}

/// Clock in or out once. Any failed step aborts; nothing is retried here, the
/// next scheduled trigger is the retry.
pub async fn perform(ctx: &Context, direction: Direction) -> Result<Outcome> {
    let now = ctx.now();
    let local = now.with_timezone(&ctx.settings.timezone);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        tracing::info!("{} is not a weekday, skipping clock {}", local.weekday(), direction);
        return Ok(Outcome::Skipped);
    }

    tracing::info!("Attempting clock {}...", direction);
    let credential = auth::ensure_fresh(ctx).await?;

    let body = RemoteClockIn::new(direction, now);
    AttendanceClient::new(ctx, &credential)
        .remote_clock_in(&body)
        .await?;

    tracing::info!(
        "Clock {} successful at {}",
        direction,
        local.format("%Y-%m-%d %H:%M:%S %Z")
    );
    Ok(Outcome::Punched)
}
