//! Authenticated HTTP client for the Keka attendance API

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::Direction;
use crate::auth::Credential;
use crate::context::Context;
use crate::error::{Error, Result};

const REMOTE_CLOCK_IN_PATH: &str = "/k/attendance/api/mytime/attendance/remoteclockin";

/// Web attendance log source
const ATTENDANCE_LOG_SOURCE: u8 = 1;
/// Manual clock-in type used by the web "Clock in/out" button
const MANUAL_CLOCKIN_TYPE: u8 = 3;

/// Body of the remote clock-in call (used for both directions)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteClockIn {
    pub timestamp: String,
    pub attendance_log_source: u8,
    pub location_address: Option<String>,
    pub manual_clockin_type: u8,
    pub note: &'static str,
    pub original_punch_status: u8,
}

impl RemoteClockIn {
    pub fn new(direction: Direction, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
            attendance_log_source: ATTENDANCE_LOG_SOURCE,
            location_address: None,
            manual_clockin_type: MANUAL_CLOCKIN_TYPE,
            note: direction.note(),
            original_punch_status: direction.punch_status(),
        }
    }
}

/// Attendance client bound to a (fresh) credential.
pub struct AttendanceClient<'a> {
    ctx: &'a Context,
    credential: &'a Credential,
}

impl<'a> AttendanceClient<'a> {
    pub fn new(ctx: &'a Context, credential: &'a Credential) -> Self {
        Self { ctx, credential }
    }

    fn api_base(&self) -> &str {
        self.ctx.settings.api_base.trim_end_matches('/')
    }

    /// POST a clock in/out punch. One attempt only.
    pub async fn remote_clock_in(&self, body: &RemoteClockIn) -> Result<()> {
        let url = format!("{}{}", self.api_base(), REMOTE_CLOCK_IN_PATH);
        tracing::debug!("Attendance POST {}", url);

        let resp = self
            .ctx
            .http
            .post(&url)
            .bearer_auth(self.credential.access_token())
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header(reqwest::header::ORIGIN, self.api_base())
            .header(reqwest::header::REFERER, format!("{}/", self.api_base()))
            .json(body)
            .send()
            .await
            .map_err(|source| Error::Http {
                context: "Remote clock-in",
                source,
            })?;

        check_response(resp, "Remote clock-in").await
    }
}

/// Turn a non-2xx response into an error carrying the body.
async fn check_response(resp: reqwest::Response, context: &'static str) -> Result<()> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Status {
            context,
            status: status.as_u16(),
            body,
        });
    }
    Ok(())
}
