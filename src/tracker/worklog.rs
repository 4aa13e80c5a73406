use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;

use super::errors::TrackerError;

pub const DEFAULT_WORKLOG_COMMENT: &str = "Automatically added by jira-cli.";
const DEFAULT_START_TIME: &str = "08:00";

/// Request body for adding a worklog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWorklog {
    pub comment: String,
    pub time_spent_seconds: u64,
    /// Local start time, `YYYY-MM-DDTHH:MM:00.000±hhmm`.
    pub started: String,
}

impl NewWorklog {
    /// Build a worklog of `minutes` starting at `date`/`time` in local time.
    ///
    /// The date defaults to today and the time to 08:00.
    pub fn new(
        comment: &str,
        minutes: u64,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Result<Self, TrackerError> {
        let time_spent_seconds = minutes.checked_mul(60).ok_or_else(|| {
            TrackerError::Validation(format!("worklog duration of {minutes} minutes is too large"))
        })?;
        let date = date.map(str::trim).filter(|d| !d.is_empty());
        let time = time.map(str::trim).filter(|t| !t.is_empty());

        let invalid = || {
            TrackerError::Validation(format!(
                "date and time must adhere to formats [YYYY-MM-DD] and [HH:MM], got date=[{}] time=[{}]",
                date.unwrap_or(""),
                time.unwrap_or("")
            ))
        };

        let day = match date {
            Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| invalid())?,
            None => Local::now().date_naive(),
        };
        let at = NaiveTime::parse_from_str(time.unwrap_or(DEFAULT_START_TIME), "%H:%M")
            .map_err(|_| invalid())?;

        let started = Local
            .from_local_datetime(&NaiveDateTime::new(day, at))
            .earliest()
            .ok_or_else(invalid)?;

        let comment = if comment.trim().is_empty() {
            DEFAULT_WORKLOG_COMMENT.to_string()
        } else {
            comment.to_string()
        };

        Ok(Self {
            comment,
            time_spent_seconds,
            started: started.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string(),
        })
    }
}
