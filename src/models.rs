use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One recorded counter change: the headcount after the change, stamped with
/// the local time it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: DateTime<FixedOffset>,
    pub value: u64,
}

impl Event {
    pub fn new(timestamp: DateTime<FixedOffset>, value: u64) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Deserialize)]
pub struct CountRequest {
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountOutcome {
    pub previous: u64,
    pub current: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyPoint {
    pub hour: u8,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub current: u64,
    pub total: u64,
    pub selected_date: String,
    pub dates: Vec<String>,
    pub daily: Vec<DailyPoint>,
    pub hourly: Vec<HourlyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
