use crate::errors::StoreError;
use crate::models::{DailyPoint, Event, HourlyPoint, SummaryResponse};
use chrono::{NaiveDate, Timelike};
use std::collections::BTreeMap;
use tracing::warn;

pub const HOURS_PER_DAY: usize = 24;

/// Whether the first recorded value counts as visitors who were already
/// present when logging started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitialVisitors {
    #[default]
    Count,
    Skip,
}

pub fn current_value(events: &[Event]) -> u64 {
    events.last().map_or(0, |event| event.value)
}

/// Everyone who ever came in: the sum of every upward step. Decrements and
/// resets never subtract.
pub fn cumulative_total(events: &[Event], policy: InitialVisitors) -> u64 {
    let initial = match (policy, events.first()) {
        (InitialVisitors::Count, Some(first)) => first.value,
        _ => 0,
    };
    events.windows(2).fold(initial, |total, pair| {
        total.saturating_add(pair[1].value.saturating_sub(pair[0].value))
    })
}

/// Last value seen on each calendar date, ordered by date.
pub fn daily_last(events: &[Event]) -> BTreeMap<NaiveDate, u64> {
    let mut days = BTreeMap::new();
    for event in events {
        days.insert(event.timestamp.date_naive(), event.value);
    }
    days
}

/// Last value per hour of `date`, with empty hours forward-filled from the
/// previous hour (0 before the first event of the day).
pub fn hourly_series(events: &[Event], date: NaiveDate) -> [u64; HOURS_PER_DAY] {
    let mut buckets: [Option<u64>; HOURS_PER_DAY] = [None; HOURS_PER_DAY];
    for event in events.iter().filter(|event| event.timestamp.date_naive() == date) {
        buckets[event.timestamp.hour() as usize] = Some(event.value);
    }

    let mut series = [0u64; HOURS_PER_DAY];
    let mut carried = 0;
    for (slot, bucket) in series.iter_mut().zip(buckets) {
        if let Some(value) = bucket {
            carried = value;
        }
        *slot = carried;
    }
    series
}

pub fn build_summary(
    events: Result<&[Event], &StoreError>,
    selected: NaiveDate,
    policy: InitialVisitors,
) -> SummaryResponse {
    let (events, warning) = match events {
        Ok(events) => (events, None),
        Err(err) => {
            warn!("event log unavailable, showing empty view: {err}");
            (&[][..], Some(format!("Could not read the visitor log ({err}).")))
        }
    };

    let daily = daily_last(events);
    let hourly = hourly_series(events, selected);

    let mut dates: Vec<String> = daily.keys().map(NaiveDate::to_string).collect();
    if !daily.contains_key(&selected) {
        dates.push(selected.to_string());
        dates.sort();
    }

    SummaryResponse {
        current: current_value(events),
        total: cumulative_total(events, policy),
        selected_date: selected.to_string(),
        dates,
        daily: daily
            .into_iter()
            .map(|(date, value)| DailyPoint {
                date: date.to_string(),
                value,
            })
            .collect(),
        hourly: hourly
            .into_iter()
            .enumerate()
            .map(|(hour, value)| HourlyPoint {
                hour: hour as u8,
                value,
            })
            .collect(),
        warning,
    }
}
