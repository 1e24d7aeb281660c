//! Append-only event log on top of a [`Sheet`].
//!
//! Rows are `[timestamp, count]` (a third running-total column is tolerated
//! and ignored). Timestamps are naive `YYYY-MM-DD HH:MM:SS` strings in the
//! log's fixed UTC offset.

use crate::errors::{StoreError, StoreResult};
use crate::models::Event;
use crate::storage::{Row, Sheet};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_HEADERS: [&str; 2] = ["Timestamp", "時刻"];
const COUNT_HEADERS: [&str; 3] = ["Count", "人数", "累計"];

/// The header row the log writes and expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSchema {
    headers: Vec<String>,
}

impl SheetSchema {
    pub fn english() -> Self {
        Self::new(["Timestamp", "Count"])
    }

    pub fn japanese() -> Self {
        Self::new(["時刻", "人数"])
    }

    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Extra trailing cells (a running-total column) do not count as a mismatch.
    fn matches(&self, row: &[String]) -> bool {
        row.len() >= self.headers.len()
            && self
                .headers
                .iter()
                .zip(row)
                .all(|(expected, cell)| expected == cell.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    Created,
    Unchanged,
    Rewritten,
    Inserted,
}

struct CachedRead {
    fetched_at: Instant,
    events: Arc<Vec<Event>>,
}

pub struct EventLog {
    sheet: Arc<dyn Sheet>,
    offset: FixedOffset,
    ttl: Duration,
    cache: Mutex<Option<CachedRead>>,
}

impl EventLog {
    pub fn new(sheet: Arc<dyn Sheet>, offset: FixedOffset, ttl: Duration) -> Self {
        Self {
            sheet,
            offset,
            ttl,
            cache: Mutex::new(None),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current wall-clock time in the log's offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Make sure row 0 is the expected header. Data rows are never removed.
    pub async fn ensure_schema(&self, schema: &SheetSchema) -> StoreResult<SchemaAction> {
        let schema = schema.clone();
        let action = self
            .with_sheet(move |sheet| {
                let rows = sheet.rows()?;
                let header = schema.headers().to_vec();
                match rows.first() {
                    None => {
                        sheet.append_row(&header)?;
                        Ok(SchemaAction::Created)
                    }
                    Some(first) if schema.matches(first) => Ok(SchemaAction::Unchanged),
                    Some(first) if is_header_row(first) || is_blank(first) => {
                        sheet.update_row(0, &header)?;
                        Ok(SchemaAction::Rewritten)
                    }
                    Some(_) => {
                        sheet.insert_row(0, &header)?;
                        Ok(SchemaAction::Inserted)
                    }
                }
            })
            .await?;

        self.invalidate().await;
        if action != SchemaAction::Unchanged {
            info!(?action, "sheet header updated");
        }
        Ok(action)
    }

    pub async fn append(&self, timestamp: DateTime<FixedOffset>, value: u64) -> StoreResult<()> {
        let row = vec![
            timestamp
                .with_timezone(&self.offset)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            value.to_string(),
        ];
        let result = self.with_sheet(move |sheet| sheet.append_row(&row)).await;
        self.invalidate().await;
        result
    }

    /// All events in sheet order, served from the cache while it is fresh.
    pub async fn read_all(&self) -> StoreResult<Arc<Vec<Event>>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.events));
            }
        }

        let offset = self.offset;
        let rows = self.with_sheet(|sheet| sheet.rows()).await?;
        let events = Arc::new(parse_rows(&rows, offset)?);
        debug!(events = events.len(), "event log reloaded");

        *cache = Some(CachedRead {
            fetched_at: Instant::now(),
            events: Arc::clone(&events),
        });
        Ok(events)
    }

    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn with_sheet<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Sheet) -> StoreResult<T> + Send + 'static,
    {
        let sheet = Arc::clone(&self.sheet);
        tokio::task::spawn_blocking(move || op(sheet.as_ref())).await?
    }
}

/// Turn raw sheet rows into events. A leading header row and blank rows are
/// skipped; any other row that does not parse fails the whole read.
pub fn parse_rows(rows: &[Row], offset: FixedOffset) -> StoreResult<Vec<Event>> {
    let mut events = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if is_blank(row) || (index == 0 && is_header_row(row)) {
            continue;
        }
        let sheet_row = index + 1;
        events.push(parse_row(row, offset).map_err(|reason| StoreError::MalformedRow {
            row: sheet_row,
            reason,
        })?);
    }
    Ok(events)
}

fn parse_row(row: &[String], offset: FixedOffset) -> Result<Event, String> {
    let raw_timestamp = row.first().map(|cell| cell.trim()).unwrap_or_default();
    let naive = NaiveDateTime::parse_from_str(raw_timestamp, TIMESTAMP_FORMAT)
        .map_err(|err| format!("unparseable timestamp '{raw_timestamp}': {err}"))?;
    let timestamp = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| format!("ambiguous timestamp '{raw_timestamp}'"))?;

    let raw_value = row
        .get(1)
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .ok_or_else(|| "missing count".to_string())?;
    let value = raw_value
        .parse::<u64>()
        .map_err(|_| format!("count is not a non-negative integer: '{raw_value}'"))?;

    Ok(Event::new(timestamp, value))
}

fn is_header_row(row: &[String]) -> bool {
    let first = row.first().map(|cell| cell.trim()).unwrap_or_default();
    let second = row.get(1).map(|cell| cell.trim()).unwrap_or_default();
    TIMESTAMP_HEADERS.contains(&first) || COUNT_HEADERS.contains(&second)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySheet;
    use chrono::NaiveDate;

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap();
        jst().from_local_datetime(&naive).unwrap()
    }

    fn log_over(sheet: Arc<MemorySheet>, ttl: Duration) -> EventLog {
        EventLog::new(sheet, jst(), ttl)
    }

    #[tokio::test]
    async fn empty_and_header_only_sheets_read_as_empty() {
        let empty = log_over(Arc::new(MemorySheet::new()), Duration::ZERO);
        assert!(empty.read_all().await.unwrap().is_empty());

        let header_only = log_over(
            Arc::new(MemorySheet::from_rows([["時刻", "人数"]])),
            Duration::ZERO,
        );
        assert!(header_only.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_read_ends_with_the_new_event() {
        let sheet = Arc::new(MemorySheet::from_rows([["Timestamp", "Count"]]));
        let log = log_over(Arc::clone(&sheet), Duration::from_secs(60));

        log.append(at(9, 0), 1).await.unwrap();
        assert_eq!(log.read_all().await.unwrap().len(), 1);

        log.append(at(9, 5), 2).await.unwrap();
        let events = log.read_all().await.unwrap();
        assert_eq!(events.last(), Some(&Event::new(at(9, 5), 2)));

        let rows = sheet.rows().unwrap();
        assert_eq!(rows[2], vec!["2026-01-05 09:05:00".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn append_converts_timestamps_into_the_log_offset() {
        let sheet = Arc::new(MemorySheet::new());
        let log = log_over(Arc::clone(&sheet), Duration::ZERO);
        let utc_midnight = Utc
            .with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
            .unwrap()
            .fixed_offset();

        log.append(utc_midnight, 3).await.unwrap();
        assert_eq!(sheet.rows().unwrap()[0][0], "2026-01-05 09:00:00");
    }

    #[tokio::test]
    async fn cache_serves_stale_rows_until_invalidated() {
        let sheet = Arc::new(MemorySheet::from_rows([["2026-01-05 09:00:00", "1"]]));
        let log = log_over(Arc::clone(&sheet), Duration::from_secs(60));
        assert_eq!(log.read_all().await.unwrap().len(), 1);

        // Out-of-band edit is invisible while the cache is fresh.
        sheet
            .append_row(&["2026-01-05 09:01:00".to_string(), "2".to_string()])
            .unwrap();
        assert_eq!(log.read_all().await.unwrap().len(), 1);

        log.invalidate().await;
        assert_eq!(log.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_count_reports_the_sheet_row() {
        let sheet = Arc::new(MemorySheet::from_rows([
            ["Timestamp", "Count"],
            ["2026-01-05 09:00:00", "1"],
            ["2026-01-05 09:01:00", "lots"],
        ]));
        let log = log_over(sheet, Duration::ZERO);
        match log.read_all().await {
            Err(StoreError::MalformedRow { row, reason }) => {
                assert_eq!(row, 3);
                assert!(reason.contains("lots"));
            }
            other => panic!("expected MalformedRow, got {other:?}"),
        }
    }

    #[test]
    fn negative_counts_and_bad_timestamps_are_malformed() {
        let rows = vec![vec!["2026-01-05 09:00:00".to_string(), "-1".to_string()]];
        assert!(matches!(
            parse_rows(&rows, jst()),
            Err(StoreError::MalformedRow { row: 1, .. })
        ));

        let rows = vec![vec!["yesterday".to_string(), "1".to_string()]];
        assert!(matches!(
            parse_rows(&rows, jst()),
            Err(StoreError::MalformedRow { row: 1, .. })
        ));
    }

    #[test]
    fn blank_rows_and_running_total_column_are_tolerated() {
        let rows = vec![
            vec!["時刻".to_string(), "人数".to_string(), "累計".to_string()],
            vec!["2026-01-05 09:00:00".to_string(), "1".to_string(), "1".to_string()],
            vec![String::new(), String::new()],
            vec!["2026-01-05 10:00:00".to_string(), " 2 ".to_string()],
        ];
        let events = parse_rows(&rows, jst()).unwrap();
        assert_eq!(events, vec![Event::new(at(9, 0), 1), Event::new(at(10, 0), 2)]);
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let sheet = Arc::new(MemorySheet::new());
        let log = log_over(Arc::clone(&sheet), Duration::ZERO);
        let schema = SheetSchema::english();

        assert_eq!(log.ensure_schema(&schema).await.unwrap(), SchemaAction::Created);
        assert_eq!(log.ensure_schema(&schema).await.unwrap(), SchemaAction::Unchanged);
        assert_eq!(sheet.rows().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_schema_rewrites_foreign_header_and_keeps_data() {
        let sheet = Arc::new(MemorySheet::from_rows([
            ["時刻", "人数"],
            ["2026-01-05 09:00:00", "1"],
        ]));
        let log = log_over(Arc::clone(&sheet), Duration::ZERO);

        let action = log.ensure_schema(&SheetSchema::english()).await.unwrap();
        assert_eq!(action, SchemaAction::Rewritten);
        let rows = sheet.rows().unwrap();
        assert_eq!(rows[0], vec!["Timestamp".to_string(), "Count".to_string()]);
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn ensure_schema_inserts_header_above_data() {
        let sheet = Arc::new(MemorySheet::from_rows([["2026-01-05 09:00:00", "1"]]));
        let log = log_over(Arc::clone(&sheet), Duration::ZERO);

        let action = log.ensure_schema(&SheetSchema::japanese()).await.unwrap();
        assert_eq!(action, SchemaAction::Inserted);
        assert_eq!(log.read_all().await.unwrap().len(), 1);
    }
}
