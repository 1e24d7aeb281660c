use crate::errors::StoreResult;
use crate::event_log::EventLog;
use crate::models::CountOutcome;
use crate::stats::current_value;
use chrono::{DateTime, FixedOffset};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountAction {
    Add,
    Sub,
    Reset,
}

impl CountAction {
    pub fn next_value(self, current: u64) -> u64 {
        match self {
            Self::Add => current.saturating_add(1),
            Self::Sub => current.saturating_sub(1),
            Self::Reset => 0,
        }
    }

    fn describe(self, previous: u64, current: u64) -> String {
        match self {
            Self::Add => format!("Recorded visitor #{current}."),
            Self::Sub => format!("Decreased {previous} → {current}."),
            Self::Reset => "Count reset to 0.".to_string(),
        }
    }
}

impl FromStr for CountAction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "add" => Ok(Self::Add),
            "sub" => Ok(Self::Sub),
            "reset" => Ok(Self::Reset),
            _ => Err("action must be 'add', 'sub' or 'reset'".to_string()),
        }
    }
}

/// Read the latest count, append the adjusted one. Nothing is written when
/// the read fails.
pub async fn apply(
    log: &EventLog,
    action: CountAction,
    now: DateTime<FixedOffset>,
) -> StoreResult<CountOutcome> {
    let previous = current_value(&log.read_all().await?);
    let current = action.next_value(previous);
    log.append(now, current).await?;

    info!(?action, previous, current, "count recorded");
    Ok(CountOutcome {
        previous,
        current,
        message: action.describe(previous, current),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::storage::{MemorySheet, Row, Sheet};
    use std::{sync::Arc, time::Duration};

    struct ReadOnlySheet(MemorySheet);

    impl Sheet for ReadOnlySheet {
        fn rows(&self) -> StoreResult<Vec<Row>> {
            self.0.rows()
        }

        fn append_row(&self, _row: &[String]) -> StoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only sheet").into())
        }

        fn update_row(&self, _index: usize, _row: &[String]) -> StoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only sheet").into())
        }

        fn insert_row(&self, _index: usize, _row: &[String]) -> StoreResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only sheet").into())
        }
    }

    fn memory_log(sheet: Arc<dyn Sheet>) -> EventLog {
        EventLog::new(
            sheet,
            FixedOffset::east_opt(9 * 3600).unwrap(),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn parses_actions() {
        assert_eq!("add".parse::<CountAction>(), Ok(CountAction::Add));
        assert_eq!(" sub ".parse::<CountAction>(), Ok(CountAction::Sub));
        assert_eq!("reset".parse::<CountAction>(), Ok(CountAction::Reset));
        assert!("double".parse::<CountAction>().is_err());
    }

    #[test]
    fn decrement_floors_at_zero() {
        assert_eq!(CountAction::Sub.next_value(0), 0);
        assert_eq!(CountAction::Sub.next_value(3), 2);
        assert_eq!(CountAction::Add.next_value(u64::MAX), u64::MAX);
    }

    #[tokio::test]
    async fn actions_append_and_report() {
        let log = memory_log(Arc::new(MemorySheet::from_rows([["Timestamp", "Count"]])));
        let now = log.now();

        let added = apply(&log, CountAction::Add, now).await.unwrap();
        assert_eq!((added.previous, added.current), (0, 1));
        assert_eq!(added.message, "Recorded visitor #1.");

        apply(&log, CountAction::Add, now).await.unwrap();
        let subbed = apply(&log, CountAction::Sub, now).await.unwrap();
        assert_eq!(subbed.message, "Decreased 2 → 1.");

        let reset = apply(&log, CountAction::Reset, now).await.unwrap();
        assert_eq!((reset.previous, reset.current), (1, 0));

        let values: Vec<u64> = log.read_all().await.unwrap().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![1, 2, 1, 0]);
    }

    #[tokio::test]
    async fn write_failure_is_returned() {
        let sheet = ReadOnlySheet(MemorySheet::from_rows([["2026-01-05 09:00:00", "4"]]));
        let log = memory_log(Arc::new(sheet));
        let now = log.now();

        let err = apply(&log, CountAction::Add, now).await.unwrap_err();
        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(log.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_log_blocks_the_write() {
        let sheet = Arc::new(MemorySheet::from_rows([["2026-01-05 09:00:00", "four"]]));
        let log = memory_log(sheet.clone());
        let now = log.now();

        let err = apply(&log, CountAction::Add, now).await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedRow { row: 1, .. }));
        assert_eq!(sheet.rows().unwrap().len(), 1);
    }
}
