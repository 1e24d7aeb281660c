use crate::errors::{StoreError, StoreResult};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tracing::debug;

pub type Row = Vec<String>;

/// A worksheet-like table of string cells. Row 0 is conventionally the header.
///
/// Implementations are blocking; callers in async context go through
/// [`crate::event_log::EventLog`], which moves the calls onto the blocking pool.
pub trait Sheet: Send + Sync {
    /// All rows in insertion order.
    fn rows(&self) -> StoreResult<Vec<Row>>;

    /// Append one row after the last row.
    fn append_row(&self, row: &[String]) -> StoreResult<()>;

    /// Overwrite the row at `index`.
    fn update_row(&self, index: usize, row: &[String]) -> StoreResult<()>;

    /// Insert a row at `index`, shifting the following rows down.
    fn insert_row(&self, index: usize, row: &[String]) -> StoreResult<()>;
}

/// A sheet persisted as a JSON array of rows in a single file.
///
/// The file must exist when the sheet is opened; an empty file is an empty
/// sheet.
pub struct FileSheet {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSheet {
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(Self {
                path,
                lock: Mutex::new(()),
            }),
            Ok(_) => Err(StoreError::NotFound(path)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(path)),
            Err(err) => Err(err.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self) -> StoreResult<Vec<Row>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn persist(&self, rows: &[Row]) -> StoreResult<()> {
        let payload = serde_json::to_vec_pretty(rows)?;
        fs::write(&self.path, payload)?;
        debug!(path = %self.path.display(), rows = rows.len(), "sheet written");
        Ok(())
    }

    fn modify(&self, edit: impl FnOnce(&mut Vec<Row>)) -> StoreResult<()> {
        let _guard = self.guard();
        let mut rows = self.load()?;
        edit(&mut rows);
        self.persist(&rows)
    }
}

impl Sheet for FileSheet {
    fn rows(&self) -> StoreResult<Vec<Row>> {
        let _guard = self.guard();
        self.load()
    }

    fn append_row(&self, row: &[String]) -> StoreResult<()> {
        self.modify(|rows| rows.push(row.to_vec()))
    }

    fn update_row(&self, index: usize, row: &[String]) -> StoreResult<()> {
        self.modify(|rows| place_row(rows, index, row, false))
    }

    fn insert_row(&self, index: usize, row: &[String]) -> StoreResult<()> {
        self.modify(|rows| place_row(rows, index, row, true))
    }
}

/// An in-process sheet, used by tests and local demos.
#[derive(Default)]
pub struct MemorySheet {
    rows: Mutex<Vec<Row>>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I, R, C>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self {
            rows: Mutex::new(rows),
        }
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Row>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Sheet for MemorySheet {
    fn rows(&self) -> StoreResult<Vec<Row>> {
        Ok(self.guard().clone())
    }

    fn append_row(&self, row: &[String]) -> StoreResult<()> {
        self.guard().push(row.to_vec());
        Ok(())
    }

    fn update_row(&self, index: usize, row: &[String]) -> StoreResult<()> {
        place_row(&mut self.guard(), index, row, false);
        Ok(())
    }

    fn insert_row(&self, index: usize, row: &[String]) -> StoreResult<()> {
        place_row(&mut self.guard(), index, row, true);
        Ok(())
    }
}

// Out-of-range indices pad with empty rows, as a spreadsheet grid would.
fn place_row(rows: &mut Vec<Row>, index: usize, row: &[String], insert: bool) {
    if index >= rows.len() {
        rows.resize_with(index, Vec::new);
        rows.push(row.to_vec());
    } else if insert {
        rows.insert(index, row.to_vec());
    } else {
        rows[index] = row.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_sheet_path(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("visitor_counter_{tag}_{}_{nanos}.json", std::process::id()));
        path
    }

    fn cells(values: &[&str]) -> Row {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let path = temp_sheet_path("missing");
        match FileSheet::open(&path) {
            Err(StoreError::NotFound(reported)) => assert_eq!(reported, path),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_file_reads_as_empty_sheet_and_appends_in_order() {
        let path = temp_sheet_path("append");
        fs::write(&path, b"").unwrap();
        let sheet = FileSheet::open(&path).unwrap();
        assert!(sheet.rows().unwrap().is_empty());

        sheet.append_row(&cells(&["Timestamp", "Count"])).unwrap();
        sheet.append_row(&cells(&["2026-01-05 09:00:00", "1"])).unwrap();
        sheet.append_row(&cells(&["2026-01-05 09:05:00", "2"])).unwrap();

        let reopened = FileSheet::open(&path).unwrap();
        let rows = reopened.rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], cells(&["2026-01-05 09:05:00", "2"]));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn garbage_file_is_a_format_error() {
        let path = temp_sheet_path("garbage");
        fs::write(&path, b"not json").unwrap();
        let sheet = FileSheet::open(&path).unwrap();
        assert!(matches!(sheet.rows(), Err(StoreError::Format(_))));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn memory_sheet_update_and_insert() {
        let sheet = MemorySheet::from_rows([["a", "1"], ["b", "2"]]);
        sheet.update_row(0, &cells(&["h", "c"])).unwrap();
        sheet.insert_row(1, &cells(&["x", "9"])).unwrap();
        let rows = sheet.rows().unwrap();
        assert_eq!(rows, vec![cells(&["h", "c"]), cells(&["x", "9"]), cells(&["b", "2"])]);
    }

    #[test]
    fn update_past_the_end_pads_with_blank_rows() {
        let sheet = MemorySheet::new();
        sheet.update_row(2, &cells(&["h", "c"])).unwrap();
        let rows = sheet.rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_empty());
        assert_eq!(rows[2], cells(&["h", "c"]));
    }
}
