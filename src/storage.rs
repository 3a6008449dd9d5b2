use crate::errors::DataLoadError;
use crate::models::{EventRecord, EventTable};
use chrono::DateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::{env, fs::File, io, path::Path, path::PathBuf};
use tracing::{debug, info};

const COLUMN_COUNT: usize = 5;

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/user_behavior_sample.csv")
}

/// Parses a headerless `user_id,item_id,category_id,behavior_type,timestamp`
/// file into an [`EventTable`].
pub fn load_events(path: &Path) -> Result<EventTable, DataLoadError> {
    let file = File::open(path).map_err(|source| open_error(path, source))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let mut events = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DataLoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(0, |p| p.line());
        events.push(parse_record(&record, line)?);
    }

    info!(path = %path.display(), rows = events.len(), "loaded event log");
    Ok(EventTable::new(events))
}

fn open_error(path: &Path, source: io::Error) -> DataLoadError {
    if source.kind() == io::ErrorKind::NotFound {
        DataLoadError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        DataLoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn parse_record(record: &StringRecord, line: u64) -> Result<EventRecord, DataLoadError> {
    if record.len() != COLUMN_COUNT {
        return Err(DataLoadError::ColumnCount {
            line,
            found: record.len(),
        });
    }

    let user_id = parse_int(&record[0], "user_id", line)?;
    let item_id = parse_int(&record[1], "item_id", line)?;
    let category_id = parse_int(&record[2], "category_id", line)?;
    let timestamp = parse_int(&record[4], "timestamp", line)?;
    let datetime = DateTime::from_timestamp(timestamp, 0)
        .ok_or(DataLoadError::TimestampOutOfRange {
            line,
            value: timestamp,
        })?
        .naive_utc();

    Ok(EventRecord {
        user_id,
        item_id,
        category_id,
        behavior_type: record[3].to_string(),
        timestamp,
        datetime,
    })
}

fn parse_int(value: &str, column: &'static str, line: u64) -> Result<i64, DataLoadError> {
    value.parse().map_err(|_| {
        debug!(line, column, value, "rejecting non-integer field");
        DataLoadError::InvalidInteger {
            line,
            column,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn load_parses_rows_and_derives_datetime() {
        let file = write_csv("1,10,100,pv,1511577600\n2,11,101,buy,1511600000\n");
        let table = load_events(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.events[0];
        assert_eq!(first.user_id, 1);
        assert_eq!(first.item_id, 10);
        assert_eq!(first.category_id, 100);
        assert_eq!(first.behavior_type, "pv");
        assert_eq!(first.date(), NaiveDate::from_ymd_opt(2017, 11, 25).unwrap());
        assert_eq!(first.hour(), 2);

        let second = &table.events[1];
        assert_eq!(second.datetime.hour(), 8);
        assert_eq!(second.datetime.minute(), 53);
    }

    #[test]
    fn load_keeps_unknown_behavior_types() {
        let file = write_csv("1,10,100,share,1511577600\n");
        let table = load_events(file.path()).unwrap();
        assert_eq!(table.events[0].behavior_type, "share");
    }

    #[test]
    fn load_trims_whitespace_around_fields() {
        let file = write_csv(" 7 , 8 , 9 , cart , 1511577600 \n");
        let table = load_events(file.path()).unwrap();
        assert_eq!(table.events[0].user_id, 7);
        assert_eq!(table.events[0].behavior_type, "cart");
    }

    #[test]
    fn load_empty_file_yields_empty_table() {
        let file = write_csv("");
        let table = load_events(file.path()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_events(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::NotFound { .. }));
    }

    #[test]
    fn load_rejects_wrong_column_count() {
        let file = write_csv("1,10,100,pv,1511577600\n1,10,pv,1511577600\n");
        let err = load_events(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::ColumnCount { line: 2, found: 4 }));
    }

    #[test]
    fn load_rejects_non_integer_timestamp() {
        let file = write_csv("1,10,100,pv,yesterday\n");
        let err = load_events(file.path()).unwrap_err();
        match err {
            DataLoadError::InvalidInteger { line, column, value } => {
                assert_eq!(line, 1);
                assert_eq!(column, "timestamp");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_rejects_out_of_range_timestamp() {
        let file = write_csv(&format!("1,10,100,pv,{}\n", i64::MAX));
        let err = load_events(file.path()).unwrap_err();
        assert!(matches!(err, DataLoadError::TimestampOutOfRange { .. }));
    }
}
