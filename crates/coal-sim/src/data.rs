use std::collections::BTreeMap;
use std::path::Path;

use coal_core::errors::{CoalError, ErrorInfo};
use coal_model::DisasterData;
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CountRow {
    year: i64,
    count: u64,
}

/// Reads `year,count` rows and restricts them to the requested range.
///
/// Missing bounds default to the earliest and latest year in the file.
pub fn load_counts(path: &Path, start: Option<i64>, end: Option<i64>) -> Result<DisasterData, CoalError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|err| wrap_csv("data-open", err).with_context("path", path.display()))?;

    let mut counts = BTreeMap::new();
    for (line, row) in reader.deserialize::<CountRow>().enumerate() {
        let row = row.map_err(|err| {
            wrap_csv("data-parse", err)
                .with_context("path", path.display())
                .with_context("row", line + 1)
        })?;
        if counts.insert(row.year, row.count).is_some() {
            return Err(CoalError::Data(
                ErrorInfo::new("duplicate-year", "year appears more than once")
                    .with_context("path", path.display())
                    .with_context("year", row.year),
            ));
        }
    }

    let mut data = DisasterData::spanning(counts).ok_or_else(|| {
        CoalError::Data(ErrorInfo::new("empty-data", "no count rows found").with_context("path", path.display()))
    })?;
    if let Some(start) = start {
        data.start_year = start;
    }
    if let Some(end) = end {
        data.end_year = end;
    }
    debug!(start_year = data.start_year, end_year = data.end_year, rows = data.counts.len(), "loaded counts");
    data.validate()?;
    Ok(data)
}

fn wrap_csv(code: &str, err: csv::Error) -> CoalError {
    CoalError::Data(ErrorInfo::new(code, "failed to read count CSV").with_hint(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn bounds_default_to_the_file_range() {
        let file = csv_file("year,count\n1851,4\n1852, 5\n1853,4\n");
        let data = load_counts(file.path(), None, None).unwrap();
        assert_eq!((data.start_year, data.end_year), (1851, 1853));
        assert_eq!(data.counts.get(&1852), Some(&5));
    }

    #[test]
    fn explicit_bounds_narrow_the_range() {
        let file = csv_file("year,count\n1851,4\n1852,5\n1853,4\n");
        let data = load_counts(file.path(), Some(1852), Some(1852)).unwrap();
        assert_eq!(data.years().collect::<Vec<_>>(), vec![(1852, 5)]);
    }

    #[test]
    fn gaps_inside_the_range_are_rejected() {
        let file = csv_file("year,count\n1851,4\n1853,4\n");
        let err = load_counts(file.path(), None, None).unwrap_err();
        assert_eq!(err.code(), "missing-year");
    }

    #[test]
    fn malformed_rows_report_their_position() {
        let file = csv_file("year,count\n1851,4\n1852,-1\n");
        match load_counts(file.path(), None, None).unwrap_err() {
            CoalError::Data(info) => {
                assert_eq!(info.code, "data-parse");
                assert_eq!(info.context.get("row").map(String::as_str), Some("2"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn duplicate_years_and_empty_files_are_rejected() {
        let file = csv_file("year,count\n1851,4\n1851,5\n");
        assert_eq!(load_counts(file.path(), None, None).unwrap_err().code(), "duplicate-year");
        let file = csv_file("year,count\n");
        assert_eq!(load_counts(file.path(), None, None).unwrap_err().code(), "empty-data");
    }
}
