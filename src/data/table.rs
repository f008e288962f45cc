//! Generic table projection for records of any schema.

use super::models::{display_value, RecordSet};

/// One table column: the record key and its display label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub label: String,
}

/// Records projected onto the columns of the first record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    /// Indexes of rows whose key set differs from the column set
    pub irregular_rows: Vec<usize>,
}

impl Table {
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.label.as_str())
    }
}

/// Replace underscores with spaces for display
pub fn humanize(key: &str) -> String {
    key.replace('_', " ")
}

/// Project records into a table.
///
/// Returns `None` when there is nothing to show. Columns come from the
/// first record; later records are read against those keys, so a missing
/// field renders as the absent-cell marker and extra fields are dropped.
pub fn project(records: &RecordSet) -> Option<Table> {
    let first = records.first()?;

    let columns: Vec<Column> = first
        .keys()
        .map(|key| Column {
            key: key.clone(),
            label: humanize(key),
        })
        .collect();

    let mut irregular_rows = Vec::new();
    let rows: Vec<Vec<String>> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let regular = record.len() == columns.len()
                && columns.iter().all(|c| record.contains_key(&c.key));
            if !regular {
                irregular_rows.push(idx);
            }
            columns
                .iter()
                .map(|c| display_value(record.get(&c.key)))
                .collect::<Vec<String>>()
        })
        .collect();

    if !irregular_rows.is_empty() {
        log::warn!(
            "{} of {} records do not match the columns of the first record: rows {:?}",
            irregular_rows.len(),
            records.len(),
            irregular_rows
        );
    }

    Some(Table {
        columns,
        rows,
        irregular_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::ABSENT_CELL;
    use serde_json::json;

    fn records(value: serde_json::Value) -> RecordSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_empty_records_have_no_table() {
        assert!(project(&RecordSet::default()).is_none());
    }

    #[test]
    fn test_headers_follow_first_record_key_order() {
        let data = records(json!([
            {"club_id": 1, "club_name": "Downtown", "month_year": "2024-01", "total_checkins": 12}
        ]));
        let table = project(&data).unwrap();
        assert_eq!(
            table.headers().collect::<Vec<_>>(),
            ["club id", "club name", "month year", "total checkins"]
        );
        assert_eq!(table.columns[0].key, "club_id");
        assert_eq!(table.rows, [["1", "Downtown", "2024-01", "12"]]);
        assert!(table.irregular_rows.is_empty());
    }

    #[test]
    fn test_rows_align_with_first_record_columns() {
        let data = records(json!([
            {"name": "Squat", "usage_count": 3, "active": true},
            {"usage_count": 5, "name": "Bench"},
            {"name": "Row", "usage_count": null, "active": false, "extra": "x"}
        ]));
        let table = project(&data).unwrap();

        for row in &table.rows {
            assert_eq!(row.len(), table.columns.len());
        }
        assert_eq!(table.rows[1], ["Bench", "5", ABSENT_CELL]);
        assert_eq!(table.rows[2], ["Row", "null", "false"]);
        assert_eq!(table.irregular_rows, [1, 2]);
    }

    #[test]
    fn test_table_renders_for_kinds_without_chart() {
        let data = records(json!([
            {"club_id": 1, "club_name": "A", "exercise_id": 9, "name": "Squat", "usage_count": 12}
        ]));
        let table = project(&data).unwrap();
        assert_eq!(table.columns.len(), 5);
        assert_eq!(table.rows.len(), 1);
    }
}
