//! Data models for fetched reports and their chart-ready projections.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One flat record from the report source. Key order follows the source.
pub type Record = serde_json::Map<String, Value>;

/// Rendered in place of a field the record does not carry
pub const ABSENT_CELL: &str = "undefined";

/// The full ordered collection of records for one fetched report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        RecordSet { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// The record whose keys define the inferred schema
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        RecordSet::new(records)
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Render a field value as display text.
///
/// Strings are shown verbatim, numbers in their shortest form, and
/// booleans/null as their literal names. A missing field renders as
/// [`ABSENT_CELL`].
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None => ABSENT_CELL.to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_else(|| n.to_string())
            }
        }
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Report kinds offered by the report source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum ReportKind {
    Activity,
    PopularExercises,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Activity, ReportKind::PopularExercises];

    /// Identifier used in query strings and filenames
    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Activity => "activity",
            ReportKind::PopularExercises => "popular-exercises",
        }
    }

    /// Human-readable label for selectors
    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Activity => "Member Activity Report",
            ReportKind::PopularExercises => "Popular Exercises Report",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown report kind: {s}"))
    }
}

/// Download formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ExportFormat::Json => ExportFormat::Csv,
            ExportFormat::Csv => ExportFormat::Json,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Fixed saturation (percent) for generated series colors
const SERIES_SATURATION: f64 = 70.0;
/// Fixed lightness (percent) for generated series colors
const SERIES_LIGHTNESS: f64 = 60.0;
/// Fixed alpha for generated series colors
const SERIES_ALPHA: f64 = 0.8;

/// HSLA color assigned to one chart series. Only the hue varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor {
    hue: u16,
}

impl SeriesColor {
    /// Hues wrap into `[0, 360)`
    pub fn from_hue(hue: u16) -> Self {
        SeriesColor { hue: hue % 360 }
    }

    #[allow(dead_code)] // Used in tests
    pub fn hue(&self) -> u16 {
        self.hue
    }

    /// Convert to 8-bit RGB, ignoring alpha
    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let s = SERIES_SATURATION / 100.0;
        let l = SERIES_LIGHTNESS / 100.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let h = f64::from(self.hue) / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u16 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }
}

impl fmt::Display for SeriesColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({}, {}%, {}%, {})",
            self.hue, SERIES_SATURATION, SERIES_LIGHTNESS, SERIES_ALPHA
        )
    }
}

/// One stacked/grouped data series, index-aligned with the chart categories
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub key: String,
    pub color: SeriesColor,
    pub values: Vec<f64>,
}

/// Chart-ready grouped series produced by a pivot
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSeries {
    #[allow(dead_code)] // Used in tests
    pub fn series_keys(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|s| s.key.as_str())
    }

    #[allow(dead_code)] // Used in tests
    pub fn find_series(&self, key: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.key == key)
    }
}
