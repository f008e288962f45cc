//! Pivot transform from flat report records to grouped chart series.
//!
//! Each report kind that can be charted registers one [`PivotStrategy`].
//! Kinds without a strategy still render as a table; only the chart is
//! omitted.

use std::collections::{BTreeSet, HashMap};

use clap::ValueEnum;
use rand::Rng;

use super::models::{
    display_value, ChartSeries, Record, RecordSet, ReportKind, Series, SeriesColor,
};

/// How to resolve several records for the same (category, series) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DuplicatePolicy {
    /// The record encountered last wins
    #[default]
    LastWins,
    /// The record encountered first wins
    FirstWins,
    /// Measures are added together
    Sum,
}

/// Options shared by all pivot strategies
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotOptions {
    pub duplicates: DuplicatePolicy,
}

/// Source of series hues in `[0, 360)`
pub trait HuePicker {
    fn next_hue(&mut self) -> u16;
}

impl<R: Rng> HuePicker for R {
    fn next_hue(&mut self) -> u16 {
        self.gen_range(0..360)
    }
}

/// Signature every pivot strategy shares
pub type PivotFn = fn(&RecordSet, &PivotOptions, &mut dyn HuePicker) -> Option<ChartSeries>;

/// A registered pivot for one report kind
#[derive(Clone, Copy)]
pub struct PivotStrategy {
    pub kind: ReportKind,
    pub pivot: PivotFn,
}

/// Registered strategies. Report kinds absent here have no chart.
const STRATEGIES: &[PivotStrategy] = &[PivotStrategy {
    kind: ReportKind::Activity,
    pivot: pivot_activity,
}];

/// Look up the pivot strategy for a report kind
pub fn strategy_for(kind: ReportKind) -> Option<&'static PivotStrategy> {
    STRATEGIES.iter().find(|s| s.kind == kind)
}

/// Whether a report kind can be charted
pub fn has_chart(kind: ReportKind) -> bool {
    strategy_for(kind).is_some()
}

/// Pivot `records` into chart series for `kind`.
///
/// Returns `None` for an empty record set or a kind without a strategy.
pub fn pivot(
    records: &RecordSet,
    kind: ReportKind,
    options: &PivotOptions,
    hues: &mut dyn HuePicker,
) -> Option<ChartSeries> {
    if records.is_empty() {
        return None;
    }
    let strategy = strategy_for(kind)?;
    (strategy.pivot)(records, options, hues)
}

/// Member activity: check-ins per club (x-axis), one series per month
fn pivot_activity(
    records: &RecordSet,
    options: &PivotOptions,
    hues: &mut dyn HuePicker,
) -> Option<ChartSeries> {
    GroupedPivot {
        title: "Total Member Check-ins by Club and Month",
        category_field: "club_name",
        series_field: "month_year",
        measure_field: "total_checkins",
    }
    .apply(records, options, hues)
}

/// Two categorical dimensions and one numeric measure read per record.
///
/// Dimension values are grouped by their display text, so the number `1`
/// and the string `"1"` land in the same category, as do a missing field and
/// the literal string `"undefined"`.
struct GroupedPivot {
    title: &'static str,
    category_field: &'static str,
    series_field: &'static str,
    measure_field: &'static str,
}

impl GroupedPivot {
    fn apply(
        &self,
        records: &RecordSet,
        options: &PivotOptions,
        hues: &mut dyn HuePicker,
    ) -> Option<ChartSeries> {
        if records.is_empty() {
            return None;
        }

        // Categories keep first-occurrence order
        let mut categories: Vec<String> = Vec::new();
        let mut category_index: HashMap<String, usize> = HashMap::new();
        // Series keys are sorted for a reproducible legend
        let mut series_keys: BTreeSet<String> = BTreeSet::new();
        let mut cells: HashMap<(String, usize), f64> = HashMap::new();

        for record in records {
            let category = display_value(record.get(self.category_field));
            let series_key = display_value(record.get(self.series_field));
            let measure = measure_of(record, self.measure_field);

            let idx = *category_index.entry(category.clone()).or_insert_with(|| {
                categories.push(category);
                categories.len() - 1
            });
            series_keys.insert(series_key.clone());

            let cell = (series_key, idx);
            match options.duplicates {
                DuplicatePolicy::LastWins => {
                    cells.insert(cell, measure);
                }
                DuplicatePolicy::FirstWins => {
                    cells.entry(cell).or_insert(measure);
                }
                DuplicatePolicy::Sum => {
                    *cells.entry(cell).or_insert(0.0) += measure;
                }
            }
        }

        let series = series_keys
            .into_iter()
            .map(|key| {
                let values = (0..categories.len())
                    .map(|idx| cells.get(&(key.clone(), idx)).copied().unwrap_or(0.0))
                    .collect();
                let color = SeriesColor::from_hue(hues.next_hue());
                log::debug!("Series {key} colored {color}");
                Series { key, color, values }
            })
            .collect();

        Some(ChartSeries {
            title: self.title.to_string(),
            categories,
            series,
        })
    }
}

/// Numeric measure of a record; anything non-numeric or non-finite counts as zero
fn measure_of(record: &Record, field: &str) -> f64 {
    let measure = match record.get(field) {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    measure.filter(|v| v.is_finite()).unwrap_or(0.0)
}
