//! Report state management.
//!
//! Holds the selected report kind and the fetched records, and applies fetch
//! and download outcomes. Every fetch is tagged with a request id; only the
//! most recently issued request may update the state.

use crate::data::{
    export, pivot, table, ChartSeries, CsvMode, ExportFormat, HuePicker, PivotOptions,
    RecordSet, ReportError, ReportKind, ReportSource, SaveTarget, SavedFile, Table,
};

/// Monotonically increasing id of an issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Handed out when a fetch begins; returned with its outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub id: RequestId,
    pub kind: ReportKind,
}

/// What the report view currently shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReportState {
    /// No data and no error
    #[default]
    Idle,
    Loading,
    Ready(RecordSet),
    /// `records` is kept when a download fails after data was shown
    Failed {
        message: String,
        records: Option<RecordSet>,
    },
}

/// A download prepared from the held records, runnable off the UI thread
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub kind: ReportKind,
    pub format: ExportFormat,
    pub csv_mode: CsvMode,
    records: RecordSet,
    revision: u64,
}

impl ExportJob {
    /// Whether running the job waits on the report source
    pub fn needs_fetch(&self) -> bool {
        self.format == ExportFormat::Csv && self.csv_mode == CsvMode::Remote
    }

    pub fn run(
        &self,
        source: &dyn ReportSource,
        target: &dyn SaveTarget,
    ) -> Result<SavedFile, ReportError> {
        export::export(
            &self.records,
            self.kind,
            self.format,
            self.csv_mode,
            source,
            target,
        )
    }
}

/// Single source of truth for the report view
#[derive(Debug)]
pub struct ReportController {
    kind: ReportKind,
    state: ReportState,
    next_request: u64,
    pending: Option<RequestId>,
    /// Bumped whenever the kind or the held records change
    revision: u64,
    last_saved: Option<SavedFile>,
    /// Set while a download is running; further downloads are refused
    exporting: bool,
}

impl ReportController {
    pub fn new(kind: ReportKind) -> Self {
        ReportController {
            kind,
            state: ReportState::Idle,
            next_request: 0,
            pending: None,
            revision: 0,
            last_saved: None,
            exporting: false,
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    /// Records currently on screen, if any
    pub fn records(&self) -> Option<&RecordSet> {
        match &self.state {
            ReportState::Ready(records) => Some(records),
            ReportState::Failed { records, .. } => records.as_ref(),
            ReportState::Idle | ReportState::Loading => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ReportState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == ReportState::Loading
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_saved(&self) -> Option<&SavedFile> {
        self.last_saved.as_ref()
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Switch report kind, discarding held data, errors, and any in-flight fetch
    pub fn select_kind(&mut self, kind: ReportKind) {
        log::info!("Report kind {} -> {}", self.kind, kind);
        self.kind = kind;
        self.state = ReportState::Idle;
        self.pending = None;
        self.last_saved = None;
        self.revision += 1;
    }

    /// Start a fetch for the current kind. Prior data and errors are cleared.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.next_request += 1;
        let id = RequestId(self.next_request);
        if let Some(previous) = self.pending.replace(id) {
            log::debug!("Fetch {previous:?} superseded by {id:?}");
        }
        self.state = ReportState::Loading;
        self.last_saved = None;
        self.revision += 1;
        log::info!("Fetching {} ({id:?})", self.kind);
        FetchTicket { id, kind: self.kind }
    }

    /// Apply a fetch outcome. Returns false if the ticket is stale and the
    /// outcome was discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<RecordSet, ReportError>,
    ) -> bool {
        if self.pending != Some(ticket.id) || ticket.kind != self.kind {
            log::debug!("Discarding stale fetch result {:?}", ticket.id);
            return false;
        }
        self.pending = None;
        self.state = match result {
            Ok(records) => {
                log::info!("Loaded {} records for {}", records.len(), self.kind);
                ReportState::Ready(records)
            }
            Err(e) => {
                log::error!("Fetching {} failed: {e}", self.kind);
                ReportState::Failed {
                    message: e.to_string(),
                    records: None,
                }
            }
        };
        self.revision += 1;
        true
    }

    /// Fetch synchronously. Used by the headless export command.
    pub fn fetch(&mut self, source: &dyn ReportSource) -> bool {
        let ticket = self.begin_fetch();
        let result = source.fetch_records(ticket.kind);
        self.complete_fetch(ticket, result)
    }

    /// Chart series for the held records, if the kind can be charted
    pub fn chart(&self, options: &PivotOptions, hues: &mut dyn HuePicker) -> Option<ChartSeries> {
        pivot::pivot(self.records()?, self.kind, options, hues)
    }

    /// Table for the held records
    pub fn table(&self) -> Option<Table> {
        table::project(self.records()?)
    }

    /// Prepare a download of the held records and mark it in flight.
    /// `None` if nothing is held or a download is already running.
    pub fn begin_export(&mut self, format: ExportFormat, csv_mode: CsvMode) -> Option<ExportJob> {
        if self.exporting {
            log::debug!("Download of {} already running", self.kind);
            return None;
        }
        let records = self.records()?;
        let job = ExportJob {
            kind: self.kind,
            format,
            csv_mode,
            records: records.clone(),
            revision: self.revision,
        };
        self.exporting = true;
        Some(job)
    }

    /// Apply a download outcome. A failure keeps the held records visible.
    /// Returns false if the kind or records changed while the job ran.
    pub fn complete_export(
        &mut self,
        job: &ExportJob,
        result: Result<SavedFile, ReportError>,
    ) -> bool {
        self.exporting = false;
        if job.revision != self.revision {
            match result {
                Ok(saved) => log::info!("Saved {:?} after the report changed", saved.path),
                Err(e) => log::warn!("Ignoring failure of a superseded download: {e}"),
            }
            return false;
        }

        let held = match std::mem::take(&mut self.state) {
            ReportState::Ready(records) => Some(records),
            ReportState::Failed { records, .. } => records,
            other => {
                self.state = other;
                return false;
            }
        };

        match result {
            Ok(saved) => {
                log::info!("Downloaded {} to {:?}", saved.filename, saved.path);
                self.last_saved = Some(saved);
                self.state = match held {
                    Some(records) => ReportState::Ready(records),
                    None => ReportState::Idle,
                };
            }
            Err(e) => {
                log::error!("Download of {} failed: {e}", job.kind);
                self.state = ReportState::Failed {
                    message: e.to_string(),
                    records: held,
                };
            }
        }
        true
    }

    /// Download synchronously. Returns the saved file on success.
    pub fn export(
        &mut self,
        format: ExportFormat,
        csv_mode: CsvMode,
        source: &dyn ReportSource,
        target: &dyn SaveTarget,
    ) -> Option<SavedFile> {
        let Some(job) = self.begin_export(format, csv_mode) else {
            log::warn!("Nothing to download for {}", self.kind);
            return None;
        };
        let result = job.run(source, target);
        let saved = result.as_ref().ok().cloned();
        self.complete_export(&job, result);
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DirectoryTarget;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    /// In-process report source with canned responses
    struct FakeSource {
        records: Result<serde_json::Value, u16>,
        csv: Result<&'static str, u16>,
    }

    impl FakeSource {
        fn ok(records: serde_json::Value) -> Self {
            FakeSource {
                records: Ok(records),
                csv: Ok("club_name,total_checkins\nA,5\n"),
            }
        }
    }

    impl ReportSource for FakeSource {
        fn fetch_records(&self, _kind: ReportKind) -> Result<RecordSet, ReportError> {
            match &self.records {
                Ok(value) => Ok(serde_json::from_value(value.clone())?),
                Err(status) => Err(ReportError::Http { status: *status }),
            }
        }

        fn fetch_csv(&self, _kind: ReportKind) -> Result<Vec<u8>, ReportError> {
            self.csv
                .map(|b| b.as_bytes().to_vec())
                .map_err(|status| ReportError::Http { status })
        }
    }

    fn activity() -> serde_json::Value {
        json!([
            {"club_name": "A", "month_year": "2024-01", "total_checkins": 5},
            {"club_name": "B", "month_year": "2024-02", "total_checkins": 3}
        ])
    }

    fn records(value: serde_json::Value) -> RecordSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let controller = ReportController::new(ReportKind::Activity);
        assert_eq!(controller.state(), &ReportState::Idle);
        assert!(controller.records().is_none());
        assert!(controller.error().is_none());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_fetch_success_becomes_ready() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let ticket = controller.begin_fetch();
        assert!(controller.is_loading());

        assert!(controller.complete_fetch(ticket, Ok(records(activity()))));
        assert_eq!(controller.records().unwrap().len(), 2);
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_http_500_becomes_failed_with_status() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let source = FakeSource {
            records: Err(500),
            csv: Err(500),
        };
        assert!(controller.fetch(&source));

        assert!(controller.error().unwrap().contains("500"));
        assert!(controller.records().is_none());
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_select_kind_discards_data_and_error() {
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&FakeSource::ok(activity()));
        assert!(controller.records().is_some());

        controller.select_kind(ReportKind::PopularExercises);
        assert_eq!(controller.state(), &ReportState::Idle);
        assert_eq!(controller.kind(), ReportKind::PopularExercises);
        assert!(controller.records().is_none());

        controller.fetch(&FakeSource {
            records: Err(404),
            csv: Err(404),
        });
        assert!(controller.error().is_some());
        controller.select_kind(ReportKind::Activity);
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_new_fetch_clears_prior_state() {
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&FakeSource::ok(activity()));
        controller.begin_fetch();
        assert!(controller.records().is_none());
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_last_issued_fetch_wins() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let first = controller.begin_fetch();
        let second = controller.begin_fetch();

        assert!(controller.complete_fetch(second, Ok(records(activity()))));
        // The older response resolves last and is discarded
        assert!(!controller.complete_fetch(first, Err(ReportError::Http { status: 502 })));
        assert_eq!(controller.records().unwrap().len(), 2);
        assert!(controller.error().is_none());
    }

    #[test]
    fn test_fetch_outcome_after_kind_change_is_discarded() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let ticket = controller.begin_fetch();
        controller.select_kind(ReportKind::PopularExercises);

        assert!(!controller.complete_fetch(ticket, Ok(records(activity()))));
        assert_eq!(controller.state(), &ReportState::Idle);
    }

    #[test]
    fn test_revision_tracks_record_and_kind_changes() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let r0 = controller.revision();
        controller.fetch(&FakeSource::ok(activity()));
        let r1 = controller.revision();
        assert!(r1 > r0);
        controller.select_kind(ReportKind::PopularExercises);
        assert!(controller.revision() > r1);
    }

    #[test]
    fn test_chart_and_table_derive_from_held_records() {
        let mut controller = ReportController::new(ReportKind::Activity);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(controller.chart(&PivotOptions::default(), &mut rng).is_none());
        assert!(controller.table().is_none());

        controller.fetch(&FakeSource::ok(activity()));
        let chart = controller.chart(&PivotOptions::default(), &mut rng).unwrap();
        assert_eq!(chart.categories, ["A", "B"]);
        assert_eq!(controller.table().unwrap().rows.len(), 2);
    }

    #[test]
    fn test_popular_exercises_has_table_but_no_chart() {
        let mut controller = ReportController::new(ReportKind::PopularExercises);
        controller.fetch(&FakeSource::ok(json!([
            {"club_id": 1, "club_name": "A", "exercise_id": 4, "name": "Deadlift", "usage_count": 9}
        ])));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(controller.chart(&PivotOptions::default(), &mut rng).is_none());
        let table = controller.table().unwrap();
        assert_eq!(table.headers().next(), Some("club id"));
    }

    #[test]
    fn test_json_export_keeps_ready() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().to_path_buf());
        let source = FakeSource::ok(activity());
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&source);

        let saved = controller
            .export(ExportFormat::Json, CsvMode::Remote, &source, &target)
            .unwrap();
        assert_eq!(saved.filename, "activity.json");
        assert!(matches!(controller.state(), ReportState::Ready(_)));
        assert_eq!(controller.last_saved(), Some(&saved));

        let bytes = std::fs::read(&saved.path).unwrap();
        let parsed: RecordSet = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(Some(&parsed), controller.records());
    }

    #[test]
    fn test_failed_csv_export_keeps_records_visible() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().to_path_buf());
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&FakeSource::ok(activity()));

        let failing = FakeSource {
            records: Ok(activity()),
            csv: Err(500),
        };
        let saved = controller.export(ExportFormat::Csv, CsvMode::Remote, &failing, &target);
        assert!(saved.is_none());
        assert!(controller.error().unwrap().contains("500"));
        assert_eq!(controller.records().unwrap().len(), 2);

        // A later successful download clears the error
        let ok = FakeSource::ok(activity());
        assert!(controller
            .export(ExportFormat::Csv, CsvMode::Remote, &ok, &target)
            .is_some());
        assert!(matches!(controller.state(), ReportState::Ready(_)));
    }

    #[test]
    fn test_export_without_records_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = DirectoryTarget::new(dir.path().to_path_buf());
        let mut controller = ReportController::new(ReportKind::Activity);
        let source = FakeSource::ok(activity());
        assert!(controller
            .export(ExportFormat::Json, CsvMode::Remote, &source, &target)
            .is_none());
        assert_eq!(controller.state(), &ReportState::Idle);
    }

    #[test]
    fn test_export_result_after_kind_change_is_discarded() {
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&FakeSource::ok(activity()));
        let job = controller.begin_export(ExportFormat::Csv, CsvMode::Remote).unwrap();
        assert!(job.needs_fetch());

        controller.select_kind(ReportKind::PopularExercises);
        assert!(!controller.complete_export(&job, Err(ReportError::Http { status: 500 })));
        assert!(controller.error().is_none());
        assert!(!controller.is_exporting());
    }

    #[test]
    fn test_one_download_at_a_time() {
        let mut controller = ReportController::new(ReportKind::Activity);
        controller.fetch(&FakeSource::ok(activity()));

        let job = controller.begin_export(ExportFormat::Csv, CsvMode::Remote).unwrap();
        assert!(controller.is_exporting());
        assert!(controller.begin_export(ExportFormat::Csv, CsvMode::Remote).is_none());
        assert!(controller.begin_export(ExportFormat::Json, CsvMode::Remote).is_none());

        let saved = SavedFile {
            filename: "activity.csv".to_string(),
            path: "activity.csv".into(),
            bytes: 10,
        };
        assert!(controller.complete_export(&job, Ok(saved)));
        assert!(!controller.is_exporting());
        assert!(controller.begin_export(ExportFormat::Json, CsvMode::Remote).is_some());
    }
}
