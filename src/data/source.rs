//! Report source client.
//!
//! The report service exposes a single endpoint:
//! - `GET /api/export?type={kind}&format=json` returns a JSON array of flat records
//! - `GET /api/export?type={kind}&format=csv` returns raw CSV bytes

use std::io::Read;
use std::time::Duration;

use ureq::Agent;

use super::error::ReportError;
use super::models::{ExportFormat, RecordSet, ReportKind};

/// Anything that can serve reports. Shared with background fetch workers.
pub trait ReportSource: Send + Sync {
    /// Fetch the records of a report as JSON
    fn fetch_records(&self, kind: ReportKind) -> Result<RecordSet, ReportError>;

    /// Fetch the report as CSV bytes, unmodified
    fn fetch_csv(&self, kind: ReportKind) -> Result<Vec<u8>, ReportError>;
}

/// Blocking HTTP client for the report service
pub struct HttpReportSource {
    agent: Agent,
    base_url: String,
}

impl HttpReportSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpReportSource {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Export endpoint URL for a report kind and format
    pub fn export_url(&self, kind: ReportKind, format: ExportFormat) -> String {
        format!(
            "{}/api/export?type={}&format={}",
            self.base_url,
            kind.as_str(),
            format.extension()
        )
    }

    fn get(&self, kind: ReportKind, format: ExportFormat) -> Result<ureq::Response, ReportError> {
        let url = self.export_url(kind, format);
        log::debug!("GET {url}");
        let response = self.agent.get(&url).call().map_err(|e| {
            let err = ReportError::from(e);
            log::warn!("GET {url} failed: {err}");
            err
        })?;
        log::debug!("GET {url} -> {}", response.status());
        Ok(response)
    }
}

impl ReportSource for HttpReportSource {
    fn fetch_records(&self, kind: ReportKind) -> Result<RecordSet, ReportError> {
        let response = self.get(kind, ExportFormat::Json)?;
        let records: RecordSet = response
            .into_json()
            .map_err(|e| ReportError::Decode(e.to_string()))?;
        log::info!("Fetched {} records for {kind}", records.len());
        Ok(records)
    }

    fn fetch_csv(&self, kind: ReportKind) -> Result<Vec<u8>, ReportError> {
        let response = self.get(kind, ExportFormat::Csv)?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ReportError::Decode(e.to_string()))?;
        log::info!("Fetched {} CSV bytes for {kind}", bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_url() {
        let source = HttpReportSource::new("http://127.0.0.1:8000/", Duration::from_secs(5));
        assert_eq!(
            source.export_url(ReportKind::Activity, ExportFormat::Json),
            "http://127.0.0.1:8000/api/export?type=activity&format=json"
        );
        assert_eq!(
            source.export_url(ReportKind::PopularExercises, ExportFormat::Csv),
            "http://127.0.0.1:8000/api/export?type=popular-exercises&format=csv"
        );
    }

    #[test]
    fn test_unreachable_source_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine
        let source = HttpReportSource::new("http://127.0.0.1:9", Duration::from_secs(2));
        let err = source.fetch_records(ReportKind::Activity).unwrap_err();
        assert!(matches!(err, ReportError::Transport(_)));
    }
}
