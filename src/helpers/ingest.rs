use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use object_store::path::Path;
use thiserror::Error;

use crate::helpers::azure_storage::DataLake;
use crate::helpers::device_report::{ContentEncoding, DeviceReport};
use crate::helpers::report_time::ReportTime;
use crate::helpers::target_path::TargetPath;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("request body is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("device report must be a JSON object")]
    NotAnObject,

    #[error("device report lacks payload.iotnode.name or payload.iotnode.reportedAt: {0}")]
    MissingField(#[source] serde_json::Error),

    #[error("failed to serialize device report: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("storage operation failed: {0}")]
    Storage(#[from] object_store::Error),
}

/// One handled request. Helpers log through it so every line names its invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub id: u64,
}

impl Invocation {
    pub fn new(id: u64) -> Self {
        Invocation { id }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IngestSettings {
    pub timezone: Tz,
    pub encoding: ContentEncoding,
}

impl Default for IngestSettings {
    fn default() -> Self {
        IngestSettings {
            timezone: Tz::UTC,
            encoding: ContentEncoding::Utf8,
        }
    }
}

/// Shared by all requests. Only the counters are mutated, atomically.
pub struct Ingestor {
    lake: DataLake,
    settings: IngestSettings,
    invocations: AtomicU64,
    time_fallbacks: AtomicU64,
}

impl Ingestor {
    pub fn new(lake: DataLake, settings: IngestSettings) -> Self {
        Ingestor {
            lake,
            settings,
            invocations: AtomicU64::new(0),
            time_fallbacks: AtomicU64::new(0),
        }
    }

    pub fn start_invocation(&self) -> Invocation {
        Invocation::new(self.invocations.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Number of reports filed under the handling time because their own time did not parse.
    pub fn time_fallbacks(&self) -> u64 {
        self.time_fallbacks.load(Ordering::Relaxed)
    }

    /// Parses a posted body and files it in the data lake, returning the written path.
    pub async fn ingest(&self, invocation: &Invocation, body: &[u8]) -> Result<Path, IngestError> {
        let report = DeviceReport::parse(body)?;

        let report_time = ReportTime::resolve(report.reported_at(), self.settings.timezone, Utc::now());
        if let ReportTime::Fallback { now, raw } = &report_time {
            let total = self.time_fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "[{}] An error occurred while converting device payload time. {} (filed under {}, {} fallbacks so far)",
                invocation.id, raw, now, total
            );
        }

        send_data_to_data_lake(
            &self.lake,
            invocation,
            &report,
            report_time.local(),
            false,
            self.settings.encoding,
        )
        .await
    }
}

/// Writes the report to `TargetPath::derive(..)` as a new file.
pub async fn send_data_to_data_lake(
    lake: &DataLake,
    invocation: &Invocation,
    report: &DeviceReport,
    time: NaiveDateTime,
    error: bool,
    encoding: ContentEncoding,
) -> Result<Path, IngestError> {
    let target = TargetPath::derive(report.device_name(), time, error);
    let bytes = report.to_bytes(encoding)?;

    let directory = lake.ensure_directory(&target.directory)?;
    let file = lake.create_file(&directory, &target.file_name).await?;

    let mut stream = lake.open_for_write(&file, false).await?;
    stream.write(&bytes).await?;
    let written = stream.close().await?;

    info!("[{}] --- Wrote {} bytes to {}", invocation.id, written, file.path());
    Ok(file.path().clone())
}
