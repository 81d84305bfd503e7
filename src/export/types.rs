use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::digest::ContentDigest;
use crate::source::FetchError;
use crate::store::StoreError;
use crate::util::redact::redact_url;

/// One configured database to export.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackupTarget {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug)]
pub enum ExportError {
    Fetch(FetchError),
    Store(StoreError),
}

impl ExportError {
    pub fn stage(&self) -> &'static str {
        match self {
            ExportError::Fetch(_) => "fetch",
            ExportError::Store(_) => "store",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ExportError::Fetch(e) => e.reason(),
            ExportError::Store(e) => e.reason(),
        }
    }
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Fetch(err) => write!(f, "fetch failed: {err}"),
            ExportError::Store(err) => write!(f, "store failed: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Fetch(err) => Some(err),
            ExportError::Store(err) => Some(err),
        }
    }
}

impl From<FetchError> for ExportError {
    fn from(err: FetchError) -> Self { ExportError::Fetch(err) }
}

impl From<StoreError> for ExportError {
    fn from(err: StoreError) -> Self { ExportError::Store(err) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stored {
    pub payload_size: usize,
    pub storage_key: String,
    pub checksum: Option<ContentDigest>,
    /// Store acknowledgment, kept for the audit trail only.
    pub etag: Option<String>,
}

#[derive(Debug)]
pub enum Outcome {
    Success(Stored),
    Failure(ExportError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus { Success, Failure }

/// Outcome of one target; created once, never mutated.
#[derive(Debug)]
pub struct ExportResult {
    pub target: BackupTarget,
    pub outcome: Outcome,
}

impl ExportResult {
    pub fn status(&self) -> ExportStatus {
        match self.outcome {
            Outcome::Success(_) => ExportStatus::Success,
            Outcome::Failure(_) => ExportStatus::Failure,
        }
    }

    pub fn stored(&self) -> Option<&Stored> {
        match &self.outcome {
            Outcome::Success(s) => Some(s),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ExportError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(e) => Some(e),
        }
    }
}

/// Aggregate of a run, folded one result at a time.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub results: Vec<ExportResult>,
    pub success_count: usize,
    pub failure_count: usize,
    /// Targets never started because the run was cancelled.
    pub not_attempted: usize,
    pub total_bytes: u64,
}

impl RunSummary {
    pub fn record(mut self, result: ExportResult) -> Self {
        match &result.outcome {
            Outcome::Success(s) => {
                self.success_count += 1;
                self.total_bytes += s.payload_size as u64;
            }
            Outcome::Failure(_) => self.failure_count += 1,
        }
        self.results.push(result);
        self
    }

    /// A run succeeds only if every target was attempted and stored.
    pub fn is_success(&self) -> bool {
        self.failure_count == 0 && self.not_attempted == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&BackupTarget, &ExportError)> {
        self.results.iter().filter_map(|r| r.error().map(|e| (&r.target, e)))
    }

    pub fn report(&self) -> ExportReport {
        ExportReport {
            success: self.is_success(),
            success_count: self.success_count,
            failure_count: self.failure_count,
            not_attempted: self.not_attempted,
            total_bytes: self.total_bytes,
            results: self.results.iter().map(TargetReport::from).collect(),
        }
    }
}

// Plan envelope types
#[derive(Serialize)]
pub struct TargetSample { pub name: String, pub url: String, pub comment: Option<String> }

// Only redacted urls leave the process.
impl From<&BackupTarget> for TargetSample {
    fn from(t: &BackupTarget) -> Self {
        TargetSample { name: t.name.clone(), url: redact_url(&t.url), comment: t.comment.clone() }
    }
}

#[derive(Serialize)]
pub struct ExportPlan {
    pub mode: &'static str,
    pub bucket: String,
    pub key_pattern: String,
    pub checksum: bool,
    pub request_timeout_secs: u64,
    pub store_timeout_secs: u64,
    pub targets: Vec<TargetSample>,
}

// Apply/result envelope types
#[derive(Serialize)]
pub struct TargetReport {
    pub name: String,
    pub status: ExportStatus,
    #[serde(skip_serializing_if = "Option::is_none")] pub payload_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")] pub storage_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")] pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")] pub error: Option<String>,
}

impl From<&ExportResult> for TargetReport {
    fn from(r: &ExportResult) -> Self {
        let stored = r.stored();
        let err = r.error();
        TargetReport {
            name: r.target.name.clone(),
            status: r.status(),
            payload_size: stored.map(|s| s.payload_size),
            storage_key: stored.map(|s| s.storage_key.clone()),
            md5: stored.and_then(|s| s.checksum.as_ref().map(|c| c.hex.clone())),
            etag: stored.and_then(|s| s.etag.clone()),
            stage: err.map(|e| e.stage()),
            reason: err.map(|e| e.reason()),
            error: err.map(|e| e.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct ExportReport {
    pub success: bool,
    pub success_count: usize,
    pub failure_count: usize,
    pub not_attempted: usize,
    pub total_bytes: u64,
    pub results: Vec<TargetReport>,
}
