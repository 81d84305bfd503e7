use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::digest::ContentDigest;
use super::naming::KeyNaming;
use super::types::{BackupTarget, ExportError, ExportResult, Outcome, RunSummary, Stored};
use crate::source::{DocumentSource, FetchError};
use crate::store::{ObjectStore, PutRequest, StoreError};
use crate::telemetry::{self, ctx::LogCtx};
use crate::telemetry::ops::export::{Export, Phase as ExportPhase};
use crate::util::redact::redact_url;
use crate::util::time::iso8601;

#[derive(Clone, Debug)]
pub struct ExportOptions {
    pub naming: KeyNaming,
    pub compute_checksum: bool,
    pub request_timeout: Duration,
    pub store_timeout: Duration,
    pub bucket: String,
}

/// Drives targets through fetch, digest and store, strictly one at a time.
pub struct ExportPipeline<'a, S: ?Sized, O: ?Sized> {
    source: &'a S,
    store: &'a O,
    log: LogCtx<Export>,
}

impl<'a, S, O> ExportPipeline<'a, S, O>
where
    S: DocumentSource + ?Sized,
    O: ObjectStore + ?Sized,
{
    pub fn new(source: &'a S, store: &'a O) -> Self {
        Self { source, store, log: telemetry::export() }
    }

    pub async fn run(&self, targets: &[BackupTarget], opts: &ExportOptions, cancel: &CancellationToken) -> RunSummary {
        self.run_started_at(targets, opts, cancel, Utc::now()).await
    }

    /// Every attempted target yields exactly one result, in input order. Once
    /// `cancel` fires no new target starts; the rest count as not attempted.
    pub async fn run_started_at(
        &self,
        targets: &[BackupTarget],
        opts: &ExportOptions,
        cancel: &CancellationToken,
        run_started: DateTime<Utc>,
    ) -> RunSummary {
        let mut summary = RunSummary { started_at: run_started, ..RunSummary::default() };
        for (i, target) in targets.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.not_attempted = targets.len() - i;
                self.log.warn(format!("⏹️  Cancelled, {} target(s) not attempted", summary.not_attempted));
                break;
            }
            let span = self.log.span_kv(&ExportPhase::Target, [("name", target.name.clone()), ("url", redact_url(&target.url))]);
            let result = self.export_one(target, opts, run_started).instrument(span).await;
            summary = summary.record(result);
        }
        self.log.totals(summary.success_count, summary.failure_count, summary.not_attempted, summary.total_bytes);
        summary
    }

    async fn export_one(&self, target: &BackupTarget, opts: &ExportOptions, run_started: DateTime<Utc>) -> ExportResult {
        self.log.info(format!("🗄️  Backup for {}", target.name));
        let outcome = match self.fetch_and_store(target, opts, run_started).await {
            Ok(stored) => Outcome::Success(stored),
            Err(err) => {
                let msg = match &err {
                    ExportError::Fetch(_) => "❌ Cannot get data from database",
                    ExportError::Store(_) => "❌ Cannot store backup",
                };
                self.log.error_kv(
                    &format!("{} for {}: {}", msg, target.name, err),
                    [("target", target.name.clone()), ("stage", err.stage().to_string()), ("reason", err.reason().to_string())],
                );
                Outcome::Failure(err)
            }
        };
        ExportResult { target: target.clone(), outcome }
    }

    async fn fetch_and_store(&self, target: &BackupTarget, opts: &ExportOptions, run_started: DateTime<Utc>) -> Result<Stored, ExportError> {
        // the source's own timeout is not trusted
        let payload: Bytes = tokio::time::timeout(opts.request_timeout, self.source.fetch_all_docs(&target.url, opts.request_timeout))
            .instrument(self.log.span(&ExportPhase::Fetch))
            .await
            .unwrap_or(Err(FetchError::Timeout))?;
        let payload_size = payload.len();
        self.log.fetched(&target.name, target.comment.as_deref(), payload_size, &iso8601(Utc::now()));

        let checksum = if opts.compute_checksum {
            let _s = self.log.span(&ExportPhase::Digest).entered();
            let digest = ContentDigest::compute(&payload);
            self.log.info_kv(&format!("   -> content MD5 {}", digest.hex), [("md5", digest.hex.clone())]);
            Some(digest)
        } else {
            None
        };

        let storage_key = opts.naming.key_for(target, run_started);
        let req = PutRequest::json(&opts.bucket, &storage_key, payload, checksum.as_ref().map(|c| c.base64.clone()));
        let ack = tokio::time::timeout(opts.store_timeout, self.store.put_object(req))
            .instrument(self.log.span(&ExportPhase::Store))
            .await
            .unwrap_or(Err(StoreError::Timeout))?;
        self.log.stored(&target.name, &storage_key, ack.etag.as_deref(), &iso8601(Utc::now()));

        Ok(Stored { payload_size, storage_key, checksum, etag: ack.etag })
    }
}
