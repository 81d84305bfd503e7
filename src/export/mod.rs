use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::{BackupConfig, ExportSettings};
use crate::output::types::Meta;
use crate::source::{HttpSource, HttpSourceConfig};
use crate::store::{S3Store, S3StoreConfig};
use crate::telemetry::{self};

pub mod digest;
pub mod naming;
pub mod pipeline;
pub mod types;

use naming::KeyNaming;
use pipeline::{ExportOptions, ExportPipeline};
use types::{ExportPlan, RunSummary, TargetSample};

/// Periodic run: one timestamp per object, no digest unless asked. Exports
/// unless `--plan` is given.
#[derive(Args, Debug)]
pub struct ScheduledCmd {
    /// Send a Content-MD5 digest with every object
    #[arg(long, default_value_t = false)] pub checksum: bool,
    /// Only print what would be exported
    #[arg(long, default_value_t = false)] pub plan: bool,
}

/// Manual run: all objects under `<prefix>-<run start>/`, digest on.
#[derive(Args, Debug)]
pub struct ManualCmd {
    /// Key prefix; defaults to $PREFIX, then "manual"
    #[arg(long)] pub prefix: Option<String>,
    #[arg(long, default_value_t = false)] pub no_checksum: bool,
    #[arg(long, default_value_t = false)] pub apply: bool,
}

pub async fn scheduled(cfg: &BackupConfig, settings: &ExportSettings, args: ScheduledCmd, cancel: &CancellationToken) -> Result<bool> {
    let opts = options(cfg, settings, KeyNaming::PerItem, args.checksum);
    execute(cfg, settings, "scheduled", opts, !args.plan, cancel).await
}

pub async fn manual(cfg: &BackupConfig, settings: &ExportSettings, args: ManualCmd, cancel: &CancellationToken) -> Result<bool> {
    let naming = KeyNaming::per_run(args.prefix.or_else(|| settings.prefix.clone()));
    let opts = options(cfg, settings, naming, !args.no_checksum);
    execute(cfg, settings, "manual", opts, args.apply, cancel).await
}

fn options(cfg: &BackupConfig, settings: &ExportSettings, naming: KeyNaming, compute_checksum: bool) -> ExportOptions {
    ExportOptions {
        naming,
        compute_checksum,
        request_timeout: settings.request_timeout,
        store_timeout: settings.store_timeout,
        bucket: cfg.bucket.clone(),
    }
}

fn build_plan(cfg: &BackupConfig, opts: &ExportOptions, mode: &'static str, run_started: DateTime<Utc>) -> ExportPlan {
    ExportPlan {
        mode,
        bucket: opts.bucket.clone(),
        key_pattern: opts.naming.describe(run_started),
        checksum: opts.compute_checksum,
        request_timeout_secs: opts.request_timeout.as_secs(),
        store_timeout_secs: opts.store_timeout.as_secs(),
        targets: cfg.targets.iter().map(TargetSample::from).collect(),
    }
}

fn plan_lines(plan: &ExportPlan) -> Vec<String> {
    let mut lines = vec![format!("📝 Export plan — mode={} targets={} bucket={} keys={} checksum={}",
        plan.mode, plan.targets.len(), plan.bucket, plan.key_pattern, plan.checksum)];
    lines.extend(plan.targets.iter().map(|t| format!("  name={} url={} comment={:?}", t.name, t.url, t.comment)));
    lines
}

async fn execute(
    cfg: &BackupConfig,
    settings: &ExportSettings,
    mode: &'static str,
    opts: ExportOptions,
    apply: bool,
    cancel: &CancellationToken,
) -> Result<bool> {
    let log = telemetry::export();
    let root = log.root_span_kv([
        ("mode", mode.to_string()),
        ("apply", apply.to_string()),
        ("bucket", opts.bucket.clone()),
        ("targets", cfg.targets.len().to_string()),
        ("checksum", opts.compute_checksum.to_string()),
    ]);

    if !apply {
        let _g = root.enter();
        let plan = build_plan(cfg, &opts, mode, Utc::now());
        if telemetry::config::json_mode() {
            log.plan(&plan)?;
        } else {
            for line in plan_lines(&plan) { log.info(line); }
        }
        log.warn("⚠️  Plan only, nothing was exported. Use --apply (manual) or drop --plan (scheduled) to execute.");
        return Ok(true);
    }

    let source = HttpSource::new(HttpSourceConfig { strict_tls: settings.strict_tls })
        .context("building http client")?;
    let store = S3Store::connect(&S3StoreConfig {
        region: cfg.region.clone(),
        endpoint: cfg.endpoint.clone(),
        force_path_style: cfg.force_path_style,
    })
    .await;

    let summary: RunSummary = ExportPipeline::new(&source, &store)
        .run(&cfg.targets, &opts, cancel)
        .instrument(root)
        .await;
    for (target, err) in summary.failures() {
        log.warn(format!("   -> failed {} at {}: {}", target.name, err.stage(), err.reason()));
    }

    if telemetry::config::json_mode() {
        log.result(&summary.report(), Some(Meta::for_run(summary.started_at, Utc::now())))?;
    }
    Ok(summary.is_success())
}
