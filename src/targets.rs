use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::config::BackupConfig;
use crate::export::types::{BackupTarget, TargetSample};
use crate::telemetry::{self};
use crate::telemetry::ops::targets::Phase as TargetsPhase;

/// couch-backup targets
#[derive(Args, Debug)]
pub struct TargetsCmd {
    /// Only show targets whose name contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Serialize)]
struct TargetList<'a> {
    bucket: &'a str,
    targets: Vec<TargetSample>,
}

pub fn run(cfg: &BackupConfig, args: TargetsCmd) -> Result<()> {
    let log = telemetry::targets();
    let _g = log.root_span_kv([("filter", format!("{:?}", args.filter))]).entered();
    let _s = log.span(&TargetsPhase::Load).entered();

    let targets: Vec<TargetSample> = select(&cfg.targets, args.filter.as_deref())
        .into_iter()
        .map(TargetSample::from)
        .collect();
    if telemetry::config::json_mode() {
        log.result(&TargetList { bucket: &cfg.bucket, targets }, None)?;
        return Ok(());
    }
    log.info(format!("📚 {} target(s) -> s3://{}", targets.len(), cfg.bucket));
    for line in listing_lines(&targets) { log.info(line); }
    Ok(())
}

fn listing_lines(targets: &[TargetSample]) -> Vec<String> {
    targets
        .iter()
        .map(|t| match &t.comment {
            Some(c) => format!("  {} {} ({})", t.name, t.url, c),
            None => format!("  {} {}", t.name, t.url),
        })
        .collect()
}

fn select<'a>(targets: &'a [BackupTarget], filter: Option<&str>) -> Vec<&'a BackupTarget> {
    targets
        .iter()
        .filter(|t| filter.is_none_or(|f| t.name.contains(f)))
        .collect()
}
