use anyhow::Result;
use serde::Serialize;
use std::marker::PhantomData;
use tracing::{info, debug, warn, error, Span};

use crate::output::config::OutputConfig;
use crate::output::types::{Envelope, Meta};
use crate::output::Emitter;
use crate::util::size::human_bytes;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            debug!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            debug!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn error_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); error!(op = %self.op_name(), details = %details, "{}", msg); }
        else { error!("{}", msg); }
    }

    pub fn plan<T: Serialize>(&self, plan: &T) -> Result<()> {
        let env = Envelope::plan(self.op_name(), plan, None)?;
        emit(&env)
    }

    pub fn result<T: Serialize>(&self, result: &T, meta: Option<Meta>) -> Result<()> {
        let env = Envelope::result(self.op_name(), result, meta)?;
        emit(&env)
    }
}

fn emit(env: &Envelope) -> Result<()> {
    let emitter = Emitter::from_env(OutputConfig::from_env());
    emitter.emit(env).map_err(anyhow::Error::from)
}

// Export-specific helpers remain available on the typed context
impl LogCtx<crate::telemetry::ops::export::Export> {
    pub fn fetched(&self, name: &str, comment: Option<&str>, size: usize, at: &str) {
        let comment = comment.map(|c| format!(" ({c})")).unwrap_or_default();
        if self.json { info!(op = %self.op_name(), target_name = name, size, fetched_at = at, "fetched"); }
        else {
            info!("📥 dumped data for {}{}", name, comment);
            info!("   -> size is {}", human_bytes(size as u64));
            info!("   -> dump timestamp {}", at);
        }
    }

    pub fn stored(&self, name: &str, key: &str, etag: Option<&str>, at: &str) {
        let etag = etag.unwrap_or("-");
        if self.json { info!(op = %self.op_name(), target_name = name, key, etag, stored_at = at, "stored"); }
        else {
            info!("   -> s3 put timestamp {}", at);
            info!("   -> s3 key {}", key);
            info!("   -> s3 ETag {}", etag);
        }
    }

    pub fn totals(&self, ok: usize, failed: usize, not_attempted: usize, total_bytes: u64) {
        if self.json { info!(op = %self.op_name(), ok, failed, not_attempted, total_bytes, "export_totals"); }
        else {
            info!("📊 Backups completed:");
            info!("   -> OK {} items (total size: {})", ok, human_bytes(total_bytes));
            info!("   -> Failed {} items", failed);
            if not_attempted > 0 { info!("   -> Not attempted {} items", not_attempted); }
        }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
