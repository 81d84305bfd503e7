use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Export;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Target, Fetch, Digest, Store }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Target => "target",
        Phase::Fetch => "fetch",
        Phase::Digest => "digest",
        Phase::Store => "store",
    }}
    fn span(&self) -> Span { match self {
        Phase::Target => info_span!("target"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Digest => info_span!("digest"),
        Phase::Store => info_span!("store"),
    }}
}

impl OpMarker for Export {
    const NAME: &'static str = "export";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("export") }
}
