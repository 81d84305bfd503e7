pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

// Factory helpers, one typed context per command
pub fn export() -> LogCtx<ops::export::Export> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn targets() -> LogCtx<ops::targets::Targets> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
