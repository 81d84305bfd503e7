use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::util::time::iso8601;

pub const SCHEMA_VERSION: &str = "couch-backup.v1";

/// Run bookkeeping attached to a result envelope.
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    /// Run start as ISO-8601; matches the per-run key prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl Meta {
    pub fn for_run(started: DateTime<Utc>, finished: DateTime<Utc>) -> Self {
        let elapsed = (finished - started).num_milliseconds().max(0) as u128;
        Meta { duration_ms: Some(elapsed), run_id: Some(iso8601(started)) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind { Plan, Result }

/// One stdout document per command: either a plan or a result, never both.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'static str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Envelope {
    pub fn plan<T: Serialize>(op: &'static str, plan: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::build(op, Kind::Plan, serde_json::to_value(plan)?, meta))
    }

    pub fn result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<Self, serde_json::Error> {
        Ok(Self::build(op, Kind::Result, serde_json::to_value(result)?, meta))
    }

    fn build(op: &'static str, kind: Kind, body: Value, meta: Option<Meta>) -> Self {
        let (plan, result) = match kind {
            Kind::Plan => (Some(body), None),
            Kind::Result => (None, Some(body)),
        };
        Envelope {
            schema_version: SCHEMA_VERSION,
            time: Utc::now(),
            request_id: Uuid::new_v4(),
            op,
            apply: kind == Kind::Result,
            plan,
            result,
            meta,
        }
    }
}
