use chrono::{DateTime, Utc};

use super::types::BackupTarget;
use crate::util::time::iso8601;

pub const DEFAULT_PREFIX: &str = "manual";

/// How storage keys are built for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyNaming {
    /// `<now at store time>/<name>.json`: every object gets its own timestamp.
    PerItem,
    /// `<prefix>-<run start>/<name>.json`: one shared folder per run.
    PerRun { prefix: String },
}

impl KeyNaming {
    pub fn per_run(prefix: Option<String>) -> Self {
        let prefix = prefix
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        KeyNaming::PerRun { prefix }
    }

    pub fn key_for(&self, target: &BackupTarget, run_started: DateTime<Utc>) -> String {
        self.key_at(target, run_started, Utc::now())
    }

    pub fn key_at(&self, target: &BackupTarget, run_started: DateTime<Utc>, now: DateTime<Utc>) -> String {
        match self {
            KeyNaming::PerItem => format!("{}/{}.json", iso8601(now), target.name),
            KeyNaming::PerRun { prefix } => format!("{}-{}/{}.json", prefix, iso8601(run_started), target.name),
        }
    }

    /// Human description for plans.
    pub fn describe(&self, run_started: DateTime<Utc>) -> String {
        match self {
            KeyNaming::PerItem => "<timestamp>/<name>.json".to_string(),
            KeyNaming::PerRun { prefix } => format!("{}-{}/<name>.json", prefix, iso8601(run_started)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn target(name: &str) -> BackupTarget {
        BackupTarget { name: name.into(), url: format!("http://couch/{name}"), comment: None }
    }

    fn key_prefix(key: &str) -> &str {
        &key[..key.rfind('/').unwrap()]
    }

    #[test]
    fn per_run_keys_share_a_prefix() {
        let naming = KeyNaming::per_run(None);
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();
        let a = naming.key_at(&target("alpha"), start, start + Duration::seconds(5));
        let b = naming.key_at(&target("beta"), start, start + Duration::minutes(7));
        assert_eq!(a, "manual-2024-05-01T03:00:00.000Z/alpha.json");
        assert_eq!(b, "manual-2024-05-01T03:00:00.000Z/beta.json");
        assert_eq!(key_prefix(&a), key_prefix(&b));
    }

    #[test]
    fn per_item_keys_use_store_time() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap();
        let a = KeyNaming::PerItem.key_at(&target("alpha"), start, start + Duration::milliseconds(1500));
        let b = KeyNaming::PerItem.key_at(&target("beta"), start, start + Duration::seconds(90));
        assert_eq!(a, "2024-05-01T03:00:01.500Z/alpha.json");
        assert_eq!(b, "2024-05-01T03:01:30.000Z/beta.json");
        assert_ne!(key_prefix(&a), key_prefix(&b));
    }

    #[test]
    fn custom_prefix_and_blank_fallback() {
        assert_eq!(KeyNaming::per_run(Some("nightly".into())), KeyNaming::PerRun { prefix: "nightly".into() });
        assert_eq!(KeyNaming::per_run(Some("  ".into())), KeyNaming::PerRun { prefix: "manual".into() });
    }

    #[test]
    fn key_for_ends_with_target_name() {
        let key = KeyNaming::PerItem.key_for(&target("orders"), Utc::now());
        assert!(key.ends_with("/orders.json"));
    }
}
