use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use url::Url;

use crate::export::types::BackupTarget;
use crate::util::redact::redact_url;

pub const DEFAULT_CONFIG_PATH: &str = "config/backups.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10 * 60;

/// Destination and targets, read once before a run.
#[derive(Clone, Debug, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    pub targets: Vec<BackupTarget>,
}

impl BackupConfig {
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |k| std::env::var(k).ok())
    }

    /// Read the JSON file, then apply `BACKUP_BUCKET`, `AWS_REGION` and
    /// `BACKUP_S3_ENDPOINT` overrides.
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading backup config {}", path.display()))?;
        let mut cfg: BackupConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing backup config {}", path.display()))?;
        if let Some(bucket) = lookup("BACKUP_BUCKET") { cfg.bucket = bucket; }
        if let Some(region) = lookup("AWS_REGION") { cfg.region = Some(region); }
        if let Some(endpoint) = lookup("BACKUP_S3_ENDPOINT") { cfg.endpoint = Some(endpoint); }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() { bail!("no destination bucket configured (set \"bucket\" or BACKUP_BUCKET)"); }
        if self.targets.is_empty() { bail!("no backup targets configured"); }
        let mut seen = HashSet::new();
        for t in &self.targets {
            if t.name.trim().is_empty() { bail!("backup target with url {} has an empty name", redact_url(&t.url)); }
            if !seen.insert(t.name.as_str()) { bail!("duplicate backup target name: {}", t.name); }
            let url = Url::parse(&t.url).with_context(|| format!("invalid url for target {}", t.name))?;
            if !matches!(url.scheme(), "http" | "https") { bail!("target {} must use http or https, got {}", t.name, url.scheme()); }
        }
        Ok(())
    }
}

/// Run tunables from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportSettings {
    pub request_timeout: Duration,
    pub store_timeout: Duration,
    pub strict_tls: bool,
    /// Key prefix for manual runs (`PREFIX`).
    pub prefix: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            strict_tls: true,
            prefix: None,
        }
    }
}

impl ExportSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(secs) = lookup("BACKUP_REQUEST_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = lookup("BACKUP_STORE_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
            cfg.store_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("BACKUP_STRICT_TLS") {
            cfg.strict_tls = !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        cfg.prefix = lookup("PREFIX").filter(|p| !p.trim().is_empty());
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("couch-backup-{}-{}.json", name, std::process::id()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    const VALID: &str = r#"{
        "bucket": "db-backups",
        "region": "eu-west-1",
        "targets": [
            { "name": "orders", "url": "https://couch.internal/orders", "comment": "prod" },
            { "name": "users", "url": "http://couch.internal:5984/users" }
        ]
    }"#;

    #[test]
    fn loads_targets_in_order() {
        let path = write_config("valid", VALID);
        let cfg = BackupConfig::load_with(&path, |_| None).unwrap();
        assert_eq!(cfg.bucket, "db-backups");
        assert_eq!(cfg.region.as_deref(), Some("eu-west-1"));
        let names: Vec<_> = cfg.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["orders", "users"]);
        assert_eq!(cfg.targets[0].comment.as_deref(), Some("prod"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn env_overrides_destination() {
        let path = write_config("override", VALID);
        let cfg = BackupConfig::load_with(&path, |k| match k {
            "BACKUP_BUCKET" => Some("other".into()),
            "BACKUP_S3_ENDPOINT" => Some("http://minio:9000".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.bucket, "other");
        assert_eq!(cfg.endpoint.as_deref(), Some("http://minio:9000"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rejects_duplicate_names() {
        let path = write_config("dup", r#"{"bucket":"b","targets":[
            {"name":"a","url":"http://x/a"},{"name":"a","url":"http://x/b"}]}"#);
        let err = BackupConfig::load_with(&path, |_| None).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{err}");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rejects_missing_bucket_and_bad_urls() {
        let path = write_config("nobucket", r#"{"targets":[{"name":"a","url":"http://x/a"}]}"#);
        assert!(BackupConfig::load_with(&path, |_| None).is_err());
        let _ = std::fs::remove_file(path);

        let path = write_config("badurl", r#"{"bucket":"b","targets":[{"name":"a","url":"ftp://x/a"}]}"#);
        assert!(BackupConfig::load_with(&path, |_| None).is_err());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn validation_errors_hide_url_credentials() {
        let path = write_config("noname", r#"{"bucket":"b","targets":[{"name":" ","url":"https://admin:s3cret@x/a"}]}"#);
        let err = BackupConfig::load_with(&path, |_| None).unwrap_err();
        assert!(!format!("{err:#}").contains("s3cret"), "{err:#}");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = BackupConfig::load_with(Path::new("/nonexistent/backups.json"), |_| None).unwrap_err();
        assert!(err.to_string().contains("reading backup config"));
    }

    #[test]
    fn settings_defaults_and_overrides() {
        let s = ExportSettings::from_lookup(|_| None);
        assert_eq!(s, ExportSettings::default());
        assert_eq!(s.request_timeout, Duration::from_secs(1800));

        let s = ExportSettings::from_lookup(|k| match k {
            "BACKUP_REQUEST_TIMEOUT_SECS" => Some("60".into()),
            "BACKUP_STORE_TIMEOUT_SECS" => Some("junk".into()),
            "BACKUP_STRICT_TLS" => Some("false".into()),
            "PREFIX" => Some("weekly".into()),
            _ => None,
        });
        assert_eq!(s.request_timeout, Duration::from_secs(60));
        assert_eq!(s.store_timeout, Duration::from_secs(600));
        assert!(!s.strict_tls);
        assert_eq!(s.prefix.as_deref(), Some("weekly"));
    }
}
