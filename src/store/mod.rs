//! Storage side of an export: one PUT per payload into an S3 bucket.

use async_trait::async_trait;
use bytes::Bytes;

#[cfg(test)]
pub mod mock;
mod s3;

pub use s3::{S3Store, S3StoreConfig};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const SSE_AES256: &str = "AES256";
pub const ACL_PRIVATE: &str = "private";

#[derive(Clone, Debug, PartialEq)]
pub struct PutRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub content_type: &'static str,
    pub server_side_encryption: &'static str,
    pub acl: &'static str,
    /// Base64 MD5 of `body`; the store rejects the write on mismatch.
    pub content_md5: Option<String>,
}

impl PutRequest {
    /// JSON payload, encrypted at rest, private.
    pub fn json(bucket: &str, key: &str, body: Bytes, content_md5: Option<String>) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: CONTENT_TYPE_JSON,
            server_side_encryption: SSE_AES256,
            acl: ACL_PRIVATE,
            content_md5,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutAck {
    pub etag: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, req: PutRequest) -> Result<PutAck, StoreError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Timeout,
    DigestMismatch { message: String },
    Auth { code: String, message: String },
    Capacity { code: String, message: String },
    Service { code: String, message: String },
    Transport(String),
}

impl StoreError {
    /// Classify an S3 error code.
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            "BadDigest" | "InvalidDigest" => StoreError::DigestMismatch { message },
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
            | "InvalidToken" | "AllAccessDisabled" => StoreError::Auth { code: code.to_string(), message },
            "EntityTooLarge" | "SlowDown" | "ServiceUnavailable" | "QuotaExceeded" => {
                StoreError::Capacity { code: code.to_string(), message }
            }
            _ => StoreError::Service { code: code.to_string(), message },
        }
    }

    /// Short machine-readable reason for reports.
    pub fn reason(&self) -> &'static str {
        match self {
            StoreError::Timeout => "timeout",
            StoreError::DigestMismatch { .. } => "digest_mismatch",
            StoreError::Auth { .. } => "auth",
            StoreError::Capacity { .. } => "capacity",
            StoreError::Service { .. } => "service",
            StoreError::Transport(_) => "transport",
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Timeout => write!(f, "put timed out"),
            StoreError::DigestMismatch { message } => write!(f, "content digest rejected: {message}"),
            StoreError::Auth { code, message } => write!(f, "not authorized ({code}): {message}"),
            StoreError::Capacity { code, message } => write!(f, "store over capacity ({code}): {message}"),
            StoreError::Service { code, message } => write!(f, "store error ({code}): {message}"),
            StoreError::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_s3_error_codes() {
        assert_eq!(StoreError::from_code("BadDigest", "x").reason(), "digest_mismatch");
        assert_eq!(StoreError::from_code("InvalidDigest", "x").reason(), "digest_mismatch");
        assert_eq!(StoreError::from_code("AccessDenied", "x").reason(), "auth");
        assert_eq!(StoreError::from_code("SlowDown", "x").reason(), "capacity");
        assert_eq!(StoreError::from_code("NoSuchBucket", "x").reason(), "service");
    }

    #[test]
    fn json_request_carries_fixed_headers() {
        let req = PutRequest::json("b", "k.json", Bytes::from_static(b"{}"), None);
        assert_eq!(req.content_type, "application/json");
        assert_eq!(req.server_side_encryption, "AES256");
        assert_eq!(req.acl, "private");
        assert!(req.content_md5.is_none());
    }
}
