use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ObjectCannedAcl, ServerSideEncryption};
use aws_sdk_s3::Client;

use super::{ObjectStore, PutAck, PutRequest, StoreError};

#[derive(Clone, Debug, Default)]
pub struct S3StoreConfig {
    /// Falls back to the AWS provider chain (`AWS_REGION`, profile) when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores.
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

#[derive(Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Credentials come from the standard AWS provider chain. SDK retries are
    /// off: a failed put is a failed target.
    pub async fn connect(cfg: &S3StoreConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .retry_config(RetryConfig::disabled())
            .force_path_style(cfg.force_path_style);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self { client: Client::from_conf(builder.build()) }
    }

    #[cfg(test)]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(&self, req: PutRequest) -> Result<PutAck, StoreError> {
        let out = self
            .client
            .put_object()
            .bucket(req.bucket)
            .key(req.key)
            .body(ByteStream::from(req.body))
            .content_type(req.content_type)
            .server_side_encryption(ServerSideEncryption::from(req.server_side_encryption))
            .acl(ObjectCannedAcl::from(req.acl))
            .set_content_md5(req.content_md5)
            .send()
            .await
            .map_err(classify)?;

        Ok(PutAck { etag: out.e_tag().map(str::to_string) })
    }
}

fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::TimeoutError(_) => StoreError::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => StoreError::Timeout,
        SdkError::DispatchFailure(_) => StoreError::Transport(DisplayErrorContext(&err).to_string()),
        SdkError::ServiceError(ctx) => {
            let service = ctx.err();
            let message = service.message().unwrap_or("no message").to_string();
            match service.code() {
                Some(code) => StoreError::from_code(code, message),
                None => StoreError::Service { code: "unknown".to_string(), message: DisplayErrorContext(&err).to_string() },
            }
        }
        _ => StoreError::Transport(DisplayErrorContext(&err).to_string()),
    }
}
