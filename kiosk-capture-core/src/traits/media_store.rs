use std::future::Future;

use bytes::Bytes;

use crate::models::artifacts::{ArtifactKind, DestinationId};
use crate::models::error::UploadError;

/// One artifact upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub destination: DestinationId,
    pub kind: ArtifactKind,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Where the store put the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub url: String,
}

/// External durable store for finished artifacts.
///
/// Retries and the wire protocol belong to the implementation.
pub trait MediaStore: Send + Sync + 'static {
    fn upload(&self, request: UploadRequest) -> impl Future<Output = Result<RemoteObject, UploadError>> + Send;
}
