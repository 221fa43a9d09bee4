use std::path::PathBuf;

use crate::models::artifacts::{Artifact, ArtifactKind, DestinationId};
use crate::models::error::{CaptureError, UploadError};
use crate::storage::local_cache::LocalCache;
use crate::traits::media_store::{MediaStore, UploadRequest};

/// Result of persisting one artifact.
///
/// The local copy always exists when a report is produced; the upload
/// outcome is carried alongside and never turns into an error.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub artifact_id: String,
    pub kind: ArtifactKind,
    pub destination: DestinationId,
    pub local_path: PathBuf,
    pub checksum: String,
    pub remote_url: Option<String>,
    pub upload_error: Option<UploadError>,
}

impl SaveReport {
    pub fn is_uploaded(&self) -> bool {
        self.remote_url.is_some()
    }
}

/// Local cache first, then the Media Store.
pub struct PersistenceBridge<M: MediaStore> {
    store: M,
    cache: LocalCache,
}

impl<M: MediaStore> PersistenceBridge<M> {
    pub fn new(store: M, cache: LocalCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Cache `artifact` locally, then upload it.
    ///
    /// Only a local write failure is an error. An upload failure leaves the
    /// cached copy in place and is reported in [`SaveReport::upload_error`].
    pub async fn save(&self, artifact: Artifact<'_>, destination: &DestinationId) -> Result<SaveReport, CaptureError> {
        let mut cached = self.cache.store(artifact, destination)?;

        let request = UploadRequest {
            destination: destination.clone(),
            kind: artifact.kind(),
            file_name: cached.metadata.file_name.clone(),
            content_type: cached.metadata.content_type.clone(),
            bytes: artifact.bytes().clone(),
        };

        let (remote_url, upload_error) = match self.store.upload(request).await {
            Ok(remote) => {
                if let Err(e) = self.cache.mark_uploaded(&mut cached, &remote.url) {
                    log::warn!("uploaded {} but could not update metadata: {}", cached.metadata.file_name, e);
                }
                log::info!("{} uploaded to {}", cached.metadata.file_name, remote.url);
                (Some(remote.url), None)
            }
            Err(e) => {
                log::warn!("upload of {} failed, kept local copy: {}", cached.metadata.file_name, e);
                (None, Some(e))
            }
        };

        Ok(SaveReport {
            artifact_id: cached.metadata.id,
            kind: cached.metadata.kind,
            destination: destination.clone(),
            local_path: cached.path,
            checksum: cached.metadata.checksum,
            remote_url,
            upload_error,
        })
    }
}
