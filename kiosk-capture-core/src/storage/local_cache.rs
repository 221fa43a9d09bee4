use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::artifacts::{Artifact, DestinationId};
use crate::models::error::CaptureError;
use crate::storage::metadata::{self, ArtifactMetadata};

/// An artifact written to the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArtifact {
    pub path: PathBuf,
    pub metadata: ArtifactMetadata,
}

/// On-disk copy of every saved artifact, grouped by destination.
///
/// Layout:
/// ```text
/// <root>/<destination>/photo-<millis>-<index>.jpg
/// <root>/<destination>/photo-<millis>-<index>.metadata.json
/// <root>/<destination>/video-<millis>.webm
/// <root>/<destination>/video-<millis>.metadata.json
/// ```
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
}

impl LocalCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn destination_dir(&self, destination: &DestinationId) -> PathBuf {
        self.root.join(dir_name(destination))
    }

    /// Write `artifact` and its sidecar under `destination`.
    pub fn store(&self, artifact: Artifact<'_>, destination: &DestinationId) -> Result<CachedArtifact, CaptureError> {
        let dir = self.destination_dir(destination);
        fs::create_dir_all(&dir)
            .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;

        let mut file_name = artifact.file_name();
        let candidate = dir.join(&file_name);
        // Containers differ in extension only, so the sidecar can collide alone.
        if candidate.exists() || metadata::metadata_path(&candidate).exists() {
            file_name = disambiguate(&file_name, artifact.id());
        }
        let path = dir.join(&file_name);
        let bytes = artifact.bytes();
        fs::write(&path, bytes).map_err(|e| CaptureError::StorageError(format!("failed to write artifact: {}", e)))?;

        let (width, height, duration_secs, requested_speed) = match artifact {
            Artifact::Shot(shot) => (Some(shot.width), Some(shot.height), None, None),
            Artifact::Recording(rec) => (None, None, Some(rec.duration().as_secs_f64()), Some(rec.requested_speed)),
        };
        let metadata = ArtifactMetadata {
            id: artifact.id().to_string(),
            kind: artifact.kind(),
            destination: destination.clone(),
            file_name,
            content_type: artifact.content_type().to_string(),
            checksum: sha256_hex(bytes),
            size_bytes: bytes.len() as u64,
            captured_at: artifact.captured_at().to_rfc3339(),
            width,
            height,
            duration_secs,
            requested_speed,
            remote_url: None,
        };
        metadata::write_metadata(&metadata, &path)?;

        log::debug!("cached {} ({} bytes)", path.display(), metadata.size_bytes);
        Ok(CachedArtifact { path, metadata })
    }

    /// Record the remote location of an uploaded artifact.
    pub fn mark_uploaded(&self, cached: &mut CachedArtifact, remote_url: &str) -> Result<(), CaptureError> {
        cached.metadata.remote_url = Some(remote_url.to_string());
        metadata::write_metadata(&cached.metadata, &cached.path)
    }

    /// Metadata of every artifact cached for `destination`, oldest first.
    pub fn entries(&self, destination: &DestinationId) -> Result<Vec<ArtifactMetadata>, CaptureError> {
        let dir = self.destination_dir(destination);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let listing =
            fs::read_dir(&dir).map_err(|e| CaptureError::StorageError(format!("failed to list cache: {}", e)))?;

        let mut entries = Vec::new();
        for entry in listing {
            let entry = entry.map_err(|e| CaptureError::StorageError(format!("failed to list cache: {}", e)))?;
            let path = entry.path();
            let is_sidecar = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(".metadata.json"));
            if is_sidecar {
                entries.push(metadata::read_sidecar(&path)?);
            }
        }
        entries.sort_by(|a, b| a.captured_at.cmp(&b.captured_at).then_with(|| a.file_name.cmp(&b.file_name)));
        Ok(entries)
    }
}

/// Destination tokens are opaque; keep them filesystem-safe.
fn dir_name(destination: &DestinationId) -> String {
    let name: String = destination
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "_".to_string()
    } else {
        name
    }
}

fn disambiguate(file_name: &str, id: &str) -> String {
    let suffix: String = id.chars().take(8).collect();
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}-{}.{}", stem, suffix, ext),
        None => format!("{}-{}", file_name, suffix),
    }
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    hex_encode(&Sha256::digest(data))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
