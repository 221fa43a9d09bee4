use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::artifacts::{ArtifactKind, DestinationId};
use crate::models::error::CaptureError;

/// Sidecar metadata stored next to every cached artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub kind: ArtifactKind,
    pub destination: DestinationId,
    pub file_name: String,
    pub content_type: String,
    /// SHA-256 of the artifact bytes, lowercase hex.
    pub checksum: String,
    pub size_bytes: u64,
    /// ISO 8601
    pub captured_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_speed: Option<f32>,
    /// Set once the Media Store accepted the upload.
    #[serde(default)]
    pub remote_url: Option<String>,
}

/// Path of the sidecar for `artifact_path`: `photo-1.jpg` → `photo-1.metadata.json`.
pub fn metadata_path(artifact_path: &Path) -> PathBuf {
    artifact_path.with_extension("metadata.json")
}

/// Write artifact metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &ArtifactMetadata, artifact_path: &Path) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(artifact_path), json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read artifact metadata from a JSON sidecar file.
pub fn read_metadata(artifact_path: &Path) -> Result<ArtifactMetadata, CaptureError> {
    read_sidecar(&metadata_path(artifact_path))
}

pub(crate) fn read_sidecar(sidecar: &Path) -> Result<ArtifactMetadata, CaptureError> {
    let json = fs::read_to_string(sidecar)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArtifactMetadata {
        ArtifactMetadata {
            id: "a1".to_string(),
            kind: ArtifactKind::Video,
            destination: DestinationId::new("event-7"),
            file_name: "video-1700000000000.webm".to_string(),
            content_type: "video/webm".to_string(),
            checksum: "00ff".to_string(),
            size_bytes: 2,
            captured_at: "2024-01-01T00:00:00Z".to_string(),
            width: None,
            height: None,
            duration_secs: Some(12.5),
            requested_speed: Some(0.5),
            remote_url: None,
        }
    }

    #[test]
    fn sidecar_replaces_extension() {
        assert_eq!(
            metadata_path(Path::new("/cache/e/photo-1-2.jpg")),
            PathBuf::from("/cache/e/photo-1-2.metadata.json")
        );
    }

    #[test]
    fn write_then_read() {
        let dir = std::env::temp_dir().join(format!("kiosk_metadata_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let artifact = dir.join("video-1700000000000.webm");

        write_metadata(&sample(), &artifact).unwrap();
        let json = fs::read_to_string(metadata_path(&artifact)).unwrap();
        assert!(json.contains("\"kind\": \"video\""));
        assert!(json.contains("\"destination\": \"event-7\""));
        assert!(!json.contains("width"));
        assert_eq!(read_metadata(&artifact).unwrap(), sample());

        fs::remove_dir_all(&dir).ok();
    }
}
