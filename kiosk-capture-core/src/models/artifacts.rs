use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::processing::mime;

/// Opaque destination token supplied by the Event Directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of finished artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Photo,
    Video,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

/// Remaining time of an active pre-capture countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownState {
    pub total_seconds: u32,
    pub remaining_seconds: u32,
}

/// A raw RGBA8 frame grabbed from the rendering sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// One still captured during a burst.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub id: String,
    /// 1-based position in the burst.
    pub sequence_index: u8,
    pub captured_at: DateTime<Utc>,
    /// Encoded `image/jpeg` bytes.
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Result of a burst that captured at least one shot.
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub shots: Vec<Shot>,
    pub requested: u8,
}

impl Burst {
    /// The stream was lost before every requested shot was taken.
    pub fn is_partial(&self) -> bool {
        self.shots.len() < self.requested as usize
    }
}

/// One finished start/stop recording cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    /// Mime type the recorder actually used, including codec parameters.
    pub mime_type: String,
    pub blob: Bytes,
    pub requested_speed: f32,
}

impl Recording {
    pub fn duration(&self) -> Duration {
        (self.stopped_at - self.started_at).to_std().unwrap_or_default()
    }

    /// Container type of the blob, without codec parameters.
    pub fn content_type(&self) -> &str {
        mime::blob_type(&self.mime_type)
    }
}

/// A borrowed artifact handed to the persistence bridge.
#[derive(Debug, Clone, Copy)]
pub enum Artifact<'a> {
    Shot(&'a Shot),
    Recording(&'a Recording),
}

impl Artifact<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Shot(shot) => &shot.id,
            Self::Recording(rec) => &rec.id,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Shot(_) => ArtifactKind::Photo,
            Self::Recording(_) => ArtifactKind::Video,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Shot(shot) => &shot.jpeg,
            Self::Recording(rec) => &rec.blob,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            Self::Shot(_) => mime::JPEG,
            Self::Recording(rec) => rec.content_type(),
        }
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        match self {
            Self::Shot(shot) => shot.captured_at,
            Self::Recording(rec) => rec.stopped_at,
        }
    }

    /// File name used for both the local copy and the upload.
    pub fn file_name(&self) -> String {
        let millis = self.captured_at().timestamp_millis();
        match self {
            Self::Shot(shot) => format!("photo-{}-{}.jpg", millis, shot.sequence_index),
            Self::Recording(rec) => format!("video-{}.{}", millis, mime::file_extension(&rec.mime_type)),
        }
    }
}
