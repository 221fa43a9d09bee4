//! Recorder mime type selection and blob naming.

/// Mime type of encoded stills.
pub const JPEG: &str = "image/jpeg";

/// Container assumed when the recorder reports nothing.
pub const DEFAULT_VIDEO: &str = "video/webm";

/// Recorder types in order of preference.
pub const RECORDER_PREFERENCES: [&str; 6] = [
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4",
];

/// First preferred type the platform supports, or `None` to let the
/// platform pick its default.
pub fn preferred_recorder_type(is_supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    RECORDER_PREFERENCES.iter().copied().find(|t| is_supported(t))
}

/// The container part of a mime type (`video/webm;codecs=vp9` -> `video/webm`).
pub fn blob_type(mime_type: &str) -> &str {
    match mime_type.split(';').next().map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => DEFAULT_VIDEO,
    }
}

pub fn file_extension(mime_type: &str) -> &'static str {
    if mime_type.contains("mp4") {
        "mp4"
    } else {
        "webm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_supported() {
        let supported = |t: &str| t == "video/webm;codecs=vp8" || t == "video/mp4";
        assert_eq!(preferred_recorder_type(supported), Some("video/webm;codecs=vp8"));
    }

    #[test]
    fn mp4_only_platform() {
        assert_eq!(preferred_recorder_type(|t| t == "video/mp4"), Some("video/mp4"));
    }

    #[test]
    fn nothing_supported_defers_to_platform() {
        assert_eq!(preferred_recorder_type(|_| false), None);
    }

    #[test]
    fn blob_type_strips_codecs() {
        assert_eq!(blob_type("video/webm;codecs=vp9,opus"), "video/webm");
        assert_eq!(blob_type("video/mp4"), "video/mp4");
        assert_eq!(blob_type(""), DEFAULT_VIDEO);
    }

    #[test]
    fn extension_follows_container() {
        assert_eq!(file_extension("video/mp4;codecs=avc1"), "mp4");
        assert_eq!(file_extension("video/webm;codecs=vp8"), "webm");
    }
}
