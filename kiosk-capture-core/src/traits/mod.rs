pub mod camera_platform;
pub mod capture_delegate;
pub mod event_directory;
pub mod media_recorder;
pub mod media_store;
pub mod video_sink;
