pub mod bridge;
pub mod local_cache;
pub mod metadata;
