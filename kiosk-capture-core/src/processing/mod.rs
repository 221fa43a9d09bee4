pub mod ladder;
pub mod mime;
pub mod still;
