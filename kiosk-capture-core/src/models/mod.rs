pub mod artifacts;
pub mod config;
pub mod constraints;
pub mod error;
pub mod guidance;
pub mod profile;
pub mod state;
