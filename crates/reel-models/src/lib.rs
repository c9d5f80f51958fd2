//! Shared data models for the Reelforge backend.
//!
//! This crate provides Serde-serializable types for:
//! - Projects and their production lifecycle states
//! - Scripts, cast assignments and generated assets
//! - Scheduled jobs (recurring production requests)
//! - YouTube connection and upload metadata

pub mod asset;
pub mod format;
pub mod job;
pub mod project;
pub mod script;
pub mod youtube;

// Re-export common types
pub use asset::{Asset, AssetType};
pub use format::VideoFormat;
pub use job::{JobId, ScheduledJob};
pub use project::{Project, ProjectId, ProjectStatus};
pub use script::{CastList, Scene, Script, VoiceAssignment};
pub use youtube::{PrivacyStatus, YouTubeConnection, YouTubeMetadata};
