// src/models/mod.rs

//! Domain models for the playcount pipeline.
//!
//! This module contains the data structures shared across ingestion and
//! querying, organized by their primary purpose.

mod record;
mod report;

// Re-export all public types
pub use record::{CohortCounts, LineRecord, MediaCounts, PLAYABLE_EXTENSIONS, is_playable};
pub use report::{
    CategoryReport, DayCount, DaySnapshot, FileReport, ImageCategoryReport, ImageDayCount,
    ImageFileReport, ImageTotals, Snapshot, SnapshotHistory, SnapshotReport,
};
