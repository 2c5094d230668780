//! Query result structures.
//!
//! Everything here serializes to JSON for the CLI's output.

use serde::{Deserialize, Serialize};

/// One day's playcount for a file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCount {
    /// Date key, `YYYYMMDD`
    pub date: String,
    pub count: u64,
}

/// Playcount totals for a single file over a resolved date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Canonical (underscored) filename
    pub filename: String,
    pub total: u64,
    pub details: Vec<DayCount>,
}

/// Playcount totals for a recursively expanded category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    pub depth: u32,
    pub total: u64,
    /// Per-file breakdown, sorted by filename
    pub details: Vec<FileReport>,
}

/// One day's image views, split by cohort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDayCount {
    /// Date key, `YYYYMMDD`
    pub date: String,
    pub original: u64,
    pub small: u64,
    pub medium: u64,
    pub large: u64,
    pub total: u64,
}

/// Running totals across the four cohorts plus their sum.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageTotals {
    pub original: u64,
    pub small: u64,
    pub medium: u64,
    pub large: u64,
    pub total: u64,
}

impl ImageTotals {
    /// Fold one day's counts into the running totals.
    pub fn add_day(&mut self, day: &ImageDayCount) {
        self.original += day.original;
        self.small += day.small;
        self.medium += day.medium;
        self.large += day.large;
        self.total += day.total;
    }

    /// Fold another set of totals into this one.
    pub fn add(&mut self, other: &ImageTotals) {
        self.original += other.original;
        self.small += other.small;
        self.medium += other.medium;
        self.large += other.large;
        self.total += other.total;
    }
}

/// Image view totals for a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFileReport {
    pub filename: String,
    pub totals: ImageTotals,
    pub details: Vec<ImageDayCount>,
}

/// Image view totals for a recursively expanded category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCategoryReport {
    pub category: String,
    pub depth: u32,
    pub totals: ImageTotals,
    /// Per-file breakdown, sorted by filename
    pub details: Vec<ImageFileReport>,
}

/// A cumulative reading of an externally hosted counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// Timestamp key, `YYYYMMDDHHmmss`
    pub timestamp: String,
    pub count: u64,
}

/// The latest externally hosted counter reading for a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub filename: String,
    /// `None` when the file has no paired video
    pub video_id: Option<String>,
    pub current: Option<Snapshot>,
}

/// A snapshot resolved to one requested calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaySnapshot {
    /// Date key, `YYYYMMDD`
    pub date: String,
    /// The snapshot taken that day
    pub timestamp: String,
    pub count: u64,
}

/// Day-by-day externally hosted counter readings for a file.
///
/// Days with no snapshot are absent, not zero-filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHistory {
    pub filename: String,
    pub video_id: Option<String>,
    pub days: Vec<DaySnapshot>,
}
