//! Externally hosted video counters.
//!
//! These are cumulative lifetime readings keyed by absolute snapshot
//! timestamp, not daily deltas: the current value is simply the newest
//! snapshot, and a historical query reports only the days a snapshot was
//! actually taken.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{DaySnapshot, Snapshot, SnapshotHistory, SnapshotReport};
use crate::store::{Counters, keys};

use super::{Span, resolve_days, yesterday};

/// Resolves files to their externally hosted counters.
pub struct SnapshotResolver {
    counters: Arc<Counters>,
}

impl SnapshotResolver {
    pub fn new(counters: Arc<Counters>) -> Self {
        Self { counters }
    }

    /// The newest stored reading for a file's paired video.
    ///
    /// A file with no paired video yields an empty report, not an error.
    pub async fn current(&self, filename: &str) -> Result<SnapshotReport> {
        let filename = keys::normalize(filename);

        let Some(video_id) = self.counters.video_id(&filename).await? else {
            return Ok(SnapshotReport {
                filename,
                video_id: None,
                current: None,
            });
        };

        let snapshots = self.counters.snapshots(&video_id).await?;
        let current = snapshots
            .into_iter()
            .next_back()
            .map(|(timestamp, count)| Snapshot { timestamp, count });

        Ok(SnapshotReport {
            filename,
            video_id: Some(video_id),
            current,
        })
    }

    /// One reading per requested day, where one exists.
    pub async fn history(&self, filename: &str, span: Span) -> Result<SnapshotHistory> {
        self.history_at(filename, span, yesterday()).await
    }

    async fn history_at(
        &self,
        filename: &str,
        span: Span,
        yesterday: NaiveDate,
    ) -> Result<SnapshotHistory> {
        let days = resolve_days(span, yesterday)?;
        let filename = keys::normalize(filename);

        let Some(video_id) = self.counters.video_id(&filename).await? else {
            return Ok(SnapshotHistory {
                filename,
                video_id: None,
                days: Vec::new(),
            });
        };

        let snapshots = self.counters.snapshots(&video_id).await?;

        let mut entries = Vec::new();
        for date in days.into_iter().map(keys::date_field) {
            // The newest snapshot sharing this day's prefix, if any
            let taken = snapshots
                .range(date.clone()..)
                .take_while(|(timestamp, _)| timestamp.starts_with(&date))
                .last();
            if let Some((timestamp, count)) = taken {
                entries.push(DaySnapshot {
                    date,
                    timestamp: timestamp.clone(),
                    count: *count,
                });
            }
        }

        Ok(SnapshotHistory {
            filename,
            video_id: Some(video_id),
            days: entries,
        })
    }
}
