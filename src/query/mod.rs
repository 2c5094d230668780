//! Aggregation queries over the counter stores.
//!
//! File-level totals read one counter; category-level totals expand the
//! category graph first and fold per-file results. Bounded ranges zero-fill
//! days with no recorded counter so every day of the range appears in the
//! detail list.

pub mod youtube;

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::graph::{MediaFilter, Walker};
use crate::models::{
    CategoryReport, DayCount, FileReport, ImageCategoryReport, ImageDayCount, ImageFileReport,
    ImageTotals,
};
use crate::store::{Counters, keys};

// Re-export for convenience
pub use youtube::SnapshotResolver;

/// Caller-supplied date bounds, before resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Span {
    /// Explicit start, inclusive
    pub start: Option<NaiveDate>,
    /// Explicit end, inclusive; defaults to yesterday
    pub end: Option<NaiveDate>,
    /// Window of N days ending at the end date
    pub last: Option<u32>,
}

/// Date bound for an aggregation query.
#[derive(Debug, Clone, Copy)]
pub enum Bounds {
    /// Every recorded date, no zero-fill
    AllTime,
    /// A resolved day sequence, zero-filled
    Span(Span),
}

/// The most recent complete log day.
pub fn yesterday() -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .expect("date underflow")
}

/// Resolve bounds into an explicit inclusive day sequence.
///
/// Exactly one interpretation applies: an explicit `[start, end]`, a
/// relative window of `last` days ending at `end`, or the single default
/// day. A swapped range is a usage error, raised before any store access.
pub fn resolve_days(span: Span, yesterday: NaiveDate) -> Result<Vec<NaiveDate>> {
    let end = span.end.unwrap_or(yesterday);
    let start = match (span.start, span.last) {
        (Some(start), _) => start,
        (None, Some(last)) => {
            if last == 0 {
                return Err(AppError::date_range("window must cover at least one day"));
            }
            end.checked_sub_days(Days::new(u64::from(last) - 1))
                .ok_or_else(|| AppError::date_range(format!("window of {last} days underflows")))?
        }
        (None, None) => end,
    };

    if start > end {
        return Err(AppError::date_range(format!(
            "start {start} is after end {end}"
        )));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Composes counter reads with category-graph manifests.
pub struct Aggregator {
    counters: Arc<Counters>,
    walker: Walker,
}

impl Aggregator {
    pub fn new(counters: Arc<Counters>, walker: Walker) -> Self {
        Self { counters, walker }
    }

    /// Playcount total for one file.
    pub async fn file_total(&self, filename: &str, bounds: Bounds) -> Result<FileReport> {
        self.file_total_at(filename, bounds, yesterday()).await
    }

    async fn file_total_at(
        &self,
        filename: &str,
        bounds: Bounds,
        yesterday: NaiveDate,
    ) -> Result<FileReport> {
        let days = match bounds {
            Bounds::AllTime => None,
            Bounds::Span(span) => Some(resolve_days(span, yesterday)?),
        };
        let recorded = self.counters.play_counts_all(filename).await?;

        let details: Vec<DayCount> = match days {
            // All time: every recorded field, in date order
            None => recorded
                .into_iter()
                .map(|(date, count)| DayCount { date, count })
                .collect(),
            // Bounded: zero-fill the full range
            Some(days) => days
                .into_iter()
                .map(|day| {
                    let date = keys::date_field(day);
                    let count = recorded.get(&date).copied().unwrap_or(0);
                    DayCount { date, count }
                })
                .collect(),
        };

        Ok(FileReport {
            filename: keys::normalize(filename),
            total: details.iter().map(|d| d.count).sum(),
            details,
        })
    }

    /// Playcount total for a recursively expanded category, with the
    /// per-file breakdown sorted by filename.
    pub async fn category_total(
        &self,
        category: &str,
        depth: u32,
        bounds: Bounds,
    ) -> Result<CategoryReport> {
        self.category_total_at(category, depth, bounds, yesterday())
            .await
    }

    async fn category_total_at(
        &self,
        category: &str,
        depth: u32,
        bounds: Bounds,
        yesterday: NaiveDate,
    ) -> Result<CategoryReport> {
        let manifest = self.walker.expand(category, depth, MediaFilter::Playable).await?;

        // `buffered` keeps manifest order, so details stay filename-sorted
        let mut reports = stream::iter(manifest.iter())
            .map(|file| self.file_total_at(file, bounds, yesterday))
            .buffered(4);

        let mut details = Vec::with_capacity(manifest.len());
        while let Some(report) = reports.next().await {
            details.push(report?);
        }
        drop(reports);

        Ok(CategoryReport {
            category: category.to_string(),
            depth,
            total: details.iter().map(|f| f.total).sum(),
            details,
        })
    }

    /// Image view totals for one file, folding the four cohorts and their
    /// sum.
    pub async fn image_file_total(&self, filename: &str, bounds: Bounds) -> Result<ImageFileReport> {
        self.image_file_total_at(filename, bounds, yesterday()).await
    }

    async fn image_file_total_at(
        &self,
        filename: &str,
        bounds: Bounds,
        yesterday: NaiveDate,
    ) -> Result<ImageFileReport> {
        let days = match bounds {
            Bounds::AllTime => None,
            Bounds::Span(span) => Some(resolve_days(span, yesterday)?),
        };
        let recorded = self.counters.image_counts_all(filename).await?;

        let details: Vec<ImageDayCount> = match days {
            None => recorded
                .into_iter()
                .map(|(date, cohorts)| image_day(date, cohorts))
                .collect(),
            Some(days) => days
                .into_iter()
                .map(|day| {
                    let date = keys::date_field(day);
                    let cohorts = recorded.get(&date).copied().unwrap_or_default();
                    image_day(date, cohorts)
                })
                .collect(),
        };

        let mut totals = ImageTotals::default();
        for day in &details {
            totals.add_day(day);
        }
        Ok(ImageFileReport {
            filename: keys::normalize(filename),
            totals,
            details,
        })
    }

    /// Image view totals for a recursively expanded category.
    pub async fn image_category_total(
        &self,
        category: &str,
        depth: u32,
        bounds: Bounds,
    ) -> Result<ImageCategoryReport> {
        self.image_category_total_at(category, depth, bounds, yesterday())
            .await
    }

    async fn image_category_total_at(
        &self,
        category: &str,
        depth: u32,
        bounds: Bounds,
        yesterday: NaiveDate,
    ) -> Result<ImageCategoryReport> {
        let manifest = self.walker.expand(category, depth, MediaFilter::Image).await?;

        let mut reports = stream::iter(manifest.iter())
            .map(|file| self.image_file_total_at(file, bounds, yesterday))
            .buffered(4);

        let mut totals = ImageTotals::default();
        let mut details = Vec::with_capacity(manifest.len());
        while let Some(report) = reports.next().await {
            let report = report?;
            totals.add(&report.totals);
            details.push(report);
        }
        drop(reports);

        Ok(ImageCategoryReport {
            category: category.to_string(),
            depth,
            totals,
            details,
        })
    }
}

fn image_day(date: String, cohorts: crate::models::CohortCounts) -> ImageDayCount {
    ImageDayCount {
        date,
        original: cohorts.original,
        small: cohorts.small,
        medium: cohorts.medium,
        large: cohorts.large,
        total: cohorts.total(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StaticGraph;
    use crate::models::{CohortCounts, LineRecord, MediaCounts};
    use crate::store::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn span(start: Option<&str>, end: Option<&str>, last: Option<u32>) -> Bounds {
        Bounds::Span(Span {
            start: start.map(day),
            end: end.map(day),
            last,
        })
    }

    async fn fixture() -> Aggregator {
        let counters = Arc::new(Counters::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        ));

        let playable = |name: &str, amount: u64| LineRecord {
            filename: name.to_string(),
            counts: MediaCounts::Playable(amount),
        };
        counters
            .record(&playable("Birdsong.webm", 100), day("2015-01-05"))
            .await
            .unwrap();
        counters
            .record(&playable("Birdsong.webm", 50), day("2015-01-08"))
            .await
            .unwrap();
        counters
            .record(&playable("Nightingale.ogg", 7), day("2015-01-05"))
            .await
            .unwrap();
        counters
            .record(
                &LineRecord {
                    filename: "Bird_chart.jpg".to_string(),
                    counts: MediaCounts::Image(CohortCounts {
                        original: 1,
                        small: 2,
                        medium: 3,
                        large: 4,
                    }),
                },
                day("2015-01-05"),
            )
            .await
            .unwrap();

        let mut graph = StaticGraph::new();
        graph.add_subcategory("Birds", "Songbirds");
        graph.add_file("Birds", "Birdsong.webm");
        graph.add_file("Birds", "Bird_chart.jpg");
        graph.add_file("Songbirds", "Nightingale.ogg");

        Aggregator::new(counters, Walker::new(Arc::new(graph), 4))
    }

    #[tokio::test]
    async fn test_range_zero_fills_missing_days() {
        let aggregator = fixture().await;
        let report = aggregator
            .file_total_at(
                "Nightingale.ogg",
                span(Some("2015-01-05"), Some("2015-01-08"), None),
                day("2015-02-01"),
            )
            .await
            .unwrap();

        assert_eq!(report.total, 7);
        assert_eq!(
            report.details,
            vec![
                DayCount { date: "20150105".into(), count: 7 },
                DayCount { date: "20150106".into(), count: 0 },
                DayCount { date: "20150107".into(), count: 0 },
                DayCount { date: "20150108".into(), count: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_all_time_reports_only_recorded_days_in_order() {
        let aggregator = fixture().await;
        let report = aggregator
            .file_total("Birdsong.webm", Bounds::AllTime)
            .await
            .unwrap();

        assert_eq!(report.total, 150);
        assert_eq!(
            report.details,
            vec![
                DayCount { date: "20150105".into(), count: 100 },
                DayCount { date: "20150108".into(), count: 50 },
            ]
        );
    }

    #[tokio::test]
    async fn test_default_bounds_is_single_day_yesterday() {
        let aggregator = fixture().await;
        let report = aggregator
            .file_total_at("Birdsong.webm", span(None, None, None), day("2015-01-05"))
            .await
            .unwrap();

        assert_eq!(report.details.len(), 1);
        assert_eq!(report.total, 100);
    }

    #[tokio::test]
    async fn test_last_30_covers_thirty_days_ending_yesterday() {
        let aggregator = fixture().await;
        let report = aggregator
            .file_total_at("Birdsong.webm", span(None, None, Some(30)), day("2015-02-03"))
            .await
            .unwrap();

        assert_eq!(report.details.len(), 30);
        assert_eq!(report.details.first().unwrap().date, "20150105");
        assert_eq!(report.details.last().unwrap().date, "20150203");
        assert_eq!(report.total, 150);
    }

    #[tokio::test]
    async fn test_swapped_range_is_a_usage_error() {
        let result = resolve_days(
            Span {
                start: Some(day("2015-02-01")),
                end: Some(day("2015-01-01")),
                last: None,
            },
            day("2015-03-01"),
        );
        assert!(matches!(result, Err(AppError::DateRange(_))));
    }

    #[tokio::test]
    async fn test_category_total_matches_summed_file_totals() {
        let aggregator = fixture().await;
        let bounds = span(Some("2015-01-01"), Some("2015-01-31"), None);
        let yesterday = day("2015-02-01");

        let report = aggregator
            .category_total_at("Birds", 9, bounds, yesterday)
            .await
            .unwrap();

        // Round trip: expand + file_total per manifest entry
        let manifest = aggregator
            .walker
            .expand("Birds", 9, MediaFilter::Playable)
            .await
            .unwrap();
        let mut expected = 0;
        for file in &manifest {
            expected += aggregator
                .file_total_at(file, bounds, yesterday)
                .await
                .unwrap()
                .total;
        }

        assert_eq!(report.total, expected);
        assert_eq!(report.total, 157);
        let names: Vec<&str> = report.details.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, ["Birdsong.webm", "Nightingale.ogg"]);
    }

    #[tokio::test]
    async fn test_image_category_folds_five_totals() {
        let aggregator = fixture().await;
        let report = aggregator
            .image_category_total_at(
                "Birds",
                9,
                span(Some("2015-01-05"), Some("2015-01-05"), None),
                day("2015-02-01"),
            )
            .await
            .unwrap();

        assert_eq!(
            report.totals,
            ImageTotals {
                original: 1,
                small: 2,
                medium: 3,
                large: 4,
                total: 10,
            }
        );
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].filename, "Bird_chart.jpg");
    }
}
