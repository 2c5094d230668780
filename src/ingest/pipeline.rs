//! Per-date ingestion runs.
//!
//! Each line is parsed and, when classified, written to its counter family
//! immediately, so a fetch that dies partway still leaves already-processed
//! lines durable. Re-running a date therefore double-counts; purge the date
//! first for corrective re-ingestion.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::MediaCounts;
use crate::store::Counters;

use super::fetcher::LogFetcher;
use super::parser;

/// Per-date run statistics.
#[derive(Debug, Clone)]
pub struct DayStats {
    pub date: NaiveDate,
    pub lines: u64,
    pub playable: u64,
    pub images: u64,
}

impl DayStats {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            lines: 0,
            playable: 0,
            images: 0,
        }
    }
}

/// Outcome of a multi-date run. Failures are isolated per date.
#[derive(Debug, Default)]
pub struct IngestSummary {
    pub completed: Vec<DayStats>,
    pub failed: Vec<(NaiveDate, crate::error::AppError)>,
}

impl IngestSummary {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drives fetch, parse, and store for one or more dates.
pub struct Ingestor {
    fetcher: LogFetcher,
    counters: Arc<Counters>,
}

impl Ingestor {
    pub fn new(fetcher: LogFetcher, counters: Arc<Counters>) -> Self {
        Self { fetcher, counters }
    }

    /// Ingest a single day. The decompressed artifact is removed on every
    /// exit path.
    pub async fn run_date(&self, date: NaiveDate) -> Result<DayStats> {
        let lines = self.fetcher.fetch(date).await?;
        self.ingest_lines(lines, date).await
    }

    /// Parse and store an already-fetched line sequence.
    pub(crate) async fn ingest_lines(
        &self,
        lines: impl Iterator<Item = Result<String>>,
        date: NaiveDate,
    ) -> Result<DayStats> {
        let mut stats = DayStats::new(date);

        for line in lines {
            let line = line?;
            stats.lines += 1;

            if let Some(record) = parser::parse(&line)? {
                match record.counts {
                    MediaCounts::Playable(_) => stats.playable += 1,
                    MediaCounts::Image(_) => stats.images += 1,
                }
                self.counters.record(&record, date).await?;
            }
        }

        log::info!(
            "{}: {} lines read, {} playable and {} image records stored",
            stats.date,
            stats.lines,
            stats.playable,
            stats.images
        );
        Ok(stats)
    }

    /// Ingest an ordered sequence of dates, one at a time.
    ///
    /// A failed date is logged and skipped; prior committed dates are
    /// unaffected and later dates still run.
    pub async fn run_dates(&self, dates: &[NaiveDate]) -> IngestSummary {
        let mut summary = IngestSummary::default();

        for &date in dates {
            match self.run_date(date).await {
                Ok(stats) => summary.completed.push(stats),
                Err(e) => {
                    log::error!("Ingestion failed for {date}: {e}");
                    summary.failed.push((date, e));
                }
            }
        }
        summary
    }

    /// Ingest every day from `from` through `until`, inclusive.
    pub async fn run_span(&self, from: NaiveDate, until: NaiveDate) -> IngestSummary {
        let dates: Vec<NaiveDate> = from.iter_days().take_while(|d| *d <= until).collect();
        self.run_dates(&dates).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::store::MemoryStore;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ingestor() -> (Ingestor, Arc<Counters>) {
        let counters = Arc::new(Counters::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        ));
        let fetcher = LogFetcher::new(&FetchConfig::default()).unwrap();
        (Ingestor::new(fetcher, Arc::clone(&counters)), counters)
    }

    fn log_line(path: &str, original: &str, audio: &str, movie: &str) -> String {
        let mut fields = vec![""; 17];
        fields[0] = path;
        fields[3] = original;
        fields[4] = audio;
        fields[16] = movie;
        fields.join("\t")
    }

    #[tokio::test]
    async fn test_ingest_streams_records_into_counters() {
        let (ingestor, counters) = ingestor();
        let date = day("2015-01-05");
        let lines = vec![
            Ok(log_line(
                "/wikipedia/commons/a/bc/Finally+a+video.webm",
                "578345",
                "1234",
                "4444",
            )),
            Ok("not\ta\tmedia\trow".to_string()),
            Ok(log_line("/math/0/0/0/abc.png", "22222222", "555", "4444")),
        ];

        let stats = ingestor.ingest_lines(lines.into_iter(), date).await.unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.playable, 1);
        assert_eq!(stats.images, 0);

        assert_eq!(
            counters
                .play_count("Finally a video.webm", date)
                .await
                .unwrap(),
            Some(583_923)
        );
    }

    #[tokio::test]
    async fn test_lines_before_a_bad_line_stay_durable() {
        let (ingestor, counters) = ingestor();
        let date = day("2015-01-05");
        let lines = vec![
            Ok(log_line(
                "/wikipedia/commons/a/bc/First.ogg",
                "10",
                "-",
                "-",
            )),
            Ok(log_line(
                "/wikipedia/commons/a/bc/Second.ogg",
                "oops",
                "-",
                "-",
            )),
            Ok(log_line(
                "/wikipedia/commons/a/bc/Third.ogg",
                "30",
                "-",
                "-",
            )),
        ];

        let result = ingestor.ingest_lines(lines.into_iter(), date).await;
        assert!(result.is_err());

        // Streaming design: the first record was already committed
        assert_eq!(counters.play_count("First.ogg", date).await.unwrap(), Some(10));
        assert_eq!(counters.play_count("Third.ogg", date).await.unwrap(), None);
    }
}
