//! Counter storage abstractions.
//!
//! Two physically distinct counter families exist: per-day playcount deltas
//! for playable media and YouTube-linked totals (the fast hash-per-entity
//! store), and per-day four-cohort view counts for static images (the
//! secondary store). Each family is an independent [`CounterStore`] handle
//! inside [`Counters`]; the backend variant is chosen once at construction
//! from configuration, never per call.

pub mod keys;
pub mod memory;
pub mod redis;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{Backend, StoreConfig};
use crate::error::Result;
use crate::models::{CohortCounts, LineRecord, MediaCounts};

// Re-export for convenience
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// A hash-per-entity counter backend.
///
/// Keys address one entity's counter; fields address one day (or timestamp)
/// within it. Increments are assumed atomic at the store level.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add `amount` to one field of one entity's counter, creating both as
    /// needed.
    async fn increment(&self, key: &str, field: &str, amount: u64) -> Result<()>;

    /// Read a single field, `None` when absent.
    async fn read_field(&self, key: &str, field: &str) -> Result<Option<u64>>;

    /// Read every field of one entity's counter, sorted by field.
    async fn read_counter(&self, key: &str) -> Result<BTreeMap<String, u64>>;

    /// Remove a single field; returns whether it existed.
    async fn delete_field(&self, key: &str, field: &str) -> Result<bool>;

    /// All keys matching a `prefix*` pattern.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Read a plain string value, `None` when absent.
    async fn read_string(&self, key: &str) -> Result<Option<String>>;
}

/// Connect the backend variant named by configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn CounterStore>> {
    match config.backend {
        Backend::Redis => Ok(Arc::new(RedisStore::connect(&config.url).await?)),
        Backend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

/// Domain-level counter operations over both families.
pub struct Counters {
    plays: Arc<dyn CounterStore>,
    images: Arc<dyn CounterStore>,
}

impl Counters {
    pub fn new(plays: Arc<dyn CounterStore>, images: Arc<dyn CounterStore>) -> Self {
        Self { plays, images }
    }

    /// Write one classified record into the family that owns it.
    pub async fn record(&self, record: &LineRecord, date: NaiveDate) -> Result<()> {
        match record.counts {
            MediaCounts::Playable(amount) => {
                self.plays
                    .increment(&keys::play_key(&record.filename), &keys::date_field(date), amount)
                    .await
            }
            MediaCounts::Image(cohorts) => {
                let key = keys::image_key(&record.filename);
                for (digit, amount) in cohorts.by_digit() {
                    if amount > 0 {
                        self.images
                            .increment(&key, &keys::cohort_field(date, digit), amount)
                            .await?;
                    }
                }
                Ok(())
            }
        }
    }

    /// One day's playcount for a file, `None` when nothing was recorded.
    pub async fn play_count(&self, filename: &str, date: NaiveDate) -> Result<Option<u64>> {
        self.plays
            .read_field(&keys::play_key(filename), &keys::date_field(date))
            .await
    }

    /// Every recorded day for a file, keyed `YYYYMMDD`.
    pub async fn play_counts_all(&self, filename: &str) -> Result<BTreeMap<String, u64>> {
        self.plays.read_counter(&keys::play_key(filename)).await
    }

    /// Every recorded day of image views for a file, cohorts regrouped per
    /// date.
    pub async fn image_counts_all(&self, filename: &str) -> Result<BTreeMap<String, CohortCounts>> {
        let raw = self.images.read_counter(&keys::image_key(filename)).await?;

        let mut by_date: BTreeMap<String, CohortCounts> = BTreeMap::new();
        for (field, amount) in raw {
            // YYYYMMDD plus one cohort digit; anything else is not ours
            if field.len() != 9 {
                continue;
            }
            let (date, digit) = field.split_at(8);
            let Ok(digit) = digit.parse::<u8>() else {
                continue;
            };
            by_date
                .entry(date.to_string())
                .or_default()
                .set_digit(digit, amount);
        }
        Ok(by_date)
    }

    /// Remove one date's field from every playable-media counter.
    ///
    /// Returns how many counters held a value for that date. Used for
    /// corrective re-ingestion; the image family is left untouched.
    pub async fn purge_date(&self, date: NaiveDate) -> Result<u64> {
        let field = keys::date_field(date);
        let pattern = format!("{}*", keys::PLAY_PREFIX);

        let mut removed = 0;
        for key in self.plays.scan_keys(&pattern).await? {
            if self.plays.delete_field(&key, &field).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// The external video id paired with a file, if any.
    pub async fn video_id(&self, filename: &str) -> Result<Option<String>> {
        self.plays.read_string(&keys::video_map_key(filename)).await
    }

    /// All stored snapshots for a video, keyed `YYYYMMDDHHmmss`.
    pub async fn snapshots(&self, video_id: &str) -> Result<BTreeMap<String, u64>> {
        self.plays.read_counter(&keys::youtube_key(video_id)).await
    }
}
