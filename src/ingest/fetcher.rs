//! Daily archive retrieval.
//!
//! One day of mediacounts is a bz2-compressed TSV published under a
//! deterministic URL. The fetcher spools the compressed payload to a temp
//! file and hands back a lazy line iterator over the decompressed content;
//! the spool is unlinked when the iterator drops, on success and failure
//! alike.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines, Write};
use std::time::Duration;

use bzip2::read::BzDecoder;
use chrono::NaiveDate;
use tempfile::NamedTempFile;
use url::Url;

use crate::config::FetchConfig;
use crate::error::{AppError, Result};

/// Downloads one day's log archive.
pub struct LogFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl LogFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Archive URL for one day.
    pub fn archive_url(&self, date: NaiveDate) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/daily/{}/mediacounts.{}.v00.tsv.bz2",
            self.base_url,
            date.format("%Y"),
            date.format("%Y-%m-%d")
        ))?)
    }

    /// Download one day's archive and open it as a line sequence.
    ///
    /// Transfer failure and non-success status are both fatal for the date;
    /// an unavailable day is never treated as an empty one.
    pub async fn fetch(&self, date: NaiveDate) -> Result<LogLines> {
        let url = self.archive_url(date)?;
        log::info!("Downloading {url}");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::fetch(date, e))?;
        if !response.status().is_success() {
            return Err(AppError::fetch(
                date,
                format!("{url} returned {}", response.status()),
            ));
        }

        let mut spool = NamedTempFile::new()?;
        while let Some(chunk) = response.chunk().await.map_err(|e| AppError::fetch(date, e))? {
            spool.write_all(&chunk)?;
        }
        spool.flush()?;

        LogLines::open(spool, date)
    }
}

/// Lazy line sequence over one day's decompressed archive.
///
/// Finite and not restartable once consumed. Owns the on-disk spool, which
/// is removed on drop.
pub struct LogLines {
    lines: Lines<BufReader<BzDecoder<File>>>,
    date: NaiveDate,
    _spool: NamedTempFile,
}

impl LogLines {
    fn open(spool: NamedTempFile, date: NaiveDate) -> Result<Self> {
        let file = spool.reopen()?;
        let lines = BufReader::new(BzDecoder::new(file)).lines();
        Ok(Self {
            lines,
            date,
            _spool: spool,
        })
    }
}

impl Iterator for LogLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.lines.next() {
            Some(Ok(line)) => Some(Ok(line)),
            Some(Err(e)) => Some(Err(AppError::fetch(
                self.date,
                format!("decompression failed: {e}"),
            ))),
            None => None,
        }
    }
}
