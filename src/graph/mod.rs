//! Category graph traversal.
//!
//! The category graph is external and read-only: nodes are categories and
//! files, edges are "category contains subcategory" and "category contains
//! file". The walker treats it as a DAG but the source may contain real
//! cycles, so traversal carries an explicit visited set alongside the depth
//! bound; re-encountering a node is a no-op.

pub mod commons;

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::is_playable;

// Re-export for convenience
pub use commons::CommonsGraph;

/// Read-only access to the category graph.
#[async_trait]
pub trait CategoryGraph: Send + Sync {
    /// Direct subcategories of a category, without recursion.
    async fn subcategories(&self, category: &str) -> Result<Vec<String>>;

    /// File pages directly attached to a category, unfiltered by media
    /// class.
    async fn files(&self, category: &str) -> Result<Vec<String>>;
}

/// Which media class an expanded manifest should contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFilter {
    /// Audio/video by extension allow-list
    Playable,
    /// Everything that is not playable
    Image,
}

impl MediaFilter {
    fn matches(self, filename: &str) -> bool {
        match self {
            MediaFilter::Playable => is_playable(filename),
            MediaFilter::Image => !is_playable(filename),
        }
    }
}

/// Depth-bounded, cycle-safe category expansion.
pub struct Walker {
    graph: Arc<dyn CategoryGraph>,
    concurrency: usize,
}

impl Walker {
    pub fn new(graph: Arc<dyn CategoryGraph>, concurrency: usize) -> Self {
        Self {
            graph,
            concurrency: concurrency.max(1),
        }
    }

    /// All subcategories reachable within `depth` levels, deduplicated and
    /// sorted. At depth 0 this is just the category itself, without
    /// querying.
    pub async fn find_subcategories(&self, category: &str, depth: u32) -> Result<Vec<String>> {
        if depth == 0 {
            return Ok(vec![category.to_string()]);
        }

        let mut visited: HashSet<String> = HashSet::from([category.to_string()]);
        let mut found: BTreeSet<String> = BTreeSet::new();
        let mut frontier = vec![category.to_string()];

        for _ in 0..depth {
            if frontier.is_empty() {
                break;
            }

            // One level of the descent; independent queries run on a
            // bounded pool and the sorted union keeps the result
            // independent of completion order.
            let mut level = stream::iter(frontier.iter())
                .map(|cat| self.graph.subcategories(cat))
                .buffer_unordered(self.concurrency);

            let mut next_frontier = Vec::new();
            while let Some(result) = level.next().await {
                for sub in result? {
                    if visited.insert(sub.clone()) {
                        found.insert(sub.clone());
                        next_frontier.push(sub);
                    }
                }
            }
            drop(level);

            next_frontier.sort();
            frontier = next_frontier;
        }

        Ok(found.into_iter().collect())
    }

    /// Files directly attached to a category that pass the media filter,
    /// sorted.
    pub async fn media_files(&self, category: &str, filter: MediaFilter) -> Result<Vec<String>> {
        let mut files: Vec<String> = self
            .graph
            .files(category)
            .await?
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();
        files.sort();
        Ok(files)
    }

    /// The full manifest: files of the category and of every subcategory
    /// within `depth`, deduplicated and sorted lexicographically.
    ///
    /// Identical graph state always yields the identical manifest.
    pub async fn expand(
        &self,
        category: &str,
        depth: u32,
        filter: MediaFilter,
    ) -> Result<Vec<String>> {
        let mut manifest: BTreeSet<String> =
            self.media_files(category, filter).await?.into_iter().collect();

        let subcategories = self.find_subcategories(category, depth).await?;
        let mut lists = stream::iter(subcategories.iter())
            .map(|sub| self.media_files(sub, filter))
            .buffer_unordered(self.concurrency);
        while let Some(result) = lists.next().await {
            manifest.extend(result?);
        }
        drop(lists);

        Ok(manifest.into_iter().collect())
    }
}

/// Fixed in-memory graph for offline runs and tests.
#[derive(Debug, Default)]
pub struct StaticGraph {
    subcategories: std::collections::HashMap<String, Vec<String>>,
    files: std::collections::HashMap<String, Vec<String>>,
}

impl StaticGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subcategory(&mut self, parent: &str, child: &str) {
        self.subcategories
            .entry(parent.to_string())
            .or_default()
            .push(child.to_string());
    }

    pub fn add_file(&mut self, category: &str, file: &str) {
        self.files
            .entry(category.to_string())
            .or_default()
            .push(file.to_string());
    }
}

#[async_trait]
impl CategoryGraph for StaticGraph {
    async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        Ok(self.subcategories.get(category).cloned().unwrap_or_default())
    }

    async fn files(&self, category: &str) -> Result<Vec<String>> {
        Ok(self.files.get(category).cloned().unwrap_or_default())
    }
}
