//! Category graph backed by a wiki database replica.
//!
//! Categories link to their members through `categorylinks`; member titles
//! live in `page`. File pages are namespace 6, subcategory links carry
//! `cl_type = 'subcat'`. Titles are stored underscored and binary.

use async_trait::async_trait;
use sqlx::mysql::MySqlPool;

use crate::error::Result;
use crate::store::keys;

use super::CategoryGraph;

const SUBCATEGORY_SQL: &str = "select page_title from categorylinks \
     join page on cl_from = page_id \
     where cl_to = ? and cl_type = 'subcat'";

const FILES_SQL: &str = "select page_title from page \
     join categorylinks on cl_from = page_id \
     where page_namespace = 6 and cl_to = ?";

/// Pooled connection to the replica's category tables.
pub struct CommonsGraph {
    pool: MySqlPool,
}

impl CommonsGraph {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    async fn titles(&self, sql: &str, category: &str) -> Result<Vec<String>> {
        let rows: Vec<Vec<u8>> = sqlx::query_scalar(sql)
            .bind(keys::normalize(category))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|title| String::from_utf8_lossy(&title).into_owned())
            .collect())
    }
}

#[async_trait]
impl CategoryGraph for CommonsGraph {
    async fn subcategories(&self, category: &str) -> Result<Vec<String>> {
        self.titles(SUBCATEGORY_SQL, category).await
    }

    async fn files(&self, category: &str) -> Result<Vec<String>> {
        self.titles(FILES_SQL, category).await
    }
}
