//! pgvector (PostgreSQL) vector store backend.
//!
//! Provides [`PgVectorStore`] which implements [`VectorStore`] using
//! [sqlx](https://docs.rs/sqlx) with the
//! [pgvector](https://github.com/pgvector/pgvector) PostgreSQL extension.
//! All chunks live in one `documents` table with a `(doc_id, chunk_id)`
//! primary key, so upserts replace on conflict and re-ingestion never
//! duplicates rows.
//!
//! This module is only available when the `pgvector` feature is enabled.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by PostgreSQL with the pgvector extension.
pub struct PgVectorStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgVectorStore {
    /// Connect to the given database URL.
    ///
    /// `dimensions` must match the embedding provider in use; it fixes the
    /// width of the `embedding` column when [`init`](PgVectorStore::init)
    /// creates the table.
    pub async fn connect(database_url: &str, dimensions: usize) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(Self::map_err)?;
        Ok(Self { pool, dimensions })
    }

    /// Create a store from an existing connection pool.
    pub fn from_pool(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    fn map_err(e: sqlx::Error) -> RagError {
        RagError::Store { backend: "pgvector".to_string(), message: e.to_string() }
    }

    /// Ensure the pgvector extension and the `documents` table exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS documents (\
                doc_id TEXT NOT NULL, \
                chunk_id INTEGER NOT NULL, \
                content TEXT NOT NULL, \
                embedding vector({}), \
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
                PRIMARY KEY (doc_id, chunk_id)\
            )",
            self.dimensions
        );
        sqlx::query(&create_sql).execute(&self.pool).await.map_err(Self::map_err)?;

        debug!(dimensions = self.dimensions, "initialized pgvector documents table");
        Ok(())
    }

    /// Render an embedding in pgvector's `[x,y,z]` literal form.
    fn embedding_literal(embedding: &[f32]) -> String {
        format!("[{}]", embedding.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","))
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn upsert(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let upsert_sql = "INSERT INTO documents (doc_id, chunk_id, content, embedding, metadata) \
             VALUES ($1, $2, $3, $4::vector, $5::jsonb) \
             ON CONFLICT (doc_id, chunk_id) DO UPDATE SET \
                content = EXCLUDED.content, \
                embedding = EXCLUDED.embedding, \
                metadata = EXCLUDED.metadata";

        for chunk in chunks {
            let metadata_json =
                serde_json::to_string(&chunk.metadata).unwrap_or_else(|_| "{}".to_string());

            sqlx::query(upsert_sql)
                .bind(&chunk.doc_id)
                .bind(chunk.chunk_id as i32)
                .bind(&chunk.content)
                .bind(Self::embedding_literal(&chunk.embedding))
                .bind(&metadata_json)
                .execute(&self.pool)
                .await
                .map_err(Self::map_err)?;
        }

        debug!(count = chunks.len(), "upserted chunks to pgvector");
        Ok(())
    }

    async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        // pgvector cosine distance operator: <=>
        // Returns distance (0 = identical), so score = 1 - distance.
        let search_sql = "SELECT doc_id, chunk_id, content, metadata, \
                    1 - (embedding <=> $1::vector) AS score \
             FROM documents \
             ORDER BY embedding <=> $1::vector \
             LIMIT $2";

        let rows = sqlx::query(search_sql)
            .bind(Self::embedding_literal(embedding))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::map_err)?;

        let results = rows
            .iter()
            .map(|row| {
                let doc_id: String = row.get("doc_id");
                let chunk_id: i32 = row.get("chunk_id");
                let content: String = row.get("content");
                let score: f64 = row.get("score");
                let metadata_value: serde_json::Value = row.get("metadata");
                let metadata: HashMap<String, String> = metadata_value
                    .as_object()
                    .map(|obj| {
                        obj.iter()
                            .filter_map(|(key, value)| {
                                value.as_str().map(|s| (key.clone(), s.to_string()))
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                SearchResult {
                    chunk: Chunk {
                        doc_id,
                        chunk_id: chunk_id as u32,
                        content,
                        embedding: Vec::new(),
                        metadata,
                    },
                    score: score as f32,
                }
            })
            .collect();

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(Self::map_err)?;
        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}
