// Persistent vector index over LanceDB
// Built once from the full document set, then reused as-is across runs.


use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunking::Chunk;
use crate::embeddings::Embedder;
use crate::{DocsChatError, Result};

const TABLE_NAME: &str = "chunks";

/// Fallback dimension for an index built from zero chunks, where no
/// embedding is available to detect the real one.
const DEFAULT_VECTOR_DIMENSION: usize = 768;

/// How many chunks are embedded and written per build step.
const BUILD_BATCH_SIZE: usize = 64;

/// Whether a persisted index exists at the configured location. Resolved
/// once at startup; directory presence is the sole criterion, so a stale
/// index is silently reused when documents change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    Absent,
    Present(PathBuf),
}

impl IndexState {
    #[inline]
    pub fn resolve(location: &Path) -> Self {
        if location.is_dir() {
            Self::Present(location.to_path_buf())
        } else {
            Self::Absent
        }
    }
}

/// A chunk returned by a similarity query, annotated with its 1-based
/// rank. Citation numbers downstream are derived solely from rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub rank: usize,
    pub source: String,
    pub content: String,
    pub score: f32,
}

/// Persistent similarity-search index over chunk embeddings.
pub struct VectorIndex {
    connection: Connection,
    location: PathBuf,
    embedder: Box<dyn Embedder>,
}

impl VectorIndex {
    /// Build a new index at `location` from the full chunk set, embedding
    /// every chunk and persisting it before returning. There is no
    /// partial-success mode: on any failure the location directory is
    /// removed so the caller never observes a half-built index.
    #[inline]
    pub async fn build(
        location: &Path,
        chunks: &[Chunk],
        embedder: Box<dyn Embedder>,
    ) -> Result<Self> {
        info!(
            "Building vector index at {} from {} chunks",
            location.display(),
            chunks.len()
        );

        match Self::build_inner(location, chunks, embedder).await {
            Ok(index) => Ok(index),
            Err(e) => {
                warn!("Index build failed, removing partial index: {}", e);
                if location.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(location) {
                        warn!("Failed to remove partial index directory: {}", cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    async fn build_inner(
        location: &Path,
        chunks: &[Chunk],
        embedder: Box<dyn Embedder>,
    ) -> Result<Self> {
        let connection = Self::connect(location).await?;

        if chunks.is_empty() {
            debug!("No chunks to index, creating empty table");
            let schema = create_schema(DEFAULT_VECTOR_DIMENSION);
            connection
                .create_empty_table(TABLE_NAME, schema)
                .execute()
                .await
                .map_err(|e| DocsChatError::Index(format!("Failed to create table: {}", e)))?;

            return Ok(Self {
                connection,
                location: location.to_path_buf(),
                embedder,
            });
        }

        let progress = ProgressBar::new(chunks.len() as u64);
        progress.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} chunks embedded")
                .map_err(|e| DocsChatError::Index(format!("Invalid progress template: {}", e)))?,
        );

        let mut table = None;
        let mut vector_dimension = 0;

        for batch in chunks.chunks(BUILD_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = embedder
                .embed_batch(&texts)
                .map_err(|e| DocsChatError::Embedding(format!("Failed to embed chunks: {}", e)))?;

            if embeddings.len() != batch.len() {
                return Err(DocsChatError::Embedding(format!(
                    "Embedding count mismatch: {} chunks vs {} vectors",
                    batch.len(),
                    embeddings.len()
                )));
            }

            // The vector dimension is only known once the first batch of
            // embeddings comes back.
            if table.is_none() {
                vector_dimension = embeddings
                    .first()
                    .map(Vec::len)
                    .filter(|dim| *dim > 0)
                    .ok_or_else(|| {
                        DocsChatError::Embedding(
                            "Embedding capability returned an empty vector".to_string(),
                        )
                    })?;

                let schema = create_schema(vector_dimension);
                let created = connection
                    .create_empty_table(TABLE_NAME, schema)
                    .execute()
                    .await
                    .map_err(|e| DocsChatError::Index(format!("Failed to create table: {}", e)))?;
                table = Some(created);
            }

            let record_batch = create_record_batch(batch, &embeddings, vector_dimension)?;
            let schema = record_batch.schema();
            let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

            if let Some(table) = table.as_ref() {
                table.add(reader).execute().await.map_err(|e| {
                    DocsChatError::Index(format!("Failed to insert chunk batch: {}", e))
                })?;
            }

            progress.inc(batch.len() as u64);
        }

        progress.finish_and_clear();
        info!("Vector index built and persisted at {}", location.display());

        Ok(Self {
            connection,
            location: location.to_path_buf(),
            embedder,
        })
    }

    /// Reopen a previously persisted index without recomputation. Fails if
    /// the location does not hold a usable index.
    #[inline]
    pub async fn load(location: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        debug!("Loading vector index from {}", location.display());

        let connection = Self::connect(location).await?;

        let table_names = connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to list tables: {}", e)))?;

        if !table_names.contains(&TABLE_NAME.to_string()) {
            return Err(DocsChatError::Index(format!(
                "Index at {} is missing its chunks table; delete the directory to rebuild",
                location.display()
            )));
        }

        info!("Loaded existing vector index from {}", location.display());

        Ok(Self {
            connection,
            location: location.to_path_buf(),
            embedder,
        })
    }

    async fn connect(location: &Path) -> Result<Connection> {
        if let Some(parent) = location.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DocsChatError::Index(format!("Failed to create index parent directory: {}", e))
                })?;
            }
        }

        // Plain path rather than a file:// URI: the location may be relative.
        lancedb::connect(&location.display().to_string())
            .execute()
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to open LanceDB: {}", e)))
    }

    #[inline]
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Total number of chunks persisted in the index.
    #[inline]
    pub async fn count_chunks(&self) -> Result<u64> {
        let table = self.open_table().await?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Embed the question and return up to `k` most similar chunks,
    /// best-first, with 1-based ranks. An empty index yields an empty
    /// result, not an error.
    #[inline]
    pub async fn query(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if self.count_chunks().await? == 0 {
            debug!("Index contains no chunks, returning empty result");
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(question)
            .map_err(|e| DocsChatError::Embedding(format!("Failed to embed question: {}", e)))?;

        debug!(
            "Searching for {} most similar chunks ({} dimensions)",
            k,
            query_vector.len()
        );

        let table = self.open_table().await?;

        let mut results = table
            .vector_search(query_vector.as_slice())
            .map_err(|e| DocsChatError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(k)
            .execute()
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to execute search: {}", e)))?;

        let mut retrieved = Vec::new();

        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to read result stream: {}", e)))?
        {
            parse_search_batch(&batch, &mut retrieved)?;
        }

        // Ranks are assigned from result order alone.
        for (i, chunk) in retrieved.iter_mut().enumerate() {
            chunk.rank = i + 1;
        }

        debug!("Retrieved {} chunks", retrieved.len());
        Ok(retrieved)
    }

    async fn open_table(&self) -> Result<lancedb::Table> {
        self.connection
            .open_table(TABLE_NAME)
            .execute()
            .await
            .map_err(|e| DocsChatError::Index(format!("Failed to open table: {}", e)))
    }
}

fn create_schema(vector_dim: usize) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                vector_dim as i32,
            ),
            false,
        ),
        Field::new("source", DataType::Utf8, false),
        Field::new("content", DataType::Utf8, false),
        Field::new("chunk_index", DataType::UInt32, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

fn create_record_batch(
    chunks: &[Chunk],
    embeddings: &[Vec<f32>],
    vector_dim: usize,
) -> Result<RecordBatch> {
    let len = chunks.len();
    let created_at = Utc::now().to_rfc3339();

    let mut ids = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut contents = Vec::with_capacity(len);
    let mut chunk_indices = Vec::with_capacity(len);
    let mut created_ats = Vec::with_capacity(len);

    for chunk in chunks {
        ids.push(Uuid::new_v4().to_string());
        sources.push(chunk.source().to_string());
        contents.push(chunk.content.as_str());
        chunk_indices.push(chunk.chunk_index as u32);
        created_ats.push(created_at.as_str());
    }

    let mut flat_values = Vec::with_capacity(len * vector_dim);
    for vector in embeddings {
        if vector.len() != vector_dim {
            return Err(DocsChatError::Embedding(format!(
                "Inconsistent embedding dimensions: expected {}, got {}",
                vector_dim,
                vector.len()
            )));
        }
        flat_values.extend_from_slice(vector);
    }
    let values_array = Float32Array::from(flat_values);
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let vector_array =
        FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
            .map_err(|e| DocsChatError::Index(format!("Failed to create vector array: {}", e)))?;

    let schema = create_schema(vector_dim);

    let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(ids)),
        Arc::new(vector_array),
        Arc::new(StringArray::from(sources)),
        Arc::new(StringArray::from(contents)),
        Arc::new(UInt32Array::from(chunk_indices)),
        Arc::new(StringArray::from(created_ats)),
    ];

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| DocsChatError::Index(format!("Failed to create record batch: {}", e)))
}

fn parse_search_batch(batch: &RecordBatch, out: &mut Vec<RetrievedChunk>) -> Result<()> {
    let num_rows = batch.num_rows();

    let sources = batch
        .column_by_name("source")
        .ok_or_else(|| DocsChatError::Index("Missing source column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DocsChatError::Index("Invalid source column type".to_string()))?;

    let contents = batch
        .column_by_name("content")
        .ok_or_else(|| DocsChatError::Index("Missing content column".to_string()))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DocsChatError::Index("Invalid content column type".to_string()))?;

    let distances = batch
        .column_by_name("_distance")
        .map(|col| col.as_any().downcast_ref::<Float32Array>());

    for row in 0..num_rows {
        let distance = distances
            .flatten()
            .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

        out.push(RetrievedChunk {
            rank: 0, // assigned once the full result set is collected
            source: sources.value(row).to_string(),
            content: contents.value(row).to_string(),
            score: 1.0 - distance,
        });
    }

    Ok(())
}
