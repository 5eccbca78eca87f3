//! Local knowledge store: SQLite persistence with in-memory BM25 ranking

use crate::bm25::Bm25Index;
use crate::chunk::KnowledgeChunk;
use crate::chunker::chunk_document;
use crate::source::KnowledgeSource;
use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

static TOKENIZE_RE: OnceLock<Regex> = OnceLock::new();

fn tokenize(text: &str) -> Vec<String> {
    let re = TOKENIZE_RE.get_or_init(|| Regex::new(r"[a-z][a-z0-9_]{2,}").unwrap());
    re.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone)]
struct StoredChunk {
    id: i64,
    concept: String,
    content: String,
}

/// Concept-labelled chunk store backing the retrieval boundary.
///
/// Explicit open/close lifecycle; ranking is lexical BM25 over an
/// in-memory index rebuilt whenever the table changes.
pub struct KnowledgeStore {
    conn: Connection,
    rows: Vec<StoredChunk>,
    index: Bm25Index,
}

impl KnowledgeStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY,
                concept TEXT NOT NULL,
                content TEXT NOT NULL,
                word_count INTEGER NOT NULL,
                ingested_at TEXT NOT NULL
            )",
            [],
        )?;

        let mut store = Self {
            conn,
            rows: Vec::new(),
            index: Bm25Index::new(),
        };
        store.rebuild_index()?;
        Ok(store)
    }

    /// Chunk a document and insert every window under one concept label
    pub fn ingest_document(&mut self, content: &str, concept: &str) -> Result<usize> {
        let chunks = chunk_document(content, concept);
        let inserted = chunks.len();

        for chunk in &chunks {
            self.conn.execute(
                "INSERT INTO chunks (concept, content, word_count, ingested_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    &chunk.concept,
                    &chunk.content,
                    chunk.word_count as i64,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }

        self.rebuild_index()?;
        info!(concept, chunks = inserted, "ingested document");
        Ok(inserted)
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, concept, content FROM chunks")?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredChunk {
                id: row.get(0)?,
                concept: row.get(1)?,
                content: row.get(2)?,
            })
        })?;

        let mut stored = Vec::new();
        for row in rows {
            stored.push(row?);
        }
        drop(stmt);

        let documents = stored
            .iter()
            .map(|chunk| (chunk.id, tokenize(&chunk.content)))
            .collect();
        self.index.index(documents);
        self.rows = stored;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct concept labels currently stored
    pub fn concepts(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .rows
            .iter()
            .map(|chunk| chunk.concept.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        labels.sort();
        labels
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, err)| anyhow::Error::from(err))
    }
}

impl KnowledgeSource for KnowledgeStore {
    fn retrieve(
        &self,
        query: &str,
        concept: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<KnowledgeChunk>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let allowed: Option<HashSet<i64>> = concept.map(|label| {
            self.rows
                .iter()
                .filter(|chunk| chunk.concept == label)
                .map(|chunk| chunk.id)
                .collect()
        });

        let ranked = self.index.search(&query_tokens, top_k, allowed.as_ref());
        debug!(query = %query, results = ranked.len(), "store retrieval");

        let chunks = ranked
            .into_iter()
            .filter_map(|(id, score)| {
                let row = self.rows.iter().find(|chunk| chunk.id == id)?;
                Some(KnowledgeChunk {
                    content: row.content.clone(),
                    concept: Some(row.concept.clone()),
                    score: Some(score),
                })
            })
            .collect();
        Ok(chunks)
    }
}
