//! BM25 ranking over tokenized chunks

use std::collections::{HashMap, HashSet};

const K1: f64 = 1.5;
const B: f64 = 0.75;

#[derive(Debug, Clone)]
struct IndexedDoc {
    id: i64,
    len: usize,
    term_freq: HashMap<String, usize>,
}

/// In-memory BM25 index keyed by chunk id
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    avg_doc_len: f64,
    docs: Vec<IndexedDoc>,
    idf: HashMap<String, f64>,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Replace the index contents with the given (id, tokens) documents
    pub fn index(&mut self, documents: Vec<(i64, Vec<String>)>) {
        self.docs.clear();
        self.idf.clear();
        self.avg_doc_len = 0.0;

        if documents.is_empty() {
            return;
        }

        let doc_count = documents.len();
        let mut total_len = 0usize;
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for (id, tokens) in documents {
            total_len += tokens.len();

            let mut term_freq: HashMap<String, usize> = HashMap::new();
            for token in tokens {
                *term_freq.entry(token).or_insert(0) += 1;
            }
            for term in term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }

            self.docs.push(IndexedDoc {
                id,
                len: term_freq.values().sum(),
                term_freq,
            });
        }

        self.avg_doc_len = total_len as f64 / doc_count as f64;

        for (term, df) in doc_freq {
            let idf = ((doc_count as f64 - df as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln();
            self.idf.insert(term, idf);
        }
    }

    /// Top `k` chunk ids by BM25 score, optionally restricted to an
    /// allowed id set. Zero-score documents are not returned.
    pub fn search(
        &self,
        query_tokens: &[String],
        k: usize,
        allowed: Option<&HashSet<i64>>,
    ) -> Vec<(i64, f64)> {
        if self.docs.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<(i64, f64)> = self
            .docs
            .iter()
            .filter(|doc| allowed.map(|ids| ids.contains(&doc.id)).unwrap_or(true))
            .map(|doc| (doc.id, self.score(doc, query_tokens)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        scores
    }

    fn score(&self, doc: &IndexedDoc, query_tokens: &[String]) -> f64 {
        let doc_len = doc.len as f64;
        let mut score = 0.0;

        for term in query_tokens {
            let Some(&idf) = self.idf.get(term) else {
                continue;
            };
            let tf = doc.term_freq.get(term).copied().unwrap_or(0) as f64;
            if tf == 0.0 {
                continue;
            }
            let norm = tf + K1 * (1.0 - B + B * doc_len / self.avg_doc_len);
            score += idf * tf * (K1 + 1.0) / norm;
        }

        score
    }
}
