use tracelens_knowledge::{clean_content, KnowledgeSource, KnowledgeStore};

const SUMMARY_LENGTH: usize = 250;

pub fn run(
    store_path: &str,
    query: &str,
    top_k: usize,
    concept: Option<&str>,
) -> anyhow::Result<()> {
    let store = KnowledgeStore::open(store_path)?;
    let chunks = store.retrieve(query, concept, top_k)?;

    if chunks.is_empty() {
        println!("No results for '{}'", query);
        store.close()?;
        return Ok(());
    }

    for (i, chunk) in chunks.iter().enumerate() {
        let label = chunk.concept.as_deref().unwrap_or("-");
        let score = chunk.score.unwrap_or(0.0);
        let summary = clean_content(&chunk.content, Some(SUMMARY_LENGTH));
        println!("{}. [{}] ({:.3}) {}", i + 1, label, score, summary);
    }

    store.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieve_against_seeded_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("kb.db");

        let mut store = KnowledgeStore::open(&db).unwrap();
        store
            .ingest_document("Loops allow repeating work over a sequence.", "iteration")
            .unwrap();
        store.close().unwrap();

        assert!(run(db.to_str().unwrap(), "loops", 3, None).is_ok());
        assert!(run(db.to_str().unwrap(), "nothing-matches-this", 3, None).is_ok());
    }
}
