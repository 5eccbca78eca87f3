use std::path::Path;
use tracelens_knowledge::KnowledgeStore;

fn concept_for(file: &str, override_label: Option<&str>) -> String {
    if let Some(label) = override_label {
        return label.to_string();
    }
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn run(store_path: &str, concept: Option<&str>, files: &[String]) -> anyhow::Result<()> {
    if files.is_empty() {
        println!("No files provided");
        return Ok(());
    }

    let mut store = KnowledgeStore::open(store_path)?;
    let mut total = 0;

    for file in files {
        let content = std::fs::read_to_string(file)?;
        let label = concept_for(file, concept);
        let inserted = store.ingest_document(&content, &label)?;
        println!("  {}: {} chunks as '{}'", file, inserted, label);
        total += inserted;
    }

    println!(
        "Ingested {} chunks into {} ({} total)",
        total,
        store_path,
        store.len()
    );
    store.close()?;
    Ok(())
}
