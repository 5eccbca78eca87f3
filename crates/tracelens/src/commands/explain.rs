use tracelens_core::ExecutionRecord;
use tracelens_explain::{ExplainedTrace, ExplanationLevel, TraceExplainer};
use tracelens_knowledge::{KnowledgeStore, NoKnowledge};

/// Accept either a bare step array or a full execution record
fn parse_trace(raw: &str) -> anyhow::Result<ExecutionRecord> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if value.is_array() {
        return Ok(ExecutionRecord {
            output: None,
            error: None,
            trace: serde_json::from_value(value)?,
        });
    }
    Ok(serde_json::from_value(value)?)
}

pub fn run(
    code_path: &str,
    trace_path: &str,
    level: ExplanationLevel,
    top_k: usize,
    store_path: Option<&str>,
) -> anyhow::Result<()> {
    let code = std::fs::read_to_string(code_path)?;
    let record = parse_trace(&std::fs::read_to_string(trace_path)?)?;

    let explainer = TraceExplainer::new(level, top_k);
    let explained: ExplainedTrace = match store_path {
        Some(path) => {
            let store = KnowledgeStore::open(path)?;
            let explained = explainer.explain_record(&code, &record, &store)?;
            store.close()?;
            explained
        }
        None => explainer.explain_record(&code, &record, &NoKnowledge)?,
    };

    if explained.steps.is_empty() {
        println!("No trace steps to explain");
    }
    for step in &explained.steps {
        println!("Step {} (line {}): {}", step.step, step.line, step.explanation);
    }

    if let Some(output) = &explained.output {
        println!();
        println!("Output: {}", output);
    }
    if let Some(error) = &explained.error {
        println!("Error: {}", error);
    }

    Ok(())
}
