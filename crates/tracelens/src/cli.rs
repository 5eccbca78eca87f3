use clap::{Parser, Subcommand};
use tracelens_explain::ExplanationLevel;

#[derive(Parser)]
#[command(name = "tracelens")]
#[command(version)]
#[command(about = "Grounded step-by-step explanations for execution traces")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explain a recorded execution trace step by step
    Explain {
        /// Path to the traced program's source file
        #[arg(short, long)]
        code: String,

        /// Path to the trace JSON (a step array or an execution record)
        #[arg(short, long)]
        trace: String,

        /// Explanation level: beginner, medium, interview_ready
        #[arg(short, long, default_value = "medium")]
        level: ExplanationLevel,

        /// Knowledge chunks requested per step
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Knowledge store database; omit to explain without retrieval
        #[arg(long)]
        store: Option<String>,
    },

    /// Ingest reference documents into a knowledge store
    Ingest {
        /// Knowledge store database path
        #[arg(long)]
        store: String,

        /// Concept label for every file (defaults to each file's stem)
        #[arg(long)]
        concept: Option<String>,

        /// Markdown or plain-text files to ingest
        files: Vec<String>,
    },

    /// Query a knowledge store directly
    Retrieve {
        /// Knowledge store database path
        #[arg(long)]
        store: String,

        /// Free-text query
        query: String,

        /// Number of chunks to return
        #[arg(long, default_value_t = 3)]
        top_k: usize,

        /// Restrict results to one concept label
        #[arg(long)]
        concept: Option<String>,
    },

    /// Print version information
    Version,
}
