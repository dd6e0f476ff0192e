use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use taskrag::{
    AnswerGenerator, AzureArgs, AzureChatProvider, AzureEmbedder, MemoryStore, PgStore,
    RagOptions, RecordKind, TaskIndexer, TaskSnapshot, VectorStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "task-rag",
    about = "Index tasks as embeddings and answer questions about them with Azure OpenAI"
)]
struct TaskRagCli {
    /// Postgres connection string (postgres://...); omit to use an in-memory store
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Schema holding the tasks and task_embeddings tables
    #[arg(long, env = "TASKRAG_SCHEMA", default_value = "public")]
    schema: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question using the most relevant stored tasks
    Ask {
        /// Question to answer
        #[arg(long)]
        query: String,

        #[command(flatten)]
        azure: AzureArgs,

        /// Candidates kept after similarity ranking
        #[arg(long, default_value_t = 10)]
        top_k: usize,

        /// Maximum tokens to request from the completion model
        #[arg(long, default_value_t = 500)]
        max_completion_tokens: usize,

        /// Only print the rendered context (skip LLM call)
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Embed and store tasks read from a JSONL file (one task per line)
    Index {
        /// Path to the task JSONL file
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        azure: AzureArgs,
    },
    /// Remove a task and its embedding
    Forget {
        /// Task identifier
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = TaskRagCli::parse();
    let store: Arc<dyn VectorStore> = match cli.database_url.as_deref() {
        Some(url) => {
            let store = PgStore::connect(url, &cli.schema)
                .await
                .context("failed to connect to Postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare task tables")?;
            Arc::new(store)
        }
        None => {
            warn!("no --database-url given; tasks are kept in memory for this run only");
            Arc::new(MemoryStore::new())
        }
    };

    match cli.command {
        Command::Ask {
            query,
            azure,
            top_k,
            max_completion_tokens,
            dry_run,
        } => {
            let options = RagOptions {
                top_k,
                max_completion_tokens,
                ..RagOptions::default()
            };
            options.validate()?;
            let config = azure.build_config()?;
            let embedder = Arc::new(AzureEmbedder::new(&config)?);
            let completions = Arc::new(AzureChatProvider::new(&config)?);
            let generator = AnswerGenerator::new(embedder, store, completions, options);
            if dry_run {
                let context = generator.retrieve_context(&query).await?;
                println!("--- Retrieved Context ---\n{context}");
                println!("dry-run enabled; skipping LLM call.");
                return Ok(());
            }
            let answer = generator.answer(Some(&query)).await;
            println!("{answer}");
        }
        Command::Index { input, azure } => {
            let config = azure.build_config()?;
            let embedder = Arc::new(AzureEmbedder::new(&config)?);
            let indexer = TaskIndexer::new(embedder, store);
            index_file(&indexer, &input).await?;
        }
        Command::Forget { id } => {
            store.delete_embedding(id, &RecordKind::Task).await?;
            store.delete_task(id).await?;
            println!("removed task {id}");
        }
    }
    Ok(())
}

async fn index_file(indexer: &TaskIndexer, path: &PathBuf) -> Result<()> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open {:?}", path))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;
    let mut indexed = 0usize;
    let mut failed = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .with_context(|| format!("failed to read line {}", line_no + 1))?
    {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let task: TaskSnapshot = serde_json::from_str(&line)
            .with_context(|| format!("invalid task at line {}", line_no))?;
        match indexer.index_task(&task).await {
            Ok(_) => indexed += 1,
            Err(err) => {
                failed += 1;
                eprintln!("task {} (line {}) not indexed: {}", task.id, line_no, err);
            }
        }
    }
    println!(
        "indexed {} task{} ({} failed)",
        indexed,
        if indexed == 1 { "" } else { "s" },
        failed
    );
    if indexed == 0 && failed > 0 {
        bail!("no tasks were indexed");
    }
    Ok(())
}
