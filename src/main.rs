use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ragkb::config::Config;
use ragkb::corpus::format_context;

#[derive(Parser)]
#[command(name = "ragkb", version, about = "Embedding search over a small RAG knowledge base")]
struct Cli {
    /// Directory holding .ragkb/config.toml (default: current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank documents against a query and print them as JSON
    Query {
        /// Natural language query
        query: String,
        /// Number of documents to return
        #[arg(long)]
        top_k: Option<usize>,
        /// Include similarity scores
        #[arg(long)]
        scores: bool,
    },
    /// Print the prompt context block for a question
    Context {
        /// The question to retrieve context for
        question: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// List the configured documents
    Documents,
    /// Write a default config file
    Init,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("resolving current directory")?,
    };

    match cli.command {
        Commands::Query {
            query,
            top_k,
            scores,
        } => run_query(&root, &query, top_k, scores),
        Commands::Context { question, top_k } => run_context(&root, &question, top_k),
        Commands::Documents => {
            let config = Config::load(&root)?;
            let corpus = config.load_corpus(&root)?;
            for doc in corpus.documents() {
                println!("{}\t{}", doc.id, doc.title);
            }
            Ok(())
        }
        Commands::Init => {
            Config::default().save(&root)?;
            println!("wrote {}", Config::path(&root).display());
            Ok(())
        }
    }
}

fn run_query(root: &Path, query: &str, top_k: Option<usize>, scores: bool) -> Result<()> {
    let config = Config::load(root)?;
    let retriever = config.retriever(root)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let json = if scores {
        let ranked = retriever.rank(query, top_k).context("ranking documents")?;
        serde_json::to_string_pretty(&ranked)?
    } else {
        let docs = retriever
            .most_relevant(query, top_k)
            .context("ranking documents")?;
        serde_json::to_string_pretty(&docs)?
    };
    println!("{json}");
    Ok(())
}

fn run_context(root: &Path, question: &str, top_k: Option<usize>) -> Result<()> {
    let config = Config::load(root)?;
    let retriever = config.retriever(root)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let docs = retriever
        .most_relevant(question, top_k)
        .context("retrieving context")?;
    println!("{}", format_context(&docs));
    Ok(())
}
