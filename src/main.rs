use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use lsrag_cli::{
    demo_section, display_banner, handle_input_with_history, print_connection,
    print_corpus_summary, print_help, print_query_header, print_query_report, print_stats,
    print_turn_event,
};
use lsrag_core::{AgentGateway, Ranker};
use lsrag_llama::{LlamaStackClient, LlamaStackConfig};
use lsrag_rag::{
    CorpusLoader, LexicalRanker, PipelineConfig, RagPipeline, RankerKind, RemoteScoringRanker,
    ResponseCache,
};

const SAMPLE_QUERY: &str = "When is the demo on AI agents?";

#[derive(Parser)]
#[command(name = "lsrag")]
#[command(about = "Retrieval-augmented answers from a Llama Stack agent", long_about = None)]
struct Cli {
    /// Documents to retrieve from (overrides RAG_CORPUS_FILES)
    files: Vec<PathBuf>,

    /// Answer a single query and exit
    #[arg(short, long)]
    query: Option<String>,

    /// Number of documents placed in the prompt
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Ranking strategy: lexical or remote
    #[arg(long)]
    ranker: Option<RankerKind>,

    /// Directory holding response_cache.json
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Always ask the model, even for cached queries
    #[arg(long)]
    no_cache: bool,

    /// Pause between demo steps
    #[arg(long)]
    step: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut PipelineConfig) {
        if !self.files.is_empty() {
            config.corpus_files = self.files.clone();
        }
        if let Some(top_k) = self.top_k {
            config.top_k = top_k;
        }
        if let Some(ranker) = self.ranker {
            config.ranker = ranker;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        if self.no_cache {
            config.use_cache = false;
        }
    }

    /// Live turn events are narrated only in the interactive demo; `--query` prints the answer once
    fn streams_events(&self) -> bool {
        self.query.is_none()
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "lsrag=debug,lsrag_rag=debug,lsrag_llama=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = PipelineConfig::from_env()?;
    cli.apply(&mut config);

    // Connect to the model server; failure here is fatal
    let llama_config = LlamaStackConfig::from_env()?;
    print_connection(&llama_config.base_url);
    let mut client = LlamaStackClient::new(llama_config)?;
    client
        .connect()
        .await
        .with_context(|| format!("could not register agent at {}", client.base_url()))?;
    let client = Arc::new(client);
    let session = client
        .create_session(&config.session_label)
        .await
        .context("could not create agent session")?;

    let ranker: Box<dyn Ranker> = match config.ranker {
        RankerKind::Lexical => Box::new(LexicalRanker::new()),
        RankerKind::Remote => Box::new(RemoteScoringRanker::new(client.clone())),
    };

    let mut pipeline = RagPipeline::new(
        client.clone(),
        session,
        ranker,
        CorpusLoader::new(&config.corpus_files),
        ResponseCache::in_dir(&config.cache_dir),
    )?
    .with_top_k(config.top_k)
    .with_cache_lookup(config.use_cache);
    if cli.streams_events() {
        pipeline = pipeline.with_event_observer(Box::new(print_turn_event));
    }

    print_corpus_summary(pipeline.corpus());

    if let Some(query) = cli.query {
        let report = pipeline.answer(&query).await;
        println!("{}", report.outcome.text());
        return Ok(());
    }

    display_banner();
    println!("{}", "Running a sample query to demonstrate the system...".white());
    demo_query(&mut pipeline, SAMPLE_QUERY, cli.step).await?;
    println!(
        "\n{}",
        "Demo initialized successfully! Type your own queries, or 'help' for commands.".yellow()
    );

    let mut history = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            "help" => print_help(),
            "stats" => print_stats(
                pipeline.corpus(),
                pipeline.cache().len(),
                pipeline.ranker_name(),
                pipeline.top_k(),
            ),
            _ => demo_query(&mut pipeline, &input, cli.step).await?,
        }
    }

    Ok(())
}

/// Run a query and explain each step
async fn demo_query<G: AgentGateway>(
    pipeline: &mut RagPipeline<G>,
    query: &str,
    step: bool,
) -> Result<()> {
    print_query_header(query);
    if step {
        demo_section("Retrieve, prompt and generate", true)?;
    }

    let report = pipeline.answer(query).await;
    print_query_report(&report, pipeline.corpus());

    Ok(())
}
