use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use ragdb_cli::pipeline::{demo_documents, demo_settings, DEMO_QUERY};
use ragdb_cli::{Command, Pipeline};
use ragdb_core::chunking::{Chunker, FixedChunker};
use ragdb_core::config::Config;
use ragdb_core::settings::Settings;
use ragdb_core::types::ScoredCandidate;
use ragdb_generate::{ChatCompletionsGenerator, InferenceEngine};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(1);
        }
    };
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let settings = Settings::from_config(&config)?;

    match command {
        Command::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| {
                let dir: String = config.get("data.raw_txt_dir").unwrap_or_else(|_| "data/txt".to_string());
                ragdb_core::config::expand_path(dir)
            });
            ingest(settings, dir).await?;
        }
        Command::Query { text } => {
            let pipeline = Pipeline::build(settings).await?;
            print_results(&pipeline.retrieve(&text).await?);
        }
        Command::Ask { text } => {
            let pipeline = Pipeline::build(settings).await?;
            let docs = pipeline.retrieve(&text).await?;
            print_results(&docs);
            let engine = InferenceEngine::new(Arc::new(ChatCompletionsGenerator::from_config(&pipeline.settings().generation)?));
            println!("\n{}", engine.answer(&text, &docs).await?);
        }
        Command::Demo => demo(settings).await?,
    }
    Ok(())
}

async fn ingest(settings: Settings, dir: PathBuf) -> anyhow::Result<()> {
    println!("Ingesting from {}", dir.display());
    if settings.store.is_memory() {
        tracing::warn!("store.uri is :memory:; indexed chunks are dropped when the process exits");
    }
    let pipeline = Pipeline::build(settings).await?;
    let chunks = pipeline.chunker()?.process_directory(&dir)?;
    if chunks.is_empty() {
        println!("No chunks to index");
        return Ok(());
    }
    let pb = ProgressBar::new(chunks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")?
            .progress_chars("#>-"),
    );
    let indexed = pipeline.ingest(&chunks, |done, _| pb.set_position(done as u64)).await?;
    pb.finish_and_clear();
    println!("Ingest complete ({indexed} chunks, {} in store)", pipeline.store().count().await?);
    Ok(())
}

async fn demo(settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::build(demo_settings(settings)).await?;
    let chunks = FixedChunker::default().chunk(&demo_documents())?;
    pipeline.ingest(&chunks, |_, _| {}).await?;
    println!("Indexed {} sample chunks\n", chunks.len());

    println!("Query: {DEMO_QUERY}");
    let docs = pipeline.retrieve(DEMO_QUERY).await?;
    print_results(&docs);

    let answer = match ChatCompletionsGenerator::from_config(&pipeline.settings().generation) {
        Ok(generator) => InferenceEngine::new(Arc::new(generator)).answer(DEMO_QUERY, &docs).await,
        Err(e) => Err(e),
    };
    match answer {
        Ok(answer) => println!("\nAnswer: {answer}"),
        Err(e) => {
            tracing::warn!(error = %e, "generation skipped");
            println!("\n(generation skipped: {e})");
        }
    }
    Ok(())
}

fn print_results(results: &[ScoredCandidate]) {
    if results.is_empty() {
        println!("No results");
        return;
    }
    for (rank, hit) in results.iter().enumerate() {
        let rerank = hit.rerank_score.map(|s| format!(" rerank={s:.4}")).unwrap_or_default();
        println!(
            "{:>2}. [{} p{}] score={:.5}{rerank} ({})",
            rank + 1,
            hit.meta_str("source").unwrap_or_default(),
            hit.meta_str("page_label").unwrap_or_default(),
            hit.score,
            hit.stage,
        );
        println!("    {}", hit.text);
    }
}
