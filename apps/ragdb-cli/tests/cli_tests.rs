use std::path::PathBuf;

use ragdb_cli::pipeline::{demo_documents, demo_settings, DEMO_QUERY};
use ragdb_cli::{Command, Pipeline};
use ragdb_core::chunking::{Chunker, FixedChunker};
use ragdb_core::settings::Settings;
use ragdb_core::Error;

fn args(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

#[test]
fn parses_commands() {
    assert_eq!(Command::parse(&args(&["demo"])), Ok(Command::Demo));
    assert_eq!(Command::parse(&args(&["ingest"])), Ok(Command::Ingest { dir: None }));
    assert_eq!(Command::parse(&args(&["ingest", "data/txt"])), Ok(Command::Ingest { dir: Some(PathBuf::from("data/txt")) }));
    assert_eq!(
        Command::parse(&args(&["query", "net", "income"])),
        Ok(Command::Query { text: "net income".to_string() })
    );
    assert_eq!(Command::parse(&args(&["ask", "What was it?"])), Ok(Command::Ask { text: "What was it?".to_string() }));
}

#[test]
fn rejects_bad_invocations() {
    assert!(Command::parse(&[]).is_err());
    assert!(Command::parse(&args(&["query"])).is_err());
    let err = Command::parse(&args(&["serve"])).unwrap_err();
    assert!(err.contains("Unknown command: serve"));
}

#[tokio::test]
async fn demo_pipeline_ranks_the_income_snippet_first() -> anyhow::Result<()> {
    let pipeline = Pipeline::build(demo_settings(Settings::default())).await?;
    let chunks = FixedChunker::default().chunk(&demo_documents())?;
    assert_eq!(pipeline.ingest(&chunks, |_, _| {}).await?, 3);

    let docs = pipeline.retrieve(DEMO_QUERY).await?;
    assert!(!docs.is_empty() && docs.len() <= 3);
    assert!(docs[0].text.starts_with("Net Income for 2023"));
    Ok(())
}

#[tokio::test]
async fn mismatched_dimensions_fail_at_build() {
    let mut settings = demo_settings(Settings::default());
    settings.store.dense_dim = 128;
    let err = Pipeline::build(settings).await.err().expect("build fails");
    assert!(matches!(err, Error::Configuration(_)));
}
