//! Integration test: catalog entry to assembled file over a local HTTP server.

mod common;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chunk_downloader_rs::catalog::html::HtmlCatalog;
use chunk_downloader_rs::download::assemble::{AssemblyStrategy, StreamAssembler};
use chunk_downloader_rs::download::remux::ProcessExecutor;
use chunk_downloader_rs::download::segment::SegmentFetcher;
use chunk_downloader_rs::download::DownloadClient;
use chunk_downloader_rs::file::JobInput;
use chunk_downloader_rs::job::Job;
use chunk_downloader_rs::options::{EndpointConfig, Options};
use chunk_downloader_rs::orchestrator::{JobOutcome, Orchestrator, RunSummary};
use common::segment_server::{self, chunk, Routes};
use tempfile::tempdir;

fn routes_for(source_id: &str, count: u32) -> Routes {
    (1..=count).fold(Routes::default(), |routes, i| {
        routes.body(&format!("/{}/HIDDEN4500-{:05}.ts", source_id, i), chunk(i))
    })
}

fn orchestrator(base: &str) -> Orchestrator {
    let options = Options {
        batch_size: 20,
        retry_base_delay_ms: 10,
        endpoint: EndpointConfig {
            base_url: base.to_string(),
            ..EndpointConfig::default()
        },
        ..Options::default()
    };
    let client = DownloadClient::new(Duration::from_secs(5)).unwrap();
    let fetcher = SegmentFetcher::new(client.clone(), options.retry_policy());
    let catalog = HtmlCatalog::new(client, options.catalog.clone());
    let assembler = StreamAssembler::new(AssemblyStrategy::Concat, Arc::new(ProcessExecutor), "ffmpeg");
    Orchestrator::new(Arc::new(catalog), Arc::new(fetcher), assembler, options)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn forty_five_chunks_across_three_batches() {
    let base = segment_server::start(routes_for("vid45", 45));
    let dir = tempdir().unwrap();
    let job = Job::new("vid45", "Lesson: One", dir.path());

    let outcome = orchestrator(&base).run_job(&job).await.unwrap();

    let expected: Vec<u8> = (1..=45).flat_map(chunk).collect();
    match outcome {
        JobOutcome::Created { path, size, segments } => {
            assert_eq!(segments, 45);
            assert_eq!(size, expected.len() as u64);
            assert_eq!(std::fs::read(path).unwrap(), expected);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(file_names(dir.path()), vec!["Lesson -  One.ts".to_string()]);
}

#[tokio::test]
async fn first_chunk_missing_produces_nothing() {
    let base = segment_server::start(Routes::default());
    let dir = tempdir().unwrap();
    let job = Job::new("gone", "Nothing", dir.path());

    assert!(orchestrator(&base).run_job(&job).await.is_err());
    assert!(file_names(dir.path()).is_empty());
}

#[tokio::test]
async fn collection_page_drives_every_video() {
    let page = r#"<html><body>
        <div id="BrVidRow-aa"><div class="css-1mkvlph">Alpha</div></div>
        <div id="BrVidRow-bb"><div class="css-1mkvlph">Beta</div></div>
    </body></html>"#;
    let routes = routes_for("aa", 3)
        .body("/collection/guard", page.as_bytes().to_vec());
    let routes = (1..=2).fold(routes, |r, i| r.body(&format!("/bb/HIDDEN4500-{:05}.ts", i), chunk(i)));
    let base = segment_server::start(routes);
    let root = tempdir().unwrap();
    let folder = root.path().join("Guard");

    let summary = orchestrator(&base)
        .run_inputs(&[JobInput { folder: folder.clone(), url: format!("{}/collection/guard", base) }])
        .await;

    assert_eq!(summary, RunSummary { completed: 2, skipped: 0, failed: 0 });
    assert_eq!(file_names(&folder), vec!["1. Alpha.ts".to_string(), "2. Beta.ts".to_string()]);
    assert_eq!(
        std::fs::read(folder.join("2. Beta.ts")).unwrap(),
        [chunk(1), chunk(2)].concat()
    );
}

#[tokio::test]
async fn commentary_collection_uses_folder_name() {
    let base = segment_server::start(routes_for("c0ffee", 4));
    let root = tempdir().unwrap();
    let folder = root.path().join("Breakdown");

    let summary = orchestrator(&base)
        .run_inputs(&[JobInput {
            folder: folder.clone(),
            url: "https://example.com/commentaries/c0ffee".into(),
        }])
        .await;

    assert_eq!(summary.completed, 1);
    assert_eq!(file_names(&folder), vec!["Breakdown.ts".to_string()]);
}
