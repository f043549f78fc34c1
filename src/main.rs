use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use chunk_downloader_rs::catalog::html::HtmlCatalog;
use chunk_downloader_rs::download::assemble::{AssemblyStrategy, StreamAssembler};
use chunk_downloader_rs::download::remux::{ensure_available, CommandExecutor, ProcessExecutor};
use chunk_downloader_rs::download::segment::SegmentFetcher;
use chunk_downloader_rs::download::DownloadClient;
use chunk_downloader_rs::file::{self, default_folder, JobInput};
use chunk_downloader_rs::job::Job;
use chunk_downloader_rs::logging;
use chunk_downloader_rs::options::Options;
use chunk_downloader_rs::orchestrator::{Orchestrator, RunSummary};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[clap(subcommand)]
    subcmd: SubCmd,

    #[clap(short, long, global = true)]
    /// read options from a TOML file; flags below override it
    config: Option<PathBuf>,

    #[clap(short, long, global = true)]
    /// set the maximum number of parallel segment downloads
    parallel: Option<usize>,

    #[clap(short, long, global = true)]
    /// set the number of segments probed per batch
    batch_size: Option<u32>,

    #[clap(short, long, global = true)]
    /// set the maximum number of retries for a failing segment
    retries: Option<u32>,

    #[clap(short, long, global = true)]
    /// set the per-request timeout in seconds
    timeout: Option<u64>,

    #[clap(long, global = true)]
    /// extension of the assembled file (ts, mp4, mkv, ...)
    container: Option<String>,

    #[clap(long, global = true, value_enum)]
    /// how segments are joined; derived from the container when omitted
    strategy: Option<AssemblyStrategy>,

    #[clap(long, global = true)]
    /// path to the ffmpeg executable
    ffmpeg: Option<String>,

    #[clap(long, global = true)]
    /// replace videos that already exist
    overwrite: bool,

    #[clap(long, global = true)]
    /// assemble a stream even if it ended on a network error
    accept_truncated: bool,

    #[clap(short, long, global = true)]
    /// log batch and segment details
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Download every collection listed in a file
    File {
        #[clap(default_value = "inputs.txt")]
        /// `folder,url` lines, or a JSON list of {"folder", "url"} objects
        file: PathBuf,
    },
    /// Download one collection
    Collection {
        /// collection page url (or file:// snapshot of the rendered page)
        url: String,

        #[clap(short, long)]
        /// destination folder, defaults to the last part of the url
        folder: Option<PathBuf>,
    },
    /// Download one video by its id
    Video {
        source_id: String,

        title: String,

        #[clap(short, long, default_value = ".")]
        folder: PathBuf,
    },
}

fn build_options(args: &Args) -> Result<Options> {
    let mut options = match &args.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };

    if let Some(parallel) = args.parallel {
        options.max_parallel_downloads = parallel;
    }
    if let Some(batch_size) = args.batch_size {
        options.batch_size = batch_size;
    }
    if let Some(retries) = args.retries {
        options.max_download_retries = retries;
    }
    if let Some(timeout) = args.timeout {
        options.request_timeout_secs = timeout;
    }
    if let Some(container) = &args.container {
        options.container = container.trim_start_matches('.').to_string();
    }
    if args.strategy.is_some() {
        options.strategy = args.strategy;
    }
    if let Some(ffmpeg) = &args.ffmpeg {
        options.ffmpeg = ffmpeg.clone();
    }
    options.overwrite |= args.overwrite;
    options.accept_truncated |= args.accept_truncated;

    options.validate()?;
    Ok(options)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let options = build_options(&args)?;
    info!("Options: {:?}", options);

    let executor: Arc<dyn CommandExecutor> = Arc::new(ProcessExecutor);
    let strategy = options.strategy();
    if strategy == AssemblyStrategy::Remux {
        ensure_available(executor.as_ref(), &options.ffmpeg).await?;
    }

    let client = DownloadClient::new(options.request_timeout()).context("building http client")?;
    let fetcher = SegmentFetcher::new(client.clone(), options.retry_policy());
    let catalog = HtmlCatalog::new(client, options.catalog.clone());
    let assembler = StreamAssembler::new(strategy, executor, &options.ffmpeg);
    let orchestrator = Orchestrator::new(Arc::new(catalog), Arc::new(fetcher), assembler, options);

    let summary = match args.subcmd {
        SubCmd::File { file } => {
            let inputs = file::read_inputs(&file)?;
            orchestrator.run_inputs(&inputs).await
        }
        SubCmd::Collection { url, folder } => {
            let folder = folder.unwrap_or_else(|| PathBuf::from(default_folder(&url)));
            orchestrator.run_inputs(&[JobInput { folder, url }]).await
        }
        SubCmd::Video { source_id, title, folder } => {
            tokio::fs::create_dir_all(&folder)
                .await
                .with_context(|| format!("creating {}", folder.display()))?;
            let mut summary = RunSummary::default();
            orchestrator
                .record(&Job::new(&source_id, &title, &folder), &mut summary)
                .await;
            summary
        }
    };

    info!(
        "Finished: {} created, {} skipped, {} failed",
        summary.completed, summary.skipped, summary.failed
    );

    Ok(())
}
