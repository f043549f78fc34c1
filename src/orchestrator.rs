use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use url::Url;

use crate::catalog::{single_item_entry, CatalogEntry, CatalogSource};
use crate::download::assemble::StreamAssembler;
use crate::download::segment::SegmentSource;
use crate::download::sequencer::{SegmentSequencer, StreamEnd};
use crate::error::{CatalogError, JobError};
use crate::file::JobInput;
use crate::job::Job;
use crate::options::Options;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub enum JobOutcome {
    Created { path: PathBuf, size: u64, segments: usize },
    AlreadyExists(PathBuf),
}

/// Runs jobs one after another; a failing job never stops the run.
pub struct Orchestrator {
    catalog: Arc<dyn CatalogSource>,
    sequencer: SegmentSequencer,
    assembler: StreamAssembler,
    options: Options,
}

impl Orchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        source: Arc<dyn SegmentSource>,
        assembler: StreamAssembler,
        options: Options,
    ) -> Self {
        let sequencer = SegmentSequencer::new(
            source,
            options.locator(),
            options.batch_size,
            options.max_parallel_downloads,
        );

        Self {
            catalog,
            sequencer,
            assembler,
            options,
        }
    }

    pub async fn run_inputs(&self, inputs: &[JobInput]) -> RunSummary {
        let mut summary = RunSummary::default();

        for input in inputs {
            let entries = match self.prepare(input).await {
                Ok(entries) => entries,
                Err(err) => {
                    error!("Skipping collection {} -> {}: {}", input.url, input.folder.display(), err);
                    summary.failed += 1;
                    continue;
                }
            };

            info!("{} videos in {}", entries.len(), input.url);

            for entry in entries {
                let job = Job::new(&entry.source_id, &entry.title, &input.folder);
                self.record(&job, &mut summary).await;
            }
        }

        summary
    }

    /// Runs a single job and folds its result into `summary`.
    pub async fn record(&self, job: &Job, summary: &mut RunSummary) {
        match self.run_job(job).await {
            Ok(JobOutcome::Created { .. }) => summary.completed += 1,
            Ok(JobOutcome::AlreadyExists(path)) => {
                info!("File {} already exists, therefore skipping download", path.display());
                summary.skipped += 1;
            }
            Err(err) => {
                error!(
                    "Abandoning video '{}' ({}): {}",
                    job.display_title, job.source_id, err
                );
                summary.failed += 1;
            }
        }
    }

    async fn prepare(&self, input: &JobInput) -> Result<Vec<CatalogEntry>, PrepareError> {
        tokio::fs::create_dir_all(&input.folder).await?;

        let url = Url::parse(&input.url).map_err(|_| CatalogError::InvalidUrl(input.url.clone()))?;
        let folder_name = input
            .folder
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| input.folder.display().to_string());

        if let Some(entry) = single_item_entry(&url, &self.options.catalog.single_item_marker, &folder_name) {
            return Ok(vec![entry]);
        }

        Ok(self.catalog.entries(&url).await?)
    }

    pub async fn run_job(&self, job: &Job) -> Result<JobOutcome, JobError> {
        let output = job.output_path(&self.options.container);
        if !self.options.overwrite && tokio::fs::try_exists(&output).await? {
            return Ok(JobOutcome::AlreadyExists(output));
        }

        info!("Downloading video '{}' with ID: {}", job.display_title, job.source_id);

        let work_dir = job.work_dir();
        tokio::fs::create_dir_all(&work_dir).await?;

        let result = self.fetch_and_assemble(job, &work_dir, &output).await;
        remove_work_dir(&work_dir).await;

        result
    }

    async fn fetch_and_assemble(&self, job: &Job, work_dir: &Path, output: &Path) -> Result<JobOutcome, JobError> {
        let sequence = self.sequencer.run(&job.source_id, work_dir).await?;

        if let StreamEnd::Errored { index, error } = sequence.end {
            if !self.options.accept_truncated || sequence.segments.is_empty() {
                return Err(JobError::Truncated { index, source: error });
            }
            warn!(
                "Stream {} may be truncated: segment {} failed ({}), assembling {} segments anyway",
                job.source_id,
                index,
                error,
                sequence.segments.len()
            );
        }

        if sequence.segments.is_empty() {
            return Err(JobError::Empty {
                source_id: job.source_id.clone(),
            });
        }

        let assembled = self.assembler.assemble(&sequence.segments, work_dir, output).await?;

        Ok(JobOutcome::Created {
            path: assembled.path,
            size: assembled.size,
            segments: sequence.segments.len(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
enum PrepareError {
    #[error("creating folder: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

async fn remove_work_dir(work_dir: &Path) {
    match tokio::fs::remove_dir_all(work_dir).await {
        Ok(()) => info!("Temporary segment files deleted."),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!("Error deleting {}: {}", work_dir.display(), err),
    }
}
