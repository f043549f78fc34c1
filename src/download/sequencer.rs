use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::download::segment::{FetchOutcome, SegmentLocator, SegmentSource};
use crate::error::FetchError;

/// Why a sequence stopped growing.
#[derive(Debug)]
pub enum StreamEnd {
    Missing { index: u32, status: StatusCode },
    Errored { index: u32, error: FetchError },
}

impl StreamEnd {
    pub fn index(&self) -> u32 {
        match self {
            StreamEnd::Missing { index, .. } | StreamEnd::Errored { index, .. } => *index,
        }
    }
}

/// Gap-free, ascending list of fetched chunk files.
#[derive(Debug)]
pub struct Sequence {
    pub segments: Vec<PathBuf>,
    pub end: StreamEnd,
}

/// Probes chunks batch by batch until one is not available.
pub struct SegmentSequencer {
    source: Arc<dyn SegmentSource>,
    locator: SegmentLocator,
    batch_size: u32,
    semaphore: Arc<Semaphore>,
}

impl SegmentSequencer {
    pub fn new(
        source: Arc<dyn SegmentSource>,
        locator: SegmentLocator,
        batch_size: u32,
        max_parallel_downloads: usize,
    ) -> Self {
        Self {
            source,
            locator,
            batch_size: batch_size.max(1),
            semaphore: Arc::new(Semaphore::new(max_parallel_downloads.max(1))),
        }
    }

    pub async fn run(&self, source_id: &str, work_dir: &Path) -> Result<Sequence, url::ParseError> {
        let mut fetched = Vec::new();
        let mut cursor = 1u32;

        loop {
            let first = cursor;
            let last = cursor + self.batch_size - 1;
            debug!("Dispatching segments {}..={} of {}", first, last, source_id);

            let mut tasks = Vec::with_capacity(self.batch_size as usize);
            for index in first..=last {
                let segment = self.locator.segment(source_id, index, work_dir)?;
                let source = Arc::clone(&self.source);
                let semaphore = Arc::clone(&self.semaphore);

                let task = tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return FetchOutcome::Errored(FetchError::PoolClosed),
                    };
                    source.fetch(&segment).await
                });
                tasks.push((index, task));
            }

            // wait for the whole batch before draining it in index order
            let mut outcomes = Vec::with_capacity(tasks.len());
            for (index, task) in tasks {
                let outcome = task
                    .await
                    .unwrap_or_else(|err| FetchOutcome::Errored(FetchError::Task(err)));
                outcomes.push((index, outcome));
            }

            let mut end = None;
            for (index, outcome) in outcomes {
                if end.is_some() {
                    if let FetchOutcome::Fetched { path, .. } = outcome {
                        discard(&path).await;
                    }
                    continue;
                }

                match outcome {
                    FetchOutcome::Fetched { path, .. } => {
                        fetched.push(path);
                        cursor += 1;
                    }
                    FetchOutcome::Missing { status } => {
                        end = Some(StreamEnd::Missing { index, status });
                    }
                    FetchOutcome::Errored(error) => {
                        end = Some(StreamEnd::Errored { index, error });
                    }
                }
            }

            if let Some(end) = end {
                info!(
                    "Stream {} ends at segment {}: {} segments fetched",
                    source_id,
                    end.index(),
                    fetched.len()
                );
                return Ok(Sequence { segments: fetched, end });
            }
        }
    }
}

async fn discard(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!("Error deleting discarded segment {}: {}", path.display(), err);
        }
    }
}
