use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::download::retry::{RetryDecision, RetryPolicy};
use crate::download::DownloadClient;
use crate::error::FetchError;
use crate::job::sanitize_file_name;

/// Builds chunk URLs and local paths: `<base>/<source_id>/<prefix>-<index:05>.<ext>`.
#[derive(Debug, Clone)]
pub struct SegmentLocator {
    base_url: String,
    prefix: String,
    extension: String,
}

impl SegmentLocator {
    pub fn new(base_url: &str, prefix: &str, extension: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            prefix: prefix.to_string(),
            extension: extension.to_string(),
        }
    }

    pub fn file_name(&self, index: u32) -> String {
        format!("{}-{:05}.{}", self.prefix, index, self.extension)
    }

    pub fn url(&self, source_id: &str, index: u32) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}/{}/{}", self.base_url, source_id, self.file_name(index)))
    }

    pub fn segment(&self, source_id: &str, index: u32, work_dir: &Path) -> Result<Segment, url::ParseError> {
        let local_name = format!("{}-{}", sanitize_file_name(source_id), self.file_name(index));

        Ok(Segment {
            index,
            url: self.url(source_id, index)?,
            path: work_dir.join(local_name),
        })
    }
}

/// One numbered chunk of a job. Indices start at 1.
#[derive(Debug, Clone)]
pub struct Segment {
    pub index: u32,
    pub url: Url,
    pub path: PathBuf,
}

#[derive(Debug)]
pub enum FetchOutcome {
    Fetched { path: PathBuf, size: u64 },
    /// The server does not have this chunk: the stream ends before it.
    Missing { status: StatusCode },
    /// Gave up after retrying a transient failure.
    Errored(FetchError),
}

#[async_trait]
pub trait SegmentSource: Send + Sync {
    async fn fetch(&self, segment: &Segment) -> FetchOutcome;
}

enum Attempt {
    Fetched(u64),
    Missing(StatusCode),
}

/// Fetches chunks over HTTP, retrying transient failures.
pub struct SegmentFetcher {
    client: DownloadClient,
    retry: RetryPolicy,
}

impl SegmentFetcher {
    pub fn new(client: DownloadClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn attempt(&self, segment: &Segment) -> Result<Attempt, FetchError> {
        let response = self.client.get(&segment.url).await?;
        let status = response.status();

        if status != StatusCode::OK {
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(FetchError::Status(status));
            }
            return Ok(Attempt::Missing(status));
        }

        let bytes = response.bytes().await?;

        // create() truncates, so a stale file from an earlier run is fully replaced
        tokio::fs::write(&segment.path, &bytes).await?;

        Ok(Attempt::Fetched(bytes.len() as u64))
    }
}

#[async_trait]
impl SegmentSource for SegmentFetcher {
    async fn fetch(&self, segment: &Segment) -> FetchOutcome {
        let mut attempt = 1u32;

        loop {
            match self.attempt(segment).await {
                Ok(Attempt::Fetched(size)) => {
                    info!(
                        "Downloaded segment {} as {} ({:.2} Mb)",
                        segment.index,
                        segment.path.display(),
                        size as f64 / (1024.0 * 1024.0)
                    );
                    return FetchOutcome::Fetched { path: segment.path.clone(), size };
                }
                Ok(Attempt::Missing(status)) => {
                    debug!("Segment {} not found (status code {})", segment.index, status);
                    return FetchOutcome::Missing { status };
                }
                Err(err) => match self.retry.decide(attempt, err.kind()) {
                    RetryDecision::NoRetry => {
                        warn!("Error downloading segment {} from {}: {}", segment.index, segment.url, err);
                        return FetchOutcome::Errored(err);
                    }
                    RetryDecision::RetryAfter(delay) => {
                        warn!(
                            "Segment {} attempt {} failed ({}), retrying in {:?}",
                            segment.index, attempt, err, delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_zero_pads_index() {
        let locator = SegmentLocator::new("https://cdn.example.com/", "HIDDEN4500", "ts");
        let url = locator.url("abc123", 7).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/abc123/HIDDEN4500-00007.ts");
    }

    #[test]
    fn local_paths_are_unique_per_source_and_index() {
        let locator = SegmentLocator::new("https://cdn.example.com", "HIDDEN4500", "ts");
        let dir = Path::new("/tmp/work");
        let a = locator.segment("abc", 1, dir).unwrap();
        let b = locator.segment("abc", 2, dir).unwrap();
        let c = locator.segment("xyz", 1, dir).unwrap();
        assert_ne!(a.path, b.path);
        assert_ne!(a.path, c.path);
        assert_eq!(a.path, dir.join("abc-HIDDEN4500-00001.ts"));
    }
}
