use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::download::assemble::AssemblyStrategy;
use crate::download::retry::RetryPolicy;
use crate::download::segment::SegmentLocator;

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid option: {0}")]
    Invalid(&'static str),
}

/// Where chunks live: `<base_url>/<source_id>/<segment_prefix>-<index:05>.<segment_extension>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub segment_prefix: String,
    pub segment_extension: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "https://d13z5uuzt1wkbz.cloudfront.net".to_string(),
            segment_prefix: "HIDDEN4500".to_string(),
            segment_extension: "ts".to_string(),
        }
    }
}

/// Markup hooks for reading a collection page. These change whenever the site does.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// `div` ids starting with this carry the video id after the last `-`.
    pub id_prefix: String,
    /// `div` elements with this class hold the titles, in page order.
    pub title_class: String,
    /// Collection URLs containing this are a single video named after the folder.
    pub single_item_marker: String,
    pub number_titles: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id_prefix: "BrVidRow-".to_string(),
            title_class: "css-1mkvlph".to_string(),
            single_item_marker: "commentaries".to_string(),
            number_titles: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    pub max_parallel_downloads: usize,
    /// Retries for transient failures, on top of the first attempt.
    pub max_download_retries: u32,
    pub batch_size: u32,
    pub request_timeout_secs: u64,
    pub retry_base_delay_ms: u64,
    /// Extension of the assembled file.
    pub container: String,
    /// Unset means: derived from `container`.
    pub strategy: Option<AssemblyStrategy>,
    pub ffmpeg: String,
    pub overwrite: bool,
    /// Assemble what was fetched even when the stream ended on an error.
    pub accept_truncated: bool,
    pub endpoint: EndpointConfig,
    pub catalog: CatalogConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_parallel_downloads: 8,
            max_download_retries: 3,
            batch_size: 20,
            request_timeout_secs: 10,
            retry_base_delay_ms: 500,
            container: "ts".to_string(),
            strategy: None,
            ffmpeg: "ffmpeg".to_string(),
            overwrite: false,
            accept_truncated: false,
            endpoint: EndpointConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Options {
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_parallel_downloads == 0 {
            return Err(OptionsError::Invalid("max_parallel_downloads must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(OptionsError::Invalid("batch_size must be at least 1"));
        }
        if self.max_download_retries == 0 {
            return Err(OptionsError::Invalid(
                "max_download_retries must be at least 1, a single network error would end the stream",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(OptionsError::Invalid("request_timeout_secs must be at least 1"));
        }
        if self.container.is_empty() {
            return Err(OptionsError::Invalid("container must not be empty"));
        }
        Ok(())
    }

    pub fn strategy(&self) -> AssemblyStrategy {
        self.strategy
            .unwrap_or_else(|| AssemblyStrategy::for_container(&self.container))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_download_retries,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }

    pub fn locator(&self) -> SegmentLocator {
        SegmentLocator::new(
            &self.endpoint.base_url,
            &self.endpoint.segment_prefix,
            &self.endpoint.segment_extension,
        )
    }
}
