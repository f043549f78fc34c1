use super::{AssemblyError, FetchError};

/// Why a single job was abandoned. Never fatal to the whole run.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("no segments available for {source_id}")]
    Empty { source_id: String },

    #[error("stream cut short at segment {index}: {source}")]
    Truncated {
        index: u32,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Assembly(#[from] AssemblyError),

    #[error("job io: {0}")]
    Io(#[from] std::io::Error),

    #[error("building segment url: {0}")]
    Url(#[from] url::ParseError),
}
