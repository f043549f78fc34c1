#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("no segments to assemble")]
    NoSegments,

    #[error("assembly io: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not start remux tool `{program}`: {source}")]
    RemuxSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("remux exited with {code:?}: {stderr}")]
    RemuxFailed { code: Option<i32>, stderr: String },

    #[error("remux reported success but {0} was not written")]
    MissingOutput(String),
}
