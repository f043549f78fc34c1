#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("fetching catalog page: {0}")]
    Request(#[from] reqwest::Error),

    #[error("reading catalog page: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid selector `{0}`")]
    Selector(String),

    #[error("invalid collection url `{0}`")]
    InvalidUrl(String),
}
