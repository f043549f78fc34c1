pub mod html;

use async_trait::async_trait;
use url::Url;

use crate::error::CatalogError;

/// One retrievable video of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub source_id: String,
    pub title: String,
}

/// Supplies the ordered videos of a collection page.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn entries(&self, collection_url: &Url) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Single-video collections: the id is the URL's last path segment and the
/// video is named after its folder.
pub fn single_item_entry(collection_url: &Url, marker: &str, folder_name: &str) -> Option<CatalogEntry> {
    if marker.is_empty() || !collection_url.as_str().contains(marker) {
        return None;
    }

    let source_id = collection_url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()?;

    Some(CatalogEntry {
        source_id: source_id.to_string(),
        title: folder_name.to_string(),
    })
}
