use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{CatalogEntry, CatalogSource};
use crate::download::DownloadClient;
use crate::error::CatalogError;
use crate::options::CatalogConfig;

/// Reads a collection from already-rendered markup, fetched over HTTP or
/// from a saved `file://` snapshot. No script is executed.
pub struct HtmlCatalog {
    client: DownloadClient,
    config: CatalogConfig,
}

impl HtmlCatalog {
    pub fn new(client: DownloadClient, config: CatalogConfig) -> Self {
        Self { client, config }
    }

    async fn page(&self, url: &Url) -> Result<String, CatalogError> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| CatalogError::InvalidUrl(url.to_string()))?;
            return Ok(tokio::fs::read_to_string(path).await?);
        }

        let bytes = self.client.download(url).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl CatalogSource for HtmlCatalog {
    async fn entries(&self, collection_url: &Url) -> Result<Vec<CatalogEntry>, CatalogError> {
        let html = self.page(collection_url).await?;
        parse_catalog(&html, &self.config)
    }
}

fn selector(text: &str) -> Result<Selector, CatalogError> {
    Selector::parse(text).map_err(|_| CatalogError::Selector(text.to_string()))
}

pub fn parse_catalog(html: &str, config: &CatalogConfig) -> Result<Vec<CatalogEntry>, CatalogError> {
    let document = Html::parse_document(html);
    let id_selector = selector(&format!("div[id^=\"{}\"]", config.id_prefix))?;
    let title_selector = selector(&format!("div[class~=\"{}\"]", config.title_class))?;

    let ids: Vec<String> = document
        .select(&id_selector)
        .filter_map(|row| row.value().id())
        .filter_map(|id| id.rsplit('-').next())
        .map(str::to_string)
        .collect();

    let titles: Vec<String> = document
        .select(&title_selector)
        .enumerate()
        .map(|(i, row)| {
            let text = row.text().collect::<String>();
            let text = text.trim();
            if config.number_titles {
                format!("{}. {}", i + 1, text)
            } else {
                text.to_string()
            }
        })
        .collect();

    debug!("Video IDs: {:?}", ids);
    debug!("Video Titles: {:?}", titles);

    if ids.len() != titles.len() {
        warn!(
            "Catalog has {} ids but {} titles, keeping the first {}",
            ids.len(),
            titles.len(),
            ids.len().min(titles.len())
        );
    }

    Ok(ids
        .into_iter()
        .zip(titles)
        .map(|(source_id, title)| CatalogEntry { source_id, title })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="BrVidRow-aaa111"><div class="row css-1mkvlph">Closed Guard</div></div>
          <div id="BrVidRow-bbb222"><div class="css-1mkvlph"> Open Guard: Intro </div></div>
          <div id="Other-ccc333"><div class="css-other">Not a video</div></div>
        </body></html>
    "#;

    #[test]
    fn pairs_ids_with_numbered_titles() {
        let entries = parse_catalog(PAGE, &CatalogConfig::default()).unwrap();
        assert_eq!(
            entries,
            vec![
                CatalogEntry { source_id: "aaa111".into(), title: "1. Closed Guard".into() },
                CatalogEntry { source_id: "bbb222".into(), title: "2. Open Guard: Intro".into() },
            ]
        );
    }

    #[test]
    fn selectors_come_from_config() {
        let config = CatalogConfig {
            id_prefix: "Other-".into(),
            title_class: "css-other".into(),
            number_titles: false,
            ..CatalogConfig::default()
        };
        let entries = parse_catalog(PAGE, &config).unwrap();
        assert_eq!(entries, vec![CatalogEntry { source_id: "ccc333".into(), title: "Not a video".into() }]);
    }

    #[test]
    fn empty_page_has_no_entries() {
        assert!(parse_catalog("<html></html>", &CatalogConfig::default()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_saved_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collection.html");
        std::fs::write(&path, PAGE).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let client = DownloadClient::new(std::time::Duration::from_secs(1)).unwrap();
        let catalog = HtmlCatalog::new(client, CatalogConfig::default());
        assert_eq!(catalog.entries(&url).await.unwrap().len(), 2);
    }
}
