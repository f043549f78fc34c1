pub mod assemble;
pub mod remux;
pub mod retry;
pub mod segment;
pub mod sequencer;

use std::time::Duration;

use bytes::Bytes;
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; rv:78.0) Gecko/20100101 Firefox/78.0";

/// Plain, cookie-less HTTP client shared by the segment fetcher and the catalog reader.
#[derive(Clone)]
pub struct DownloadClient {
    client: reqwest::Client,
}

impl DownloadClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Sends a GET and hands back the raw response; status handling is up to the caller.
    pub async fn get(&self, url: &Url) -> Result<reqwest::Response, reqwest::Error> {
        self.client.get(url.as_str()).send().await
    }

    pub async fn download(&self, url: &Url) -> Result<Bytes, reqwest::Error> {
        let response = self.get(url).await?.error_for_status()?;
        response.bytes().await
    }
}
