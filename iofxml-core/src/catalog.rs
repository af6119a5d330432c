//! # catalog: Winsplits listing and result download over HTTP
//!
//! One endpoint answers all three stages, selected by query parameters:
//! - `?date=YYYY-MM-DD` lists the events held that day (`<Event>` elements)
//! - `?id=<event>` lists the classes of one event (`<Class>` elements)
//! - `?id=<event>&classid=<class>` returns the IOF-XML result document
//!
//! Listing parsing fails fast: the first entry without a usable `Id` or
//! `Name` aborts the whole listing and nothing is returned.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use reqwest::header::REFERER;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{Catalog, CatalogEntry, ResultStream};
use crate::error::{Error, Result};
use crate::xml::{NodeId, XmlTree};

/// Assumed endpoint, not confirmed against the live service. Override it with
/// `remote.base_url` in the config file or the `IOFXML_BASE_URL` variable.
pub const DEFAULT_BASE_URL: &str = "http://loggator2.worldofo.com/winsplits.php";
pub const DEFAULT_REFERER: &str = "http://loggator2.worldofo.com";

/// Where and how to reach the remote results service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Sent as `Referer` on listing requests only.
    pub referer: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: Some(DEFAULT_REFERER.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Event,
    Class,
}

impl ListingKind {
    pub fn element(self) -> &'static str {
        match self {
            ListingKind::Event => "Event",
            ListingKind::Class => "Class",
        }
    }
}

/// Extract every listing element of `kind` from a listing response.
pub fn parse_listing(text: &str, kind: ListingKind) -> Result<Vec<CatalogEntry>> {
    let element = kind.element();
    let tree = XmlTree::parse(text).map_err(|cause| Error::Parse {
        origin: format!("{element} listing"),
        cause,
    })?;

    let mut entries = Vec::new();
    for node in tree.find_all(tree.root(), element) {
        let id = required_field(&tree, node, "Id", element)?;
        let name = required_field(&tree, node, "Name", element)?;
        entries.push(CatalogEntry { id, name });
    }
    Ok(entries)
}

fn required_field(tree: &XmlTree, node: NodeId, field: &str, element: &str) -> Result<String> {
    let Some(child) = tree.find_first(node, field) else {
        return Err(Error::structure(element, format!("no {field} tag")));
    };
    let value = tree.text(child).trim().to_string();
    if value.is_empty() {
        return Err(Error::structure(element, format!("empty {field}")));
    }
    Ok(value)
}

/// HTTP implementation of [`Catalog`].
pub struct WinsplitsClient {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl WinsplitsClient {
    pub fn new(config: RemoteConfig) -> Self {
        info!(base_url = %config.base_url, "Initialised Winsplits client");
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn get_listing(&self, query: &[(&str, &str)], kind: ListingKind) -> Result<Vec<CatalogEntry>> {
        let mut request = self.client.get(&self.config.base_url).query(query);
        if let Some(referer) = &self.config.referer {
            request = request.header(REFERER, referer);
        }
        let response = request.send().await.map_err(|e| {
            error!(error = ?e, "Listing request failed");
            Error::from(e)
        })?;

        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            error!(status = %status, url = %url, "Listing request returned error status");
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let entries = parse_listing(&text, kind)?;
        debug!(url = %url, count = entries.len(), kind = kind.element(), "Parsed listing");
        Ok(entries)
    }
}

#[async_trait]
impl Catalog for WinsplitsClient {
    async fn list_events(&self, date: NaiveDate) -> Result<Vec<CatalogEntry>> {
        let date = date.format("%Y-%m-%d").to_string();
        self.get_listing(&[("date", date.as_str())], ListingKind::Event)
            .await
    }

    async fn list_classes(&self, event_id: &str) -> Result<Vec<CatalogEntry>> {
        self.get_listing(&[("id", event_id)], ListingKind::Class).await
    }

    async fn fetch_result(&self, event_id: &str, class_id: &str) -> Result<ResultStream> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("id", event_id), ("classid", class_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            error!(status = %status, url = %url, "Result request returned error status");
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        info!(event_id, class_id, "Streaming result document");
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed())
    }
}
