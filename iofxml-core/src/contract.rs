//! # contract: seams between the acquisition workflow and the outside world
//!
//! The workflow in [`crate::acquire`] only talks to a remote [`Catalog`] and
//! an operator-facing [`Selector`]. Real implementations live in
//! [`crate::catalog`] (HTTP) and in the CLI crate (terminal prompt); tests use
//! the `mockall`-generated `MockCatalog` and `MockSelector`, exported under the
//! default `test-export-mocks` feature.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use futures::stream::BoxStream;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::Result;

/// One remote-listed event or class. Both fields are non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

/// Body of a result download, yielded chunk by chunk.
pub type ResultStream = BoxStream<'static, Result<Bytes>>;

/// The remote results service, narrowed down in two dependent lookups.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Events held on `date`, in listing order.
    async fn list_events(&self, date: NaiveDate) -> Result<Vec<CatalogEntry>>;

    /// Classes of one event, in listing order.
    async fn list_classes(&self, event_id: &str) -> Result<Vec<CatalogEntry>>;

    /// The IOF-XML result document for one class of one event.
    async fn fetch_result(&self, event_id: &str, class_id: &str) -> Result<ResultStream>;
}

/// Lets an operator pick one entry from a short list.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Selector: Send + Sync {
    /// Index of the chosen entry, or `None` if the operator cancelled.
    fn select(&self, prompt: &str, entries: &[CatalogEntry]) -> Result<Option<usize>>;
}
