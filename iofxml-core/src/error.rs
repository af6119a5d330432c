//! Error taxonomy shared by every core module.
//!
//! Nothing here is retried or recovered: each variant is terminal for the
//! workflow that raised it and is surfaced unchanged to the CLI.

use std::path::PathBuf;
use thiserror::Error;

use crate::xml::ParseError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input is not well-formed XML. `origin` is a file path or listing context.
    #[error("failed to parse XML from {origin}: {cause}")]
    Parse {
        origin: String,
        #[source]
        cause: ParseError,
    },

    /// Well-formed XML missing a required element or value.
    #[error("{message} in {context}")]
    Structure { context: String, message: String },

    /// A remote listing contained no entries to choose from.
    #[error("no {what} found for {scope}")]
    EmptyListing { what: String, scope: String },

    /// The remote service answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },

    /// The request could not be completed at all.
    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operator aborted an interactive selection.
    #[error("cancelled by user")]
    Cancelled,
}

impl Error {
    pub(crate) fn structure(context: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Structure {
            context: context.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}
