#![doc = "iofxml-core: core logic library for iofxml."]

//! This crate holds the merge and remote-resolution logic for IOF-XML
//! orienteering results. Terminal interaction (argument parsing, prompts,
//! console output) lives in the `iofxml` CLI crate.
//!
//! # Modules
//! - [`xml`]: arena-backed XML tree, parse and serialize
//! - [`document`]: `ClassResult` / `PersonResult` view over a tree
//! - [`merge`]: append supplement records into a base document
//! - [`catalog`]: Winsplits event/class listings and result download
//! - [`acquire`]: the select-event, select-class, download state machine
//! - [`output`]: all-or-nothing file writes
//! - [`sanitize`]: filesystem-safe name tokens

pub mod acquire;
pub mod catalog;
pub mod contract;
pub mod document;
pub mod error;
pub mod merge;
pub mod output;
pub mod sanitize;
pub mod xml;

pub use error::{Error, Result};
