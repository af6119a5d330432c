//! Terminal implementation of the core [`Selector`] seam.

use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;
use iofxml_core::contract::{CatalogEntry, Selector};
use iofxml_core::Error;

/// Arrow-key picker; Esc or `q` cancels.
#[derive(Default)]
pub struct TerminalSelector {
    theme: ColorfulTheme,
}

impl Selector for TerminalSelector {
    fn select(&self, prompt: &str, entries: &[CatalogEntry]) -> iofxml_core::Result<Option<usize>> {
        let labels: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact_opt()
            .map_err(|e| match e {
                dialoguer::Error::IO(source) => Error::Io {
                    path: PathBuf::from("<terminal>"),
                    source,
                },
            })
    }
}
