//! # acquire: interactive resolution of one downloadable result
//!
//! A small linear state machine drives the workflow:
//!
//! ```text
//! SelectingEvent --pick--> SelectingClass --pick--> Downloading --> Done
//!       |                        |                        |
//!       +------- cancel ---------+--> Cancelled           +--> Failed
//! ```
//!
//! Every transition is awaited in sequence; nothing runs concurrently. A
//! cancellation at either selection state ends the workflow before any file
//! has been created.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::contract::{Catalog, CatalogEntry, Selector};
use crate::error::{Error, Result};
use crate::output::save_stream;
use crate::sanitize::result_filename;

#[derive(Debug)]
pub enum AcquisitionState {
    SelectingEvent { date: NaiveDate },
    SelectingClass { event: CatalogEntry },
    Downloading { event: CatalogEntry, class: CatalogEntry },
    Done { path: PathBuf },
    Cancelled,
    Failed(Error),
}

impl AcquisitionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AcquisitionState::Done { .. } | AcquisitionState::Cancelled | AcquisitionState::Failed(_)
        )
    }
}

pub struct Acquisition<'a, C: ?Sized, S: ?Sized> {
    catalog: &'a C,
    selector: &'a S,
    output_dir: PathBuf,
}

impl<'a, C, S> Acquisition<'a, C, S>
where
    C: Catalog + ?Sized,
    S: Selector + ?Sized,
{
    pub fn new(catalog: &'a C, selector: &'a S, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            selector,
            output_dir: output_dir.into(),
        }
    }

    /// Drive the workflow from event selection to a terminal state.
    pub async fn run(&self, date: NaiveDate) -> Result<PathBuf> {
        let mut state = AcquisitionState::SelectingEvent { date };
        loop {
            state = match self.step(state).await {
                AcquisitionState::Done { path } => return Ok(path),
                AcquisitionState::Cancelled => return Err(Error::Cancelled),
                AcquisitionState::Failed(e) => return Err(e),
                next => next,
            };
        }
    }

    /// Perform exactly one transition. Terminal states are returned unchanged.
    pub async fn step(&self, state: AcquisitionState) -> AcquisitionState {
        let next = match state {
            AcquisitionState::SelectingEvent { date } => {
                match self.select_event(date).await {
                    Ok(Some(event)) => Ok(AcquisitionState::SelectingClass { event }),
                    Ok(None) => Ok(AcquisitionState::Cancelled),
                    Err(e) => Err(e),
                }
            }
            AcquisitionState::SelectingClass { event } => {
                match self.select_class(&event).await {
                    Ok(Some(class)) => Ok(AcquisitionState::Downloading { event, class }),
                    Ok(None) => Ok(AcquisitionState::Cancelled),
                    Err(e) => Err(e),
                }
            }
            AcquisitionState::Downloading { event, class } => {
                let downloaded = self.download(&event, &class).await;
                downloaded.map(|path| AcquisitionState::Done { path })
            }
            terminal => Ok(terminal),
        };
        next.unwrap_or_else(AcquisitionState::Failed)
    }

    async fn select_event(&self, date: NaiveDate) -> Result<Option<CatalogEntry>> {
        let events = self.catalog.list_events(date).await?;
        info!(%date, count = events.len(), "Fetched events");
        self.choose("Pick an event", events, "events", date.to_string())
    }

    async fn select_class(&self, event: &CatalogEntry) -> Result<Option<CatalogEntry>> {
        let classes = self.catalog.list_classes(&event.id).await?;
        info!(event_id = %event.id, count = classes.len(), "Fetched classes");
        self.choose(
            "Pick a class",
            classes,
            "classes",
            format!("event {}", event.name),
        )
    }

    fn choose(
        &self,
        prompt: &str,
        entries: Vec<CatalogEntry>,
        what: &str,
        scope: String,
    ) -> Result<Option<CatalogEntry>> {
        if entries.is_empty() {
            return Err(Error::EmptyListing {
                what: what.to_string(),
                scope,
            });
        }
        let Some(index) = self.selector.select(prompt, &entries)? else {
            warn!(prompt, "Selection cancelled");
            return Ok(None);
        };
        let count = entries.len();
        entries
            .into_iter()
            .nth(index)
            .map(Some)
            .ok_or_else(|| {
                Error::structure("selection", format!("choice {index} out of {count} entries"))
            })
    }

    async fn download(&self, event: &CatalogEntry, class: &CatalogEntry) -> Result<PathBuf> {
        let destination = self
            .output_dir
            .join(result_filename(&event.name, &class.name));
        info!(
            event_id = %event.id,
            class_id = %class.id,
            path = %destination.display(),
            "Downloading result"
        );
        let body = self.catalog.fetch_result(&event.id, &class.id).await?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| Error::io(&self.output_dir, e))?;
        save_stream(body, &destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockCatalog, MockSelector};

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn terminal_states_are_left_alone() {
        let catalog = MockCatalog::new();
        let selector = MockSelector::new();
        let acquisition = Acquisition::new(&catalog, &selector, ".");

        let state = acquisition.step(AcquisitionState::Cancelled).await;
        assert!(matches!(state, AcquisitionState::Cancelled));
        assert!(state.is_terminal());
        assert!(!AcquisitionState::SelectingClass { event: entry("1", "Sprint") }.is_terminal());
    }

    #[tokio::test]
    async fn event_pick_moves_to_class_selection() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_list_events()
            .returning(|_| Ok(vec![entry("1", "Sprint"), entry("2", "Middle")]));
        let mut selector = MockSelector::new();
        selector.expect_select().returning(|_, _| Ok(Some(1)));
        let acquisition = Acquisition::new(&catalog, &selector, ".");

        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let state = acquisition
            .step(AcquisitionState::SelectingEvent { date })
            .await;

        match state {
            AcquisitionState::SelectingClass { event } => assert_eq!(event, entry("2", "Middle")),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_at_class_selection_ends_workflow() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_list_classes()
            .returning(|_| Ok(vec![entry("10", "H21")]));
        catalog.expect_fetch_result().never();
        let mut selector = MockSelector::new();
        selector.expect_select().returning(|_, _| Ok(None));
        let acquisition = Acquisition::new(&catalog, &selector, ".");

        let state = acquisition
            .step(AcquisitionState::SelectingClass {
                event: entry("1", "Sprint"),
            })
            .await;

        assert!(matches!(state, AcquisitionState::Cancelled));
    }

    #[tokio::test]
    async fn empty_listing_fails_without_prompting() {
        let mut catalog = MockCatalog::new();
        catalog.expect_list_events().returning(|_| Ok(vec![]));
        let mut selector = MockSelector::new();
        selector.expect_select().never();
        let acquisition = Acquisition::new(&catalog, &selector, ".");

        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let err = acquisition.run(date).await.unwrap_err();

        assert_eq!(err.to_string(), "no events found for 2025-09-01");
    }
}
