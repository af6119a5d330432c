//! # merge: combine per-person result fragments into one class result
//!
//! The first document is the base; its first `ClassResult` receives every
//! `PersonResult` of each supplement, in argument order and then in file order.
//! Records are relocated untouched. No deduplication is performed: a record
//! present in two supplements ends up in the output twice.
//!
//! Any failure aborts the whole merge before the caller writes anything.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::document::{ResultDocument, PERSON_RESULT};
use crate::error::{Error, Result};

/// Counts gathered while merging, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub base_records: usize,
    pub appended: Vec<(PathBuf, usize)>,
}

impl MergeReport {
    pub fn total_records(&self) -> usize {
        self.base_records + self.appended.iter().map(|(_, n)| n).sum::<usize>()
    }
}

pub fn read_document(path: &Path) -> Result<ResultDocument> {
    let text = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to read input file");
        Error::io(path, e)
    })?;
    ResultDocument::parse(&text, path.display().to_string())
}

/// Merge the supplements at `supplement_paths` into the document at `base_path`.
///
/// The base is validated before any supplement is read.
pub fn merge(
    base_path: &Path,
    supplement_paths: &[PathBuf],
) -> Result<(ResultDocument, MergeReport)> {
    info!(
        base = %base_path.display(),
        supplements = supplement_paths.len(),
        "Starting merge"
    );
    let mut base = read_document(base_path)?;
    let container = base.class_result_container()?;
    let mut report = MergeReport {
        base_records: base.records_in(container).len(),
        appended: Vec::with_capacity(supplement_paths.len()),
    };

    for path in supplement_paths {
        let supplement = read_document(path)?;
        let count = merge_supplement(&mut base, supplement)?;
        debug!(path = %path.display(), records = count, "Appended supplement records");
        report.appended.push((path.clone(), count));
    }

    info!(total_records = report.total_records(), "Merge complete");
    Ok((base, report))
}

/// Move every record of `supplement` into the base's class result container.
/// Returns the number of records moved.
pub fn merge_supplement(base: &mut ResultDocument, mut supplement: ResultDocument) -> Result<usize> {
    let container = base.class_result_container()?;
    let records = supplement.person_result_records();
    if records.is_empty() {
        return Err(Error::structure(
            supplement.origin(),
            format!("no {PERSON_RESULT} elements"),
        ));
    }
    base.append_records(container, &mut supplement, &records);
    Ok(records.len())
}
