//! IOF-XML result document: one `ClassResult` container owning an ordered
//! run of opaque `PersonResult` records.

use crate::error::{Error, Result};
use crate::xml::{NodeId, XmlTree};

pub const CLASS_RESULT: &str = "ClassResult";
pub const PERSON_RESULT: &str = "PersonResult";

#[derive(Debug, Clone)]
pub struct ResultDocument {
    tree: XmlTree,
    origin: String,
}

impl ResultDocument {
    /// Parse a result document. `origin` names the input (usually a file path)
    /// in any error raised for it.
    pub fn parse(text: &str, origin: impl Into<String>) -> Result<Self> {
        let origin = origin.into();
        let tree = XmlTree::parse(text).map_err(|cause| Error::Parse {
            origin: origin.clone(),
            cause,
        })?;
        Ok(Self { tree, origin })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    /// The first `ClassResult` element in document order.
    pub fn class_result_container(&self) -> Result<NodeId> {
        self.tree
            .find_first(self.tree.root(), CLASS_RESULT)
            .ok_or_else(|| Error::structure(&self.origin, format!("missing {CLASS_RESULT}")))
    }

    /// Every `PersonResult` record in document order; may be empty.
    pub fn person_result_records(&self) -> Vec<NodeId> {
        self.tree.find_all(self.tree.root(), PERSON_RESULT)
    }

    /// Records currently owned by `container`.
    pub fn records_in(&self, container: NodeId) -> Vec<NodeId> {
        self.tree.find_all(container, PERSON_RESULT)
    }

    /// Move `records` out of `source` and append them to the end of
    /// `container`, preserving their relative order.
    pub fn append_records(
        &mut self,
        container: NodeId,
        source: &mut ResultDocument,
        records: &[NodeId],
    ) {
        self.tree.adopt_all(container, &mut source.tree, records);
    }

    pub fn serialize(&self) -> String {
        self.tree.serialize()
    }
}
