//! # xml: arena-backed mutable XML tree
//!
//! Every [`XmlTree`] owns its nodes in a flat `Vec`, addressed by [`NodeId`].
//! Moving a subtree between documents is an explicit two-step operation:
//! the subtree is detached from its source tree and deep-copied into the
//! destination arena (see [`XmlTree::adopt`]), so no node is ever owned by two
//! trees at once.
//!
//! Text, CDATA, comments and attribute values are kept in their escaped source
//! form and written back verbatim; decoding only happens on query
//! ([`XmlTree::text`]).

use std::collections::HashSet;
use std::fmt;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Input text was not well-formed XML.
#[derive(Debug, Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    pub position: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration(String),
    DocType(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct XmlTree {
    nodes: Vec<Node>,
}

impl XmlTree {
    /// Parse `text` into a tree. Stateless: every call builds its own reader.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut tree = XmlTree {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut reader = Reader::from_str(text);
        let mut open: Vec<NodeId> = Vec::new();
        let mut root_seen = false;

        loop {
            let position = reader.buffer_position() as u64;
            let fail = |message: String| ParseError { message, position };
            let event = reader.read_event().map_err(|e| fail(e.to_string()))?;
            let parent = open.last().copied().unwrap_or(tree.root());

            match event {
                Event::Start(e) | Event::Empty(e) if open.is_empty() && root_seen => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(fail(format!("second root element <{name}>")));
                }
                Event::Start(e) => {
                    let kind = element_kind(&e).map_err(fail)?;
                    let id = tree.push(kind);
                    tree.append_child(parent, id);
                    root_seen = true;
                    open.push(id);
                }
                Event::Empty(e) => {
                    let kind = element_kind(&e).map_err(fail)?;
                    let id = tree.push(kind);
                    tree.append_child(parent, id);
                    root_seen = true;
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match open.pop() {
                        Some(id) if tree.name(id) == Some(name.as_str()) => {}
                        Some(id) => {
                            let expected = tree.name(id).unwrap_or_default().to_string();
                            return Err(fail(format!(
                                "end tag </{name}> does not match <{expected}>"
                            )));
                        }
                        None => return Err(fail(format!("stray end tag </{name}>"))),
                    }
                }
                Event::Text(e) => {
                    let raw = String::from_utf8_lossy(&e).into_owned();
                    if open.is_empty() && !raw.trim().is_empty() {
                        return Err(fail("text outside the root element".to_string()));
                    }
                    let id = tree.push(NodeKind::Text(raw));
                    tree.append_child(parent, id);
                }
                Event::CData(e) => {
                    if open.is_empty() {
                        return Err(fail("CDATA outside the root element".to_string()));
                    }
                    let id = tree.push(NodeKind::CData(String::from_utf8_lossy(&e).into_owned()));
                    tree.append_child(parent, id);
                }
                Event::Comment(e) => {
                    let id = tree.push(NodeKind::Comment(String::from_utf8_lossy(&e).into_owned()));
                    tree.append_child(parent, id);
                }
                Event::PI(e) => {
                    let id = tree.push(NodeKind::ProcessingInstruction(
                        String::from_utf8_lossy(&e).into_owned(),
                    ));
                    tree.append_child(parent, id);
                }
                Event::Decl(e) => {
                    let id = tree.push(NodeKind::Declaration(String::from_utf8_lossy(&e).into_owned()));
                    tree.append_child(parent, id);
                }
                Event::DocType(e) => {
                    let id = tree.push(NodeKind::DocType(String::from_utf8_lossy(&e).into_owned()));
                    tree.append_child(parent, id);
                }
                Event::Eof => {
                    if let Some(id) = open.last() {
                        let name = tree.name(*id).unwrap_or_default().to_string();
                        return Err(fail(format!("unclosed element <{name}>")));
                    }
                    if !root_seen {
                        return Err(fail("no root element".to_string()));
                    }
                    break;
                }
            }
        }

        Ok(tree)
    }

    /// The document node. Never an element.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element name, or `None` for non-element nodes.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// First descendant element of `from` named `name`, in document order.
    pub fn find_first(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.name(id) == Some(name) {
                return Some(id);
            }
            stack.extend(self.children(id).iter().rev());
        }
        None
    }

    /// All descendant elements of `from` named `name`, in document order.
    ///
    /// Matches nested inside another match are not reported separately.
    pub fn find_all(&self, from: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.name(id) == Some(name) {
                found.push(id);
                continue;
            }
            stack.extend(self.children(id).iter().rev());
        }
        found
    }

    /// Concatenated, entity-decoded text of every text and CDATA descendant.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            match self.kind(id) {
                NodeKind::Text(raw) => match quick_xml::escape::unescape(raw) {
                    Ok(decoded) => out.push_str(&decoded),
                    Err(_) => out.push_str(raw),
                },
                NodeKind::CData(raw) => out.push_str(raw),
                _ => stack.extend(self.children(id).iter().rev()),
            }
        }
        out
    }

    /// Unlink `id` from its parent. The subtree stays in the arena but is no
    /// longer reachable from the document node.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// Detach every node in `ids`, filtering each affected child list once.
    pub fn detach_all(&mut self, ids: &[NodeId]) {
        let moving: HashSet<NodeId> = ids.iter().copied().collect();
        let mut parents = Vec::new();
        for id in ids {
            if let Some(parent) = self.nodes[id.0].parent.take() {
                parents.push(parent);
            }
        }
        parents.sort_unstable_by_key(|p| p.0);
        parents.dedup();
        for parent in parents {
            self.nodes[parent.0].children.retain(|c| !moving.contains(c));
        }
    }

    /// Deep-copy the subtree at `src_id` of `src` into this arena, unattached.
    pub fn import(&mut self, src: &XmlTree, src_id: NodeId) -> NodeId {
        let top = self.push(src.kind(src_id).clone());
        let mut pending = vec![(src_id, top)];
        while let Some((from, to)) = pending.pop() {
            for child in src.children(from) {
                let copied = self.push(src.kind(*child).clone());
                self.append_child(to, copied);
                pending.push((*child, copied));
            }
        }
        top
    }

    /// Move the subtree at `src_id` out of `src` and append it to `parent`.
    pub fn adopt(&mut self, parent: NodeId, src: &mut XmlTree, src_id: NodeId) -> NodeId {
        src.detach(src_id);
        let id = self.import(src, src_id);
        self.append_child(parent, id);
        id
    }

    /// Move every subtree in `src_ids` out of `src` and append them to
    /// `parent` in the given order.
    pub fn adopt_all(
        &mut self,
        parent: NodeId,
        src: &mut XmlTree,
        src_ids: &[NodeId],
    ) -> Vec<NodeId> {
        src.detach_all(src_ids);
        let src: &XmlTree = src;
        src_ids
            .iter()
            .map(|src_id| {
                let id = self.import(src, *src_id);
                self.append_child(parent, id);
                id
            })
            .collect()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Serialize the subtree reachable from the document node.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![Visit::Enter(self.root())];
        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(id) => self.write_open(id, &mut out, &mut stack),
                Visit::Leave(id) => {
                    if let Some(name) = self.name(id) {
                        out.push_str("</");
                        out.push_str(name);
                        out.push('>');
                    }
                }
            }
        }
        out
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Write everything of `id` that precedes its children, then schedule the
    /// children and the closing tag.
    fn write_open(&self, id: NodeId, out: &mut String, stack: &mut Vec<Visit>) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Document => {
                stack.extend(node.children.iter().rev().map(|c| Visit::Enter(*c)));
            }
            NodeKind::Element { name, attributes } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
                if node.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                stack.push(Visit::Leave(id));
                stack.extend(node.children.iter().rev().map(|c| Visit::Enter(*c)));
            }
            NodeKind::Text(raw) => out.push_str(raw),
            NodeKind::CData(raw) => {
                out.push_str("<![CDATA[");
                out.push_str(raw);
                out.push_str("]]>");
            }
            NodeKind::Comment(raw) => {
                out.push_str("<!--");
                out.push_str(raw);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(raw) | NodeKind::Declaration(raw) => {
                out.push_str("<?");
                out.push_str(raw);
                out.push_str("?>");
            }
            NodeKind::DocType(raw) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(raw);
                out.push('>');
            }
        }
    }
}

enum Visit {
    Enter(NodeId),
    Leave(NodeId),
}

impl fmt::Display for XmlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

fn element_kind(e: &quick_xml::events::BytesStart<'_>) -> Result<NodeKind, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("bad attribute on <{name}>: {err}"))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }
    Ok(NodeKind::Element { name, attributes })
}
