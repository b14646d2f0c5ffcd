//! In-memory host document.
//!
//! [`Document`] is an arena tree implementing [`HostDom`]. It exists so the
//! engine can be exercised against a host that behaves like a browser page:
//! node handles are stable and never reused (identity comparisons stay
//! meaningful after a subtree is replaced), and mutation observers receive
//! records with the same scoping rules as `MutationObserver`.
//!
//! Host-side edits (`append`, `remove`, `replace`, `set_text`) are inherent
//! methods; the engine only uses the [`HostDom`] surface.

mod builder;

pub use builder::{ElementSpec, NodeSpec, element, text};

use tracing::trace;

use crate::error::{DomError, Result, SelectorError};
use crate::host::{
    HostDom, MutationBatch, MutationRecord, MutationSink, ObserveOptions, ObserverId,
};
use crate::selector::{Compound, Selector};

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Registration {
    id: ObserverId,
    root: NodeId,
    options: ObserveOptions,
    sink: MutationSink<NodeId>,
}

/// An in-memory document with `<html>` and `<body>` elements.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    root: NodeId,
    body: NodeId,
    observers: Vec<Registration>,
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            observers: Vec::new(),
            next_observer: 1,
        };
        let root = doc.create(element("html"));
        let body = doc.create(element("body"));
        doc.link(root, body, None);
        doc.root = root;
        doc.body = body;
        doc
    }

    /// Returns the `<html>` element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the `<body>` element.
    #[must_use]
    pub const fn body_id(&self) -> NodeId {
        self.body
    }

    /// Returns the children of a node.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map_or(&[], |entry| entry.children.as_slice())
    }

    /// Returns the number of live observations.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Creates a detached subtree and returns its root.
    pub fn create(&mut self, spec: impl Into<NodeSpec>) -> NodeId {
        match spec.into() {
            NodeSpec::Text(value) => self.alloc(NodeData::Text(value)),
            NodeSpec::Element(spec) => {
                let id = self.alloc(NodeData::Element {
                    tag: spec.tag,
                    attributes: spec.attributes,
                });
                for child in spec.children {
                    let child_id = self.create(child);
                    self.link(id, child_id, None);
                }
                id
            }
        }
    }

    /// Builds a subtree and appends it under `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not an element.
    pub fn append(&mut self, parent: NodeId, spec: impl Into<NodeSpec>) -> Result<NodeId> {
        self.require_element(parent)?;
        let child = self.create(spec);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Moves `child` to the end of `parent`'s children.
    ///
    /// # Errors
    ///
    /// Returns an error if either node is unknown, `parent` is not an element,
    /// or `child` is an inclusive ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require_element(parent)?;
        self.entry(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Hierarchy(format!(
                "{child:?} is an ancestor of {parent:?}"
            )));
        }
        if self.nodes[child.0].parent.is_some() {
            self.remove(child)?;
        }
        self.link(parent, child, None);
        self.notify(&MutationRecord::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Detaches a node from its parent. Detached nodes keep their identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown.
    pub fn remove(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.entry(node)?.parent else {
            return Ok(());
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
        self.notify(&MutationRecord::ChildList {
            target: parent,
            added: Vec::new(),
            removed: vec![node],
        });
        Ok(())
    }

    /// Replaces `old` with a newly built subtree in the same position.
    ///
    /// # Errors
    ///
    /// Returns an error if `old` is unknown or detached.
    pub fn replace(&mut self, old: NodeId, spec: impl Into<NodeSpec>) -> Result<NodeId> {
        let parent = self
            .entry(old)?
            .parent
            .ok_or_else(|| DomError::Hierarchy(format!("{old:?} has no parent")))?;
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == old)
            .unwrap_or(0);
        let new = self.create(spec);
        self.nodes[parent.0].children.retain(|c| *c != old);
        self.nodes[old.0].parent = None;
        self.link(parent, new, Some(position));
        self.notify(&MutationRecord::ChildList {
            target: parent,
            added: vec![new],
            removed: vec![old],
        });
        Ok(new)
    }

    /// Replaces all children of `node` with a single text node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    pub fn set_text(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.require_element(node)?;
        let removed = std::mem::take(&mut self.nodes[node.0].children);
        for child in &removed {
            self.nodes[child.0].parent = None;
        }
        let added = if value.is_empty() {
            Vec::new()
        } else {
            let text_node = self.alloc(NodeData::Text(value.to_string()));
            self.link(node, text_node, None);
            vec![text_node]
        };
        if !added.is_empty() || !removed.is_empty() {
            self.notify(&MutationRecord::ChildList {
                target: node,
                added,
                removed,
            });
        }
        Ok(())
    }

    /// Parses `selector` and returns the first match in the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector does not parse.
    pub fn select(&self, selector: &str) -> std::result::Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector(None, &selector))
    }

    /// Parses `selector` and returns all matches in the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector does not parse.
    pub fn select_all(&self, selector: &str) -> std::result::Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_selector_all(None, &selector))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeEntry {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId, position: Option<usize>) {
        let children = &mut self.nodes[parent.0].children;
        match position {
            Some(index) if index <= children.len() => children.insert(index, child),
            _ => children.push(child),
        }
        self.nodes[child.0].parent = Some(parent);
    }

    fn entry(&self, node: NodeId) -> Result<&NodeEntry> {
        self.nodes
            .get(node.0)
            .ok_or_else(|| DomError::UnknownNode(format!("{node:?}")))
    }

    fn require_element(&self, node: NodeId) -> Result<()> {
        match self.entry(node)?.data {
            NodeData::Element { .. } => Ok(()),
            NodeData::Text(_) => Err(DomError::NotAnElement(format!("{node:?}"))),
        }
    }

    fn attributes(&self, node: NodeId) -> Option<&[(String, String)]> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { attributes, .. } => Some(attributes),
            NodeData::Text(_) => None,
        }
    }

    fn attributes_mut(&mut self, node: NodeId) -> Result<&mut Vec<(String, String)>> {
        let entry = self
            .nodes
            .get_mut(node.0)
            .ok_or_else(|| DomError::UnknownNode(format!("{node:?}")))?;
        match &mut entry.data {
            NodeData::Element { attributes, .. } => Ok(attributes),
            NodeData::Text(_) => Err(DomError::NotAnElement(format!("{node:?}"))),
        }
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Descendants of `scope` (exclusive) in document order.
    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(NodeData::Element { tag, .. }) = self.nodes.get(node.0).map(|e| &e.data) else {
            return false;
        };
        if compound.tag.as_ref().is_some_and(|t| t != tag) {
            return false;
        }
        let id_value = self.attribute(&node, "id");
        if !compound.ids.iter().all(|id| id_value.as_deref() == Some(id)) {
            return false;
        }
        if !compound.classes.iter().all(|c| self.has_class(&node, c)) {
            return false;
        }
        compound
            .attributes
            .iter()
            .all(|condition| condition.matches(self.attribute(&node, &condition.name).as_deref()))
    }

    /// Right-to-left match; descendant combinators allow a greedy ancestor walk.
    fn matches_selector(&self, node: NodeId, selector: &Selector) -> bool {
        if !self.matches_compound(node, selector.subject()) {
            return false;
        }
        let mut current = self.parent_of(node);
        for compound in selector.ancestors().iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = self.parent_of(candidate);
                if self.matches_compound(candidate, compound) {
                    break;
                }
            }
        }
        true
    }

    fn write_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let attributes = self.attributes_mut(node)?;
        let old_value = if let Some(slot) = attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(std::mem::replace(&mut slot.1, value.to_string()))
        } else {
            attributes.push((name.clone(), value.to_string()));
            None
        };
        self.notify(&MutationRecord::Attributes {
            target: node,
            name,
            old_value,
        });
        Ok(())
    }

    fn write_style(&mut self, node: NodeId, declarations: &[(String, String)]) -> Result<()> {
        let serialized = declarations
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.write_attribute(node, "style", &serialized)
    }

    fn style_declarations(&self, node: NodeId) -> Vec<(String, String)> {
        self.attribute(&node, "style")
            .map(|style| parse_style(&style))
            .unwrap_or_default()
    }

    fn notify(&self, record: &MutationRecord<NodeId>) {
        for registration in &self.observers {
            let Some(record) = self.filter_for(registration, record) else {
                continue;
            };
            let batch = MutationBatch {
                observer: registration.id,
                records: vec![record],
            };
            if registration.sink.send(batch).is_err() {
                trace!(observer = ?registration.id, "mutation sink closed");
            }
        }
    }

    /// Returns the record as `registration` should see it, or `None`.
    fn filter_for(
        &self,
        registration: &Registration,
        record: &MutationRecord<NodeId>,
    ) -> Option<MutationRecord<NodeId>> {
        let target = *record.target();
        let in_scope = target == registration.root
            || (registration.options.subtree
                && self.is_inclusive_ancestor(registration.root, target));
        if !in_scope {
            return None;
        }
        match record {
            MutationRecord::ChildList { .. } => {
                registration.options.child_list.then(|| record.clone())
            }
            MutationRecord::Attributes {
                target,
                name,
                old_value,
            } => registration
                .options
                .reports_attribute(name)
                .then(|| MutationRecord::Attributes {
                    target: *target,
                    name: name.clone(),
                    old_value: if registration.options.attribute_old_value {
                        old_value.clone()
                    } else {
                        None
                    },
                }),
        }
    }
}

fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            (!property.is_empty() && !value.is_empty()).then(|| (property, value.to_string()))
        })
        .collect()
}

impl HostDom for Document {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn query_selector(&self, scope: Option<&NodeId>, selector: &Selector) -> Option<NodeId> {
        let scope = scope.copied().unwrap_or(self.root);
        self.descendants(scope)
            .into_iter()
            .find(|node| self.matches_selector(*node, selector))
    }

    fn query_selector_all(&self, scope: Option<&NodeId>, selector: &Selector) -> Vec<NodeId> {
        let scope = scope.copied().unwrap_or(self.root);
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.matches_selector(*node, selector))
            .collect()
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
        self.parent_of(*node)
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.nodes.get(node.0).is_some() && self.is_inclusive_ancestor(self.root, *node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.attributes(*node)?
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
        self.style_declarations(*node)
            .into_iter()
            .find(|(p, _)| p.eq_ignore_ascii_case(property))
            .map(|(_, v)| v)
    }

    fn text_content(&self, node: &NodeId) -> String {
        match self.nodes.get(node.0).map(|e| &e.data) {
            None => String::new(),
            Some(NodeData::Text(value)) => value.clone(),
            Some(NodeData::Element { .. }) => self
                .descendants(*node)
                .into_iter()
                .filter_map(|id| match &self.nodes[id.0].data {
                    NodeData::Text(value) => Some(value.as_str()),
                    NodeData::Element { .. } => None,
                })
                .collect(),
        }
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> Result<()> {
        self.write_attribute(*node, name, value)
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<()> {
        let attributes = self.attributes_mut(*node)?;
        let Some(position) = attributes
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
        else {
            return Ok(());
        };
        let (name, old_value) = attributes.remove(position);
        self.notify(&MutationRecord::Attributes {
            target: *node,
            name,
            old_value: Some(old_value),
        });
        Ok(())
    }

    fn add_class(&mut self, node: &NodeId, class: &str) -> Result<()> {
        self.require_element(*node)?;
        let current = self.attribute(node, "class").unwrap_or_default();
        let mut classes: Vec<&str> = current.split_ascii_whitespace().collect();
        if !classes.contains(&class) {
            classes.push(class);
        }
        let updated = classes.join(" ");
        self.write_attribute(*node, "class", &updated)
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) -> Result<()> {
        self.require_element(*node)?;
        let Some(current) = self.attribute(node, "class") else {
            return Ok(());
        };
        let updated = current
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.write_attribute(*node, "class", &updated)
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) -> Result<()> {
        self.require_element(*node)?;
        let property = property.to_ascii_lowercase();
        let mut declarations = self.style_declarations(*node);
        if let Some(slot) = declarations.iter_mut().find(|(p, _)| *p == property) {
            slot.1 = value.to_string();
        } else {
            declarations.push((property, value.to_string()));
        }
        self.write_style(*node, &declarations)
    }

    fn remove_style_property(&mut self, node: &NodeId, property: &str) -> Result<()> {
        self.require_element(*node)?;
        if self.attribute(node, "style").is_none() {
            return Ok(());
        }
        let mut declarations = self.style_declarations(*node);
        declarations.retain(|(p, _)| !p.eq_ignore_ascii_case(property));
        self.write_style(*node, &declarations)
    }

    fn observe(
        &mut self,
        root: &NodeId,
        options: ObserveOptions,
        sink: MutationSink<NodeId>,
    ) -> Result<ObserverId> {
        self.entry(*root)?;
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        trace!(observer = ?id, root = ?root, "observation registered");
        self.observers.push(Registration {
            id,
            root: *root,
            options,
            sink,
        });
        Ok(id)
    }

    fn disconnect(&mut self, observer: ObserverId) {
        self.observers.retain(|r| r.id != observer);
    }
}
