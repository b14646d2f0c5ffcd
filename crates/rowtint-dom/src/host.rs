//! The host document contract consumed by the highlighting engine.
//!
//! A [`HostDom`] is the engine's only window onto the host application's
//! tree. It mirrors the small slice of the browser DOM the engine needs:
//! selector queries, attribute/class/style reads and writes, text content and
//! mutation observation.

use std::fmt::Debug;
use std::hash::Hash;

use tokio::sync::mpsc::UnboundedSender;

use crate::error::Result;
use crate::selector::Selector;

/// Identifier of a registered mutation observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub u64);

/// What an observation reports, mirroring `MutationObserverInit`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObserveOptions {
    /// Report children added to or removed from the target.
    pub child_list: bool,
    /// Extend observation to all descendants of the root.
    pub subtree: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Restrict attribute reports to these names (`None` reports all).
    pub attribute_filter: Option<Vec<String>>,
    /// Include the previous attribute value in attribute records.
    pub attribute_old_value: bool,
}

impl ObserveOptions {
    /// Child-list changes across the whole subtree.
    #[must_use]
    pub const fn structure() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: false,
            attribute_filter: None,
            attribute_old_value: false,
        }
    }

    /// Adds attribute reporting restricted to `names`, with old values.
    #[must_use]
    pub fn with_attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = true;
        self.attribute_filter = Some(names.into_iter().map(Into::into).collect());
        self.attribute_old_value = true;
        self
    }

    /// Returns `true` if a change to attribute `name` should be reported.
    #[must_use]
    pub fn reports_attribute(&self, name: &str) -> bool {
        self.attributes
            && self
                .attribute_filter
                .as_ref()
                .is_none_or(|names| names.iter().any(|n| n.eq_ignore_ascii_case(name)))
    }
}

/// One observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord<N> {
    /// Children of `target` changed.
    ChildList {
        /// The parent whose child list changed.
        target: N,
        /// Nodes inserted under `target`.
        added: Vec<N>,
        /// Nodes removed from `target`.
        removed: Vec<N>,
    },
    /// An attribute of `target` was written.
    Attributes {
        /// The element whose attribute changed.
        target: N,
        /// Lower-cased attribute name.
        name: String,
        /// Previous value, when the observation asked for it.
        old_value: Option<String>,
    },
}

impl<N> MutationRecord<N> {
    /// Returns the node the record is about.
    #[must_use]
    pub const fn target(&self) -> &N {
        match self {
            Self::ChildList { target, .. } | Self::Attributes { target, .. } => target,
        }
    }
}

/// Records delivered together for one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationBatch<N> {
    /// The observation that produced these records.
    pub observer: ObserverId,
    /// Records in the order the changes happened.
    pub records: Vec<MutationRecord<N>>,
}

/// Channel on which a host delivers mutation batches.
pub type MutationSink<N> = UnboundedSender<MutationBatch<N>>;

/// Access to the host application's document.
///
/// Reads never fail: missing nodes read as absent or empty. Writes return a
/// [`DomError`](crate::DomError) the caller is expected to contain.
pub trait HostDom {
    /// Handle to a node. Equality is node identity.
    type Node: Clone + Eq + Hash + Debug;

    /// Returns the body element, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// Returns the first element matching `selector` in document order,
    /// searching descendants of `scope` or the whole document.
    fn query_selector(&self, scope: Option<&Self::Node>, selector: &Selector)
    -> Option<Self::Node>;

    /// Returns all elements matching `selector` in document order, searching
    /// descendants of `scope` or the whole document.
    fn query_selector_all(&self, scope: Option<&Self::Node>, selector: &Selector)
    -> Vec<Self::Node>;

    /// Returns the lower-cased tag name, or `None` for non-element nodes.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Returns the parent element.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Returns `true` if the node is attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    /// Returns an attribute value.
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Returns `true` if the element's class list contains `class`.
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    /// Returns an inline style property.
    fn style_property(&self, node: &Self::Node, property: &str) -> Option<String>;

    /// Returns the concatenated text of all descendant text nodes.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Sets an attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) -> Result<()>;

    /// Removes an attribute. Removing an absent attribute is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<()>;

    /// Adds a class to the element's class list.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn add_class(&mut self, node: &Self::Node, class: &str) -> Result<()>;

    /// Removes a class from the element's class list.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn remove_class(&mut self, node: &Self::Node, class: &str) -> Result<()>;

    /// Sets an inline style property.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn set_style_property(&mut self, node: &Self::Node, property: &str, value: &str)
    -> Result<()>;

    /// Removes an inline style property.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or not an element.
    fn remove_style_property(&mut self, node: &Self::Node, property: &str) -> Result<()>;

    /// Starts observing `root`; batches are sent to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is unknown.
    fn observe(
        &mut self,
        root: &Self::Node,
        options: ObserveOptions,
        sink: MutationSink<Self::Node>,
    ) -> Result<ObserverId>;

    /// Stops an observation. Unknown ids are ignored.
    fn disconnect(&mut self, observer: ObserverId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_options() {
        let options = ObserveOptions::structure();
        assert!(options.child_list);
        assert!(options.subtree);
        assert!(!options.reports_attribute("class"));
    }

    #[test]
    fn test_attribute_filter_is_case_insensitive() {
        let options = ObserveOptions::structure().with_attributes(["class", "aria-label"]);
        assert!(options.reports_attribute("class"));
        assert!(options.reports_attribute("ARIA-LABEL"));
        assert!(!options.reports_attribute("style"));
        assert!(options.attribute_old_value);
    }

    #[test]
    fn test_unfiltered_attributes() {
        let options = ObserveOptions {
            attributes: true,
            ..ObserveOptions::default()
        };
        assert!(options.reports_attribute("anything"));
    }
}
