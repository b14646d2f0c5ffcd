//! Recognising message rows.

use rowtint_dom::{HostDom, Selector};

use crate::Result;
use crate::config::{RowConfig, compile_selector};

/// Decides which elements are message rows.
#[derive(Debug, Clone)]
pub struct RowMatcher {
    tag: String,
    tag_selector: Selector,
    classes: Vec<String>,
    role: Option<String>,
}

impl RowMatcher {
    /// Builds a matcher from row configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the row tag is not a valid type selector.
    pub fn new(config: &RowConfig) -> Result<Self> {
        let tag = config.tag.trim().to_ascii_lowercase();
        Ok(Self {
            tag_selector: compile_selector(&tag)?,
            tag,
            classes: config.classes.clone(),
            role: config.role.clone(),
        })
    }

    /// Returns `true` if `node` is a message row.
    pub fn is_row<D: HostDom>(&self, dom: &D, node: &D::Node) -> bool {
        if dom.tag_name(node).as_deref() != Some(self.tag.as_str()) {
            return false;
        }
        self.classes.iter().any(|class| dom.has_class(node, class))
            || self
                .role
                .as_deref()
                .is_some_and(|role| dom.attribute(node, "role").as_deref() == Some(role))
    }

    /// Returns the nearest row-tagged element at or above `node`.
    ///
    /// The walk stops at the body. The result is a row candidate; callers
    /// still check [`is_row`](Self::is_row).
    pub fn enclosing_row<D: HostDom>(&self, dom: &D, node: &D::Node) -> Option<D::Node> {
        let body = dom.body();
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if body.as_ref() == Some(&candidate) {
                return None;
            }
            if dom.tag_name(&candidate).as_deref() == Some(self.tag.as_str()) {
                return Some(candidate);
            }
            current = dom.parent_element(&candidate);
        }
        None
    }

    /// Returns all rows below `scope`, in document order.
    pub fn rows_in<D: HostDom>(&self, dom: &D, scope: &D::Node) -> Vec<D::Node> {
        dom.query_selector_all(Some(scope), &self.tag_selector)
            .into_iter()
            .filter(|node| self.is_row(dom, node))
            .collect()
    }
}
