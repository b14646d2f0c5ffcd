//! Locating the row container and the navigation watch root.
//!
//! The host re-renders its whole view on navigation, replacing the container
//! element. Containers are compared by identity, never by shape: a
//! structurally identical replacement is still a different container.

use rowtint_dom::{HostDom, Selector};

use crate::Result;
use crate::config::{SelectorConfig, compile_selectors};

/// Finds the element enclosing all rows.
#[derive(Debug, Clone)]
pub struct ContainerLocator {
    containers: Vec<Selector>,
    readiness: Vec<Selector>,
    navigation_root: Vec<Selector>,
}

impl ContainerLocator {
    /// Compiles the configured strategies.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured selector does not parse.
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            containers: compile_selectors(&selectors.containers)?,
            readiness: compile_selectors(&selectors.readiness)?,
            navigation_root: compile_selectors(&selectors.navigation_root)?,
        })
    }

    /// Returns the container found by the first strategy that resolves.
    pub fn locate<D: HostDom>(&self, dom: &D) -> Option<D::Node> {
        self.containers
            .iter()
            .find_map(|selector| dom.query_selector(None, selector))
    }

    /// Returns `true` if `a` and `b` are the same container element.
    #[must_use]
    pub fn is_same_container<N: PartialEq>(a: Option<&N>, b: Option<&N>) -> bool {
        a == b
    }

    /// Returns `true` once the host has rendered any readiness indicator.
    pub fn is_host_ready<D: HostDom>(&self, dom: &D) -> bool {
        self.readiness
            .iter()
            .any(|selector| dom.query_selector(None, selector).is_some())
    }

    /// Returns the element whose subtree is watched for navigation, falling
    /// back to the body.
    pub fn navigation_root<D: HostDom>(&self, dom: &D) -> Option<D::Node> {
        self.navigation_root
            .iter()
            .find_map(|selector| dom.query_selector(None, selector))
            .or_else(|| dom.body())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rowtint_dom::{Document, element};

    use super::*;

    fn locator() -> ContainerLocator {
        ContainerLocator::new(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_strategy_order() {
        let mut doc = Document::new();
        let body = doc.body_id();
        let plain = doc
            .append(body, element("table").child(element("tbody")))
            .unwrap();
        let plain_tbody = doc.children(plain)[0];
        assert_eq!(locator().locate(&doc), Some(plain_tbody));

        let grid = doc
            .append(
                body,
                element("table").attr("role", "grid").child(element("tbody")),
            )
            .unwrap();
        let grid_tbody = doc.children(grid)[0];
        assert_eq!(locator().locate(&doc), Some(grid_tbody));
    }

    #[test]
    fn test_missing_container() {
        let doc = Document::new();
        assert_eq!(locator().locate(&doc), None);
        assert!(!locator().is_host_ready(&doc));
    }

    #[test]
    fn test_replacement_is_a_different_container() {
        let mut doc = Document::new();
        let body = doc.body_id();
        let spec = element("table").attr("role", "grid").child(element("tbody"));
        let first = doc.append(body, spec.clone()).unwrap();
        let before = locator().locate(&doc);

        doc.replace(first, spec).unwrap();
        let after = locator().locate(&doc);

        assert!(after.is_some());
        assert!(!ContainerLocator::is_same_container(before.as_ref(), after.as_ref()));
        assert!(ContainerLocator::is_same_container(after.as_ref(), after.as_ref()));
    }

    #[test]
    fn test_navigation_root_falls_back_to_body() {
        let mut doc = Document::new();
        let body = doc.body_id();
        assert_eq!(locator().navigation_root(&doc), Some(body));

        let main = doc.append(body, element("div").attr("role", "main")).unwrap();
        assert_eq!(locator().navigation_root(&doc), Some(main));
        assert!(locator().is_host_ready(&doc));
    }
}
