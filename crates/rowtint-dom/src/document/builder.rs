//! Declarative construction of document fragments.

/// A node to be created in a [`Document`](super::Document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    /// An element with attributes and children.
    Element(ElementSpec),
    /// A text node.
    Text(String),
}

/// An element to be created, built fluently.
///
/// ```
/// use rowtint_dom::element;
///
/// let row = element("tr")
///     .class("zA")
///     .attr("role", "row")
///     .child(element("td").class("yW").child(element("span").attr("email", "bob@acme.com")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<NodeSpec>,
}

/// Starts an element specification.
#[must_use]
pub fn element(tag: &str) -> ElementSpec {
    ElementSpec {
        tag: tag.to_ascii_lowercase(),
        attributes: Vec::new(),
        children: Vec::new(),
    }
}

/// Creates a text node specification.
#[must_use]
pub fn text(value: impl Into<String>) -> NodeSpec {
    NodeSpec::Text(value.into())
}

impl ElementSpec {
    /// Sets an attribute, replacing an earlier value of the same name.
    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((name, value.to_string()));
        }
        self
    }

    /// Appends a class to the `class` attribute.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n == "class") {
            if !slot.1.is_empty() {
                slot.1.push(' ');
            }
            slot.1.push_str(class);
            self
        } else {
            self.attr("class", class)
        }
    }

    /// Appends a text child.
    #[must_use]
    pub fn text(mut self, value: &str) -> Self {
        self.children.push(NodeSpec::Text(value.to_string()));
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<NodeSpec>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<NodeSpec>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<ElementSpec> for NodeSpec {
    fn from(spec: ElementSpec) -> Self {
        Self::Element(spec)
    }
}

impl From<&str> for NodeSpec {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_accumulates() {
        let spec = element("TR").class("zA").class("zE").attr("role", "row");
        assert_eq!(spec.tag, "tr");
        assert_eq!(
            spec.attributes,
            vec![
                ("class".to_string(), "zA zE".to_string()),
                ("role".to_string(), "row".to_string())
            ]
        );
    }

    #[test]
    fn test_attr_replaces() {
        let spec = element("span").attr("title", "a").attr("TITLE", "b");
        assert_eq!(spec.attributes, vec![("title".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_children() {
        let spec = element("td").text("hi").children([element("b"), element("i")]);
        assert_eq!(spec.children.len(), 3);
        assert_eq!(spec.children[0], NodeSpec::Text("hi".to_string()));
    }
}
