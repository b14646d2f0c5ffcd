//! Turning a batch of mutation records into the rows worth reconciling.

use std::collections::HashSet;

use rowtint_dom::{HostDom, MutationRecord};

use crate::markers::Markers;
use crate::rows::RowMatcher;

/// Returns `true` if the record reports a write the engine made itself.
pub(crate) fn is_own_record<N>(markers: &Markers, record: &MutationRecord<N>) -> bool {
    matches!(record, MutationRecord::Attributes { name, .. } if markers.is_own_attribute(name))
}

/// Computes the rows touched by `records`, deduplicated, in first-seen order.
///
/// Added rows, rows inside added subtrees, and rows enclosing a changed node
/// are candidates. Class changes that only toggled the highlight class and
/// rows no longer in the document are skipped.
pub(crate) fn candidate_rows<D: HostDom>(
    dom: &D,
    records: &[MutationRecord<D::Node>],
    rows: &RowMatcher,
    markers: &Markers,
) -> Vec<D::Node> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    let mut push = |row: D::Node| {
        if seen.insert(row.clone()) {
            candidates.push(row);
        }
    };

    for record in records {
        match record {
            MutationRecord::ChildList {
                target,
                added,
                removed,
            } => {
                for node in added {
                    if dom.tag_name(node).is_none() {
                        continue;
                    }
                    if rows.is_row(dom, node) {
                        push(node.clone());
                    } else {
                        rows.rows_in(dom, node).into_iter().for_each(&mut push);
                    }
                }
                if !added.is_empty() || !removed.is_empty() {
                    if let Some(row) = enclosing(dom, rows, target) {
                        push(row);
                    }
                }
            }
            MutationRecord::Attributes {
                target,
                name,
                old_value,
            } => {
                if markers.is_own_attribute(name) {
                    continue;
                }
                if name == "class"
                    && markers.is_own_class_change(
                        old_value.as_deref(),
                        dom.attribute(target, "class").as_deref(),
                    )
                {
                    continue;
                }
                if let Some(row) = enclosing(dom, rows, target) {
                    push(row);
                }
            }
        }
    }

    candidates.retain(|row| dom.is_connected(row));
    candidates
}

fn enclosing<D: HostDom>(dom: &D, rows: &RowMatcher, node: &D::Node) -> Option<D::Node> {
    rows.enclosing_row(dom, node)
        .filter(|row| rows.is_row(dom, row))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rowtint_dom::{Document, NodeId, element};

    use super::*;
    use crate::config::RowConfig;

    struct Fixture {
        doc: Document,
        tbody: NodeId,
        rows: RowMatcher,
        markers: Markers,
    }

    impl Fixture {
        fn new() -> Self {
            let mut doc = Document::new();
            let body = doc.body_id();
            let tbody = doc.append(body, element("tbody")).unwrap();
            Self {
                doc,
                tbody,
                rows: RowMatcher::new(&RowConfig::default()).unwrap(),
                markers: Markers::default(),
            }
        }

        fn candidates(&self, records: &[MutationRecord<NodeId>]) -> Vec<NodeId> {
            candidate_rows(&self.doc, records, &self.rows, &self.markers)
        }
    }

    fn attr(target: NodeId, name: &str, old: Option<&str>) -> MutationRecord<NodeId> {
        MutationRecord::Attributes {
            target,
            name: name.to_string(),
            old_value: old.map(ToString::to_string),
        }
    }

    #[test]
    fn test_added_rows_and_nested_rows() {
        let mut fx = Fixture::new();
        let row = fx.doc.append(fx.tbody, element("tr").class("zA")).unwrap();
        let wrapper = fx
            .doc
            .append(
                fx.tbody,
                element("div")
                    .child(element("tr").class("zE"))
                    .child(element("tr").class("spacer")),
            )
            .unwrap();
        let nested = fx.doc.children(wrapper)[0];

        let records = vec![
            MutationRecord::ChildList {
                target: fx.tbody,
                added: vec![row, wrapper],
                removed: Vec::new(),
            },
            MutationRecord::ChildList {
                target: fx.tbody,
                added: vec![row],
                removed: Vec::new(),
            },
        ];
        assert_eq!(fx.candidates(&records), vec![row, nested]);
    }

    #[test]
    fn test_content_rendered_inside_row() {
        let mut fx = Fixture::new();
        let row = fx
            .doc
            .append(fx.tbody, element("tr").class("zA").child(element("td")))
            .unwrap();
        let td = fx.doc.children(row)[0];
        let span = fx.doc.append(td, element("span").text("late")).unwrap();

        let records = vec![MutationRecord::ChildList {
            target: td,
            added: vec![span],
            removed: Vec::new(),
        }];
        assert_eq!(fx.candidates(&records), vec![row]);
    }

    #[test]
    fn test_attribute_changes() {
        let mut fx = Fixture::new();
        let row = fx
            .doc
            .append(
                fx.tbody,
                element("tr")
                    .class("zA")
                    .class("gmail-row-highlighter")
                    .child(element("td").class("xY")),
            )
            .unwrap();
        let td = fx.doc.children(row)[0];

        assert!(fx.candidates(&[attr(row, "data-highlight-color", None)]).is_empty());
        assert!(fx.candidates(&[attr(row, "class", Some("zA"))]).is_empty());
        assert_eq!(fx.candidates(&[attr(row, "class", Some("zE"))]), vec![row]);
        assert_eq!(fx.candidates(&[attr(row, "aria-label", None)]), vec![row]);
        assert_eq!(fx.candidates(&[attr(td, "class", None)]), vec![row]);
    }

    #[test]
    fn test_detached_rows_are_skipped() {
        let mut fx = Fixture::new();
        let row = fx.doc.append(fx.tbody, element("tr").class("zA")).unwrap();
        fx.doc.remove(row).unwrap();
        let records = vec![MutationRecord::ChildList {
            target: fx.tbody,
            added: vec![row],
            removed: Vec::new(),
        }];
        assert!(fx.candidates(&records).is_empty());
    }

    #[test]
    fn test_own_record_filter() {
        let fx = Fixture::new();
        assert!(is_own_record(&fx.markers, &attr(fx.tbody, "data-highlight-rule-id", None)));
        assert!(!is_own_record(&fx.markers, &attr(fx.tbody, "class", None)));
    }
}
