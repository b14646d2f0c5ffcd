//! Row field extraction.
//!
//! The host's markup is not a contract. Each field is read through an ordered
//! list of selector strategies and the first one that yields something wins,
//! so a single selector going stale degrades extraction instead of breaking
//! it. Extraction never fails: missing pieces read as empty fields.

mod row_data;

use std::sync::LazyLock;

use regex::Regex;
use rowtint_dom::{HostDom, Selector};
use tracing::trace;

pub use row_data::RowData;

use crate::Result;
use crate::config::{SelectorConfig, compile_selector, compile_selectors};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::markers::Markers;

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("email regex"));

/// Returns the first email-like substring of `text`.
#[must_use]
pub fn find_email(text: &str) -> Option<&str> {
    EMAIL_PATTERN.find(text).map(|m| m.as_str())
}

/// Returns `true` if `value` is a bare address rather than text containing one.
fn is_email_shaped(value: &str) -> bool {
    value.contains('@') && !value.contains(|c: char| c.is_whitespace() || c == '<' || c == '>')
}

/// Extracts [`RowData`] from row elements using compiled selector strategies.
#[derive(Debug)]
pub struct Extractor {
    email_attribute: String,
    email_holders: Selector,
    sender: Vec<Selector>,
    subject: Vec<Selector>,
    labels: Vec<Selector>,
    label_name_attribute: String,
    label_title_attribute: String,
    sender_cache: String,
    diagnostics: Diagnostics,
}

impl Extractor {
    /// Compiles the configured strategies.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selector`](crate::Error::Selector) if a configured
    /// selector does not parse.
    pub fn new(selectors: &SelectorConfig, markers: &Markers) -> Result<Self> {
        Ok(Self {
            email_attribute: selectors.email_attribute.clone(),
            email_holders: compile_selector(&format!("[{}]", selectors.email_attribute))?,
            sender: compile_selectors(&selectors.sender)?,
            subject: compile_selectors(&selectors.subject)?,
            labels: compile_selectors(&selectors.labels)?,
            label_name_attribute: selectors.label_name_attribute.clone(),
            label_title_attribute: selectors.label_title_attribute.clone(),
            sender_cache: markers.sender_cache.clone(),
            diagnostics: Diagnostics::new(),
        })
    }

    /// Extracts the fields of `row`.
    ///
    /// A sender address that was found is cached on the row so later passes
    /// survive the host collapsing the sender cell.
    pub fn extract<D: HostDom>(&mut self, dom: &mut D, row: &D::Node) -> RowData {
        let sender = self.sender(dom, row);
        let subject = self.subject(dom, row);
        let labels = self.labels(dom, row);
        let data = RowData {
            sender,
            subject,
            labels: labels.into_iter().collect(),
        };

        if data.has_usable_data() {
            if data.sender.is_empty() {
                self.diagnostics
                    .report(DiagnosticKind::SenderNotFound, format_args!("{row:?}"));
            }
            if data.subject.is_empty() {
                self.diagnostics
                    .report(DiagnosticKind::SubjectNotFound, format_args!("{row:?}"));
            }
        }

        if data.sender.contains('@')
            && dom.attribute(row, &self.sender_cache).as_deref() != Some(data.sender.as_str())
        {
            if let Err(e) = dom.set_attribute(row, &self.sender_cache, &data.sender) {
                self.diagnostics.report(DiagnosticKind::SenderCacheWrite, e);
            }
        }

        trace!(row = ?row, sender = %data.sender, subject = %data.subject, labels = ?data.labels, "Extracted row");
        data
    }

    fn sender<D: HostDom>(&self, dom: &D, row: &D::Node) -> String {
        if let Some(cached) = dom
            .attribute(row, &self.sender_cache)
            .filter(|cached| cached.contains('@'))
        {
            return cached;
        }

        let explicit = dom
            .query_selector_all(Some(row), &self.email_holders)
            .into_iter()
            .filter_map(|node| dom.attribute(&node, &self.email_attribute))
            .find(|email| email.contains('@'));
        if let Some(email) = explicit {
            return email.trim().to_string();
        }

        // A display name is kept when no address turns up anywhere.
        let mut sender = String::new();
        for selector in &self.sender {
            let Some(node) = dom.query_selector(Some(row), selector) else {
                continue;
            };
            let raw = dom
                .attribute(&node, &self.email_attribute)
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| dom.text_content(&node));
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            sender = if is_email_shaped(value) {
                value.to_string()
            } else {
                find_email(value).unwrap_or(value).to_string()
            };
            if sender.contains('@') {
                return sender;
            }
        }

        find_email(&dom.text_content(row)).map_or(sender, ToString::to_string)
    }

    fn subject<D: HostDom>(&self, dom: &D, row: &D::Node) -> String {
        self.subject
            .iter()
            .filter_map(|selector| dom.query_selector(Some(row), selector))
            .map(|node| dom.text_content(&node).trim().to_string())
            .find(|subject| !subject.is_empty())
            .unwrap_or_default()
    }

    fn labels<D: HostDom>(&self, dom: &D, row: &D::Node) -> Vec<String> {
        self.labels
            .iter()
            .flat_map(|selector| dom.query_selector_all(Some(row), selector))
            .filter_map(|node| {
                [
                    dom.attribute(&node, &self.label_name_attribute),
                    dom.attribute(&node, &self.label_title_attribute),
                    Some(dom.text_content(&node)),
                ]
                .into_iter()
                .flatten()
                .find(|value| !value.is_empty())
            })
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}
