//! Bringing one row's highlight in line with the rules and its content.
//!
//! The decision is a pure function of the extracted data, the rule list and
//! the markers already on the row; [`Reconciler`] turns it into DOM writes.
//! Reconciling an unchanged row twice writes nothing the second time.

use rowtint_dom::{DomError, HostDom};
use tracing::trace;

use crate::extract::{Extractor, RowData};
use crate::markers::Markers;
use crate::rules::{Rule, RuleSet, rule_matches};

/// Why a highlight is being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// Nothing matches and the row carries no highlight.
    NoMatch,
    /// The row's rule is no longer in the list.
    RuleDeleted,
    /// The row's rule was disabled.
    RuleDisabled,
    /// The row's rule no longer matches the row's content.
    NoLongerMatches,
}

/// What to do with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'r> {
    /// Highlight with this rule, replacing any prior highlight.
    Apply(&'r Rule),
    /// The row is already correct.
    Keep,
    /// Remove any highlight.
    Clear(ClearReason),
    /// Leave the highlight; the row has not rendered enough to judge it.
    Preserve,
}

/// Decides what to do with a row.
///
/// `active_id` and `active_color` are the rule ID and color currently marked
/// on the row. A row marked with the matching rule but a stale color is
/// re-applied so color edits reach rows already highlighted.
#[must_use]
pub fn decide<'r>(
    data: &RowData,
    rules: &'r RuleSet,
    active_id: Option<&str>,
    active_color: Option<&str>,
    fallback_color: &str,
) -> Decision<'r> {
    if let Some(rule) = rules.first_match(data) {
        let current = active_id == Some(rule.id.as_str())
            && active_color == Some(rule.effective_color(fallback_color));
        return if current {
            Decision::Keep
        } else {
            Decision::Apply(rule)
        };
    }

    let Some(active_id) = active_id else {
        return Decision::Clear(ClearReason::NoMatch);
    };
    match rules.get(active_id) {
        None => Decision::Clear(ClearReason::RuleDeleted),
        Some(rule) if !rule.enabled => Decision::Clear(ClearReason::RuleDisabled),
        Some(rule) if data.has_usable_data() => {
            if rule_matches(data, rule) {
                Decision::Keep
            } else {
                Decision::Clear(ClearReason::NoLongerMatches)
            }
        }
        Some(_) => Decision::Preserve,
    }
}

/// What reconciling a row did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A highlight was written.
    Applied,
    /// A highlight was removed.
    Cleared,
    /// Nothing needed to change.
    Unchanged,
    /// An existing highlight was kept although the row had no usable data.
    Preserved,
}

/// Applies [`decide`] to live rows.
#[derive(Debug)]
pub struct Reconciler {
    extractor: Extractor,
    markers: Markers,
}

impl Reconciler {
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(extractor: Extractor, markers: Markers) -> Self {
        Self { extractor, markers }
    }

    /// Returns the marker names this reconciler writes.
    #[must_use]
    pub const fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Reconciles one row against `rules`.
    ///
    /// # Errors
    ///
    /// Returns the first DOM write that failed. The row may be left partially
    /// updated; the next pass over it repairs it.
    pub fn reconcile<D: HostDom>(
        &mut self,
        dom: &mut D,
        row: &D::Node,
        rules: &RuleSet,
    ) -> Result<Outcome, DomError> {
        let data = self.extractor.extract(dom, row);
        let active_id = dom.attribute(row, &self.markers.rule_id);
        let active_color = dom.attribute(row, &self.markers.color);

        let decision = decide(
            &data,
            rules,
            active_id.as_deref(),
            active_color.as_deref(),
            &self.markers.fallback_color,
        );
        trace!(row = ?row, ?decision, "Reconciling row");

        let outcome = match decision {
            Decision::Apply(rule) => {
                self.apply(dom, row, rule)?;
                Outcome::Applied
            }
            Decision::Clear(_) => {
                if self.clear(dom, row)? {
                    Outcome::Cleared
                } else {
                    Outcome::Unchanged
                }
            }
            Decision::Keep => Outcome::Unchanged,
            Decision::Preserve => Outcome::Preserved,
        };

        if dom.attribute(row, &self.markers.processed).as_deref() != Some("true") {
            dom.set_attribute(row, &self.markers.processed, "true")?;
        }
        Ok(outcome)
    }

    fn apply<D: HostDom>(&self, dom: &mut D, row: &D::Node, rule: &Rule) -> Result<(), DomError> {
        self.clear(dom, row)?;
        let color = rule.effective_color(&self.markers.fallback_color);
        trace!(row = ?row, rule = %rule.id, kind = rule.kind.as_str(), color, "Applying highlight");
        dom.set_attribute(row, &self.markers.rule_id, rule.id.as_str())?;
        dom.add_class(row, &self.markers.highlight_class)?;
        dom.set_style_property(row, &self.markers.style_property, color)?;
        dom.set_attribute(row, &self.markers.color, color)
    }

    /// Removes every highlight marker. Returns `false` if there was nothing
    /// to remove.
    fn clear<D: HostDom>(&self, dom: &mut D, row: &D::Node) -> Result<bool, DomError> {
        let has_id = dom.attribute(row, &self.markers.rule_id).is_some();
        let has_color = dom.attribute(row, &self.markers.color).is_some();
        let has_class = dom.has_class(row, &self.markers.highlight_class);
        if !(has_id || has_color || has_class) {
            return Ok(false);
        }

        if has_id {
            dom.remove_attribute(row, &self.markers.rule_id)?;
        }
        if has_color {
            dom.remove_attribute(row, &self.markers.color)?;
        }
        if has_class {
            dom.remove_class(row, &self.markers.highlight_class)?;
        }
        dom.remove_style_property(row, &self.markers.style_property)?;
        Ok(true)
    }
}
