//! Sans-I/O change coordinator.
//!
//! The coordinator decides *when* rows are reconciled. It owns the lifecycle
//! (waiting for the host, attaching to the row container, following it across
//! navigations), debounces mutation notifications and schedules sweeps. It
//! performs no I/O and never sleeps:
//!
//! - mutation batches are fed in via [`Coordinator::handle_mutations`]
//! - rule-list changes are fed in via [`Coordinator::set_rules`]
//! - the next deadline is reported by [`Coordinator::poll_timeout`]
//! - due work is run by [`Coordinator::handle_timeout`]
//!
//! Time is always passed in, so the whole machine can be driven under a
//! paused clock.
//!
//! # Example
//!
//! ```
//! use rowtint_core::{Coordinator, EngineConfig, Phase};
//! use rowtint_dom::{Document, HostDom, element};
//! use tokio::time::Instant;
//!
//! let mut doc = Document::new();
//! let body = doc.body_id();
//! doc.append(
//!     body,
//!     element("table").attr("role", "grid").child(element("tbody")),
//! )
//! .unwrap();
//!
//! let (sink, _mutations) = tokio::sync::mpsc::unbounded_channel();
//! let mut coordinator = Coordinator::<Document>::new(EngineConfig::default(), sink).unwrap();
//!
//! let start = Instant::now();
//! coordinator.start(start);
//! let first_check = coordinator.poll_timeout().unwrap();
//! coordinator.handle_timeout(first_check, &mut doc);
//! assert!(matches!(coordinator.phase(), Phase::Observing(_)));
//! ```

mod batch;
mod phase;
mod scheduler;

use std::fmt;

use rowtint_dom::{HostDom, MutationBatch, MutationRecord, MutationSink, ObserveOptions, ObserverId};
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub use phase::Phase;
pub use scheduler::{Debouncer, Interval, Timer};

use self::batch::{candidate_rows, is_own_record};
use self::phase::ReadinessWait;
use crate::config::EngineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::extract::Extractor;
use crate::locator::ContainerLocator;
use crate::markers::Markers;
use crate::reconcile::{Outcome, Reconciler};
use crate::rows::RowMatcher;
use crate::rules::{Rule, RuleSet};
use crate::Result;

/// What triggered a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Every row in the container.
    Sweep,
    /// Only rows touched by recent mutations.
    Incremental,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// What triggered the pass.
    pub kind: PassKind,
    /// Rows examined.
    pub rows: usize,
    /// Rows that received a highlight.
    pub applied: usize,
    /// Rows whose highlight was removed.
    pub cleared: usize,
    /// Rows left as they were.
    pub unchanged: usize,
    /// Highlights kept on rows that had not rendered yet.
    pub preserved: usize,
    /// Rows that failed and were skipped.
    pub failed: usize,
}

impl PassReport {
    const fn new(kind: PassKind) -> Self {
        Self {
            kind,
            rows: 0,
            applied: 0,
            cleared: 0,
            unchanged: 0,
            preserved: 0,
            failed: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Cleared => self.cleared += 1,
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Preserved => self.preserved += 1,
        }
    }

    /// Returns `true` if the pass wrote anything.
    #[must_use]
    pub const fn changed_anything(&self) -> bool {
        self.applied > 0 || self.cleared > 0
    }
}

/// Running totals since the coordinator was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Passes run.
    pub passes: u64,
    /// Of which were sweeps.
    pub sweeps: u64,
    /// Rows examined across all passes.
    pub rows: u64,
    /// Rows that failed.
    pub failures: u64,
    /// Container replacements followed.
    pub navigations: u64,
}

impl EngineStats {
    fn record(&mut self, report: &PassReport) {
        self.passes += 1;
        if report.kind == PassKind::Sweep {
            self.sweeps += 1;
        }
        self.rows += report.rows as u64;
        self.failures += report.failed as u64;
    }
}

/// An installed observation of the navigation root.
#[derive(Debug, Clone)]
struct NavigationWatch<N> {
    observer: ObserverId,
    root: N,
}

/// The change coordinator state machine.
pub struct Coordinator<D: HostDom> {
    config: EngineConfig,
    locator: ContainerLocator,
    rows: RowMatcher,
    reconciler: Reconciler,
    rules: RuleSet,
    phase: Phase<D::Node>,
    sink: MutationSink<D::Node>,
    container_observer: Option<ObserverId>,
    navigation: Option<NavigationWatch<D::Node>>,
    pending: Vec<MutationRecord<D::Node>>,
    debounce: Debouncer,
    sweep: Timer,
    probe: Interval,
    readiness: Option<ReadinessWait>,
    diagnostics: Diagnostics,
    stats: EngineStats,
}

impl<D: HostDom> Coordinator<D> {
    /// Creates a coordinator. Observations it installs deliver to `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a configured
    /// selector does not parse.
    pub fn new(config: EngineConfig, sink: MutationSink<D::Node>) -> Result<Self> {
        config.validate()?;
        let markers = Markers::new(&config.markers);
        let extractor = Extractor::new(&config.selectors, &markers)?;
        Ok(Self {
            locator: ContainerLocator::new(&config.selectors)?,
            rows: RowMatcher::new(&config.selectors.rows)?,
            reconciler: Reconciler::new(extractor, markers),
            rules: RuleSet::default(),
            phase: Phase::Uninitialized,
            sink,
            container_observer: None,
            navigation: None,
            pending: Vec::new(),
            debounce: Debouncer::new(config.debounce),
            sweep: Timer::new(),
            probe: Interval::new(config.probe_interval),
            readiness: None,
            diagnostics: Diagnostics::new(),
            stats: EngineStats::default(),
            config,
        })
    }

    /// Returns the lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> &Phase<D::Node> {
        &self.phase
    }

    /// Returns the observed row container.
    #[must_use]
    pub const fn container(&self) -> Option<&D::Node> {
        self.phase.container()
    }

    /// Returns the current rule list.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns running totals.
    #[must_use]
    pub const fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Starts waiting for the host to become ready.
    pub fn start(&mut self, now: Instant) {
        if self.phase.is_started() {
            return;
        }
        info!(rules = self.rules.len(), "Starting highlighter");
        self.phase = Phase::Attaching;
        self.readiness = Some(ReadinessWait {
            next_check: now + self.config.ready_initial_delay,
            give_up_at: now + self.config.ready_timeout,
        });
    }

    /// Replaces the rule list. Once started, a sweep follows after the
    /// refresh delay.
    pub fn set_rules(&mut self, rules: Vec<Rule>, now: Instant) {
        self.rules.replace(rules);
        if self.phase.is_started() {
            info!(rules = self.rules.len(), "Rules changed; scheduling sweep");
            self.sweep.schedule(now + self.config.rule_refresh_delay);
        }
    }

    /// Feeds a batch of mutation records.
    pub fn handle_mutations(&mut self, batch: MutationBatch<D::Node>, now: Instant, dom: &mut D) {
        if self
            .navigation
            .as_ref()
            .is_some_and(|watch| watch.observer == batch.observer)
        {
            self.check_navigation(now, dom);
            return;
        }

        if self.container_observer != Some(batch.observer) {
            debug!(
                observer = batch.observer.0,
                records = batch.records.len(),
                "Dropping records from a disconnected observer"
            );
            return;
        }

        let markers = self.reconciler.markers();
        let before = self.pending.len();
        self.pending.extend(
            batch
                .records
                .into_iter()
                .filter(|record| !is_own_record(markers, record)),
        );
        if self.pending.len() > before {
            self.debounce.touch(now);
        }
    }

    /// Returns the earliest instant at which [`handle_timeout`](Self::handle_timeout)
    /// has work to do.
    #[must_use]
    pub fn poll_timeout(&self) -> Option<Instant> {
        [
            self.readiness.map(|wait| wait.next_check),
            self.probe.deadline(),
            self.sweep.deadline(),
            self.debounce.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Runs whatever is due at `now`.
    ///
    /// At most one pass runs per call. A due sweep supersedes a due debounced
    /// pass, whose records it covers.
    pub fn handle_timeout(&mut self, now: Instant, dom: &mut D) -> Option<PassReport> {
        if let Some(wait) = self.readiness {
            if now >= wait.next_check {
                self.poll_readiness(now, wait, dom);
            }
        }

        if self.probe.fire(now) {
            self.check_navigation(now, dom);
        }

        if self.sweep.fire(now) {
            self.debounce.cancel();
            self.pending.clear();
            return self.run_sweep(dom);
        }

        if self.debounce.fire(now) {
            let records = std::mem::take(&mut self.pending);
            return self.run_incremental(&records, dom);
        }

        None
    }

    /// Disconnects every observation and returns to [`Phase::Uninitialized`].
    ///
    /// Highlights already written are left in place.
    pub fn shutdown(&mut self, dom: &mut D) {
        if let Some(observer) = self.container_observer.take() {
            dom.disconnect(observer);
        }
        if let Some(watch) = self.navigation.take() {
            dom.disconnect(watch.observer);
        }
        self.phase = Phase::Uninitialized;
        self.readiness = None;
        self.pending.clear();
        self.debounce.cancel();
        self.sweep.cancel();
        self.probe.stop();
        info!(
            passes = self.stats.passes,
            rows = self.stats.rows,
            "Highlighter stopped"
        );
    }

    fn poll_readiness(&mut self, now: Instant, wait: ReadinessWait, dom: &mut D) {
        let ready = self.locator.is_host_ready(dom);
        if !ready && now < wait.give_up_at {
            self.readiness = Some(ReadinessWait {
                next_check: now + self.config.ready_poll_interval,
                ..wait
            });
            return;
        }

        self.readiness = None;
        if ready {
            info!("Host ready");
        } else {
            warn!(
                "Host not ready after {:?}; continuing anyway",
                self.config.ready_timeout
            );
        }

        self.ensure_navigation_watch(dom);
        self.probe.start(now);
        match self.locator.locate(dom) {
            Some(container) => {
                if self.attach(container, dom) {
                    self.sweep.schedule(now);
                }
            }
            None => {
                self.diagnostics
                    .report(DiagnosticKind::ContainerNotFound, "will keep probing");
            }
        }
    }

    /// Re-runs the locator and follows a replaced or vanished container.
    fn check_navigation(&mut self, now: Instant, dom: &mut D) {
        if !self.phase.is_started() || self.readiness.is_some() {
            return;
        }
        self.ensure_navigation_watch(dom);

        let found = self.locator.locate(dom);
        let current = self.phase.container().cloned();
        if ContainerLocator::is_same_container(current.as_ref(), found.as_ref()) {
            return;
        }

        match (current, found) {
            (current, Some(container)) => {
                if current.is_some() {
                    info!("Row container replaced; re-attaching");
                    self.stats.navigations += 1;
                } else {
                    info!("Row container found");
                }
                self.detach(dom);
                if self.attach(container, dom) {
                    self.sweep.schedule(now + self.config.navigation_settle);
                }
            }
            (Some(current), None) => {
                if !dom.is_connected(&current) {
                    warn!("Row container removed; waiting for a replacement");
                    self.detach(dom);
                }
            }
            (None, None) => {}
        }
    }

    /// Installs the navigation watch, or moves it if its root changed.
    fn ensure_navigation_watch(&mut self, dom: &mut D) {
        let root = self.locator.navigation_root(dom);
        if let Some(watch) = &self.navigation {
            if root.as_ref() == Some(&watch.root) && dom.is_connected(&watch.root) {
                return;
            }
        }
        if let Some(old) = self.navigation.take() {
            dom.disconnect(old.observer);
        }
        let Some(root) = root else {
            return;
        };
        match dom.observe(&root, ObserveOptions::structure(), self.sink.clone()) {
            Ok(observer) => {
                debug!(observer = observer.0, root = ?root, "Watching for navigation");
                self.navigation = Some(NavigationWatch { observer, root });
            }
            Err(e) => warn!("Failed to watch for navigation: {e}"),
        }
    }

    fn attach(&mut self, container: D::Node, dom: &mut D) -> bool {
        let options = ObserveOptions::structure()
            .with_attributes(self.config.selectors.rows.observed_attributes.clone());
        match dom.observe(&container, options, self.sink.clone()) {
            Ok(observer) => {
                info!(container = ?container, "Observing row container");
                self.container_observer = Some(observer);
                self.phase = Phase::Observing(container);
                self.diagnostics.reset(DiagnosticKind::ContainerNotFound);
                true
            }
            Err(e) => {
                warn!("Failed to observe row container: {e}");
                self.phase = Phase::Attaching;
                false
            }
        }
    }

    /// Tears the container observation down before anything new is installed.
    fn detach(&mut self, dom: &mut D) {
        if let Some(observer) = self.container_observer.take() {
            dom.disconnect(observer);
        }
        self.phase = Phase::Attaching;
        self.pending.clear();
        self.debounce.cancel();
        self.sweep.cancel();
    }

    fn run_sweep(&mut self, dom: &mut D) -> Option<PassReport> {
        let Some(container) = self.phase.container().cloned() else {
            debug!("Sweep skipped: no row container");
            return None;
        };
        let rows = self.rows.rows_in(dom, &container);
        let report = self.reconcile_rows(PassKind::Sweep, &rows, dom);
        info!(
            rows = report.rows,
            applied = report.applied,
            cleared = report.cleared,
            preserved = report.preserved,
            failed = report.failed,
            "Sweep complete"
        );
        Some(report)
    }

    fn run_incremental(
        &mut self,
        records: &[MutationRecord<D::Node>],
        dom: &mut D,
    ) -> Option<PassReport> {
        if !self.phase.is_observing() {
            return None;
        }
        let rows = candidate_rows(dom, records, &self.rows, self.reconciler.markers());
        if rows.is_empty() {
            debug!(records = records.len(), "No candidate rows in batch");
            return None;
        }
        let report = self.reconcile_rows(PassKind::Incremental, &rows, dom);
        debug!(
            rows = report.rows,
            applied = report.applied,
            cleared = report.cleared,
            failed = report.failed,
            "Incremental pass complete"
        );
        Some(report)
    }

    /// Reconciles rows in order. A failing row is logged and skipped.
    fn reconcile_rows(&mut self, kind: PassKind, rows: &[D::Node], dom: &mut D) -> PassReport {
        let mut report = PassReport::new(kind);
        for row in rows {
            report.rows += 1;
            match self.reconciler.reconcile(dom, row, &self.rules) {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    report.failed += 1;
                    warn!(row = ?row, "Failed to reconcile row: {e}");
                }
            }
        }
        self.stats.record(&report);
        report
    }
}

impl<D: HostDom> fmt::Debug for Coordinator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("phase", &self.phase)
            .field("rules", &self.rules.len())
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use std::time::Duration;

    use rowtint_dom::{Document, DomError, NodeId, Selector, element};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::rules::RuleKind;

    type DomResult<T> = rowtint_dom::Result<T>;

    const fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    struct Harness {
        doc: Document,
        coordinator: Coordinator<Document>,
        mutations: UnboundedReceiver<MutationBatch<NodeId>>,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let (sink, mutations) = mpsc::unbounded_channel();
            let mut harness = Self {
                doc: Document::new(),
                coordinator: Coordinator::new(EngineConfig::default(), sink).unwrap(),
                mutations,
                now: Instant::now(),
            };
            harness.coordinator.set_rules(
                vec![Rule::new("acme", RuleKind::SenderContains, "@acme.com", "#FF0000")],
                harness.now,
            );
            harness
        }

        fn grid(&mut self) -> (NodeId, NodeId) {
            let body = self.doc.body_id();
            let main = self
                .doc
                .append(body, element("div").attr("role", "main"))
                .unwrap();
            let table = self
                .doc
                .append(main, element("table").attr("role", "grid").child(element("tbody")))
                .unwrap();
            (table, self.doc.children(table)[0])
        }

        fn add_row(&mut self, tbody: NodeId, sender: &str) -> NodeId {
            self.doc
                .append(
                    tbody,
                    element("tr")
                        .class("zA")
                        .child(element("td").child(element("span").attr("email", sender)))
                        .child(element("td").child(element("span").class("bog").text("Hello"))),
                )
                .unwrap()
        }

        /// Advances the clock by `by`, delivering mutations and running every
        /// deadline on the way. Returns the reports produced.
        fn advance(&mut self, by: Duration) -> Vec<PassReport> {
            let target = self.now + by;
            let mut reports = Vec::new();
            loop {
                while let Ok(batch) = self.mutations.try_recv() {
                    self.coordinator
                        .handle_mutations(batch, self.now, &mut self.doc);
                }
                match self.coordinator.poll_timeout() {
                    Some(deadline) if deadline <= target => {
                        self.now = self.now.max(deadline);
                        reports.extend(self.coordinator.handle_timeout(self.now, &mut self.doc));
                    }
                    _ => break,
                }
            }
            self.now = target;
            reports
        }

        fn highlighted(&self, row: NodeId) -> Option<String> {
            self.doc.attribute(&row, "data-highlight-rule-id")
        }
    }

    #[test]
    fn test_initial_attach_sweeps_existing_rows() {
        let mut h = Harness::new();
        let (_, tbody) = h.grid();
        let row = h.add_row(tbody, "bob@acme.com");

        h.coordinator.start(h.now);
        assert_eq!(h.coordinator.poll_timeout(), Some(h.now + ms(500)));

        let reports = h.advance(ms(500));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, PassKind::Sweep);
        assert_eq!(reports[0].applied, 1);
        assert_eq!(h.coordinator.container(), Some(&tbody));
        assert_eq!(h.highlighted(row).as_deref(), Some("acme"));
    }

    #[test]
    fn test_readiness_times_out_and_keeps_probing() {
        let mut h = Harness::new();
        h.coordinator.start(h.now);

        assert!(h.advance(ms(9_000)).is_empty());
        assert_eq!(h.coordinator.phase(), &Phase::Attaching);

        h.advance(ms(1_000));
        // Readiness gave up; the periodic probe is now the only deadline.
        assert_eq!(h.coordinator.poll_timeout(), Some(h.now + ms(2_000)));

        let (_, tbody) = h.grid();
        let row = h.add_row(tbody, "bob@acme.com");
        let reports = h.advance(ms(2_000) + ms(500));
        assert_eq!(h.coordinator.container(), Some(&tbody));
        assert_eq!(reports.iter().filter(|r| r.kind == PassKind::Sweep).count(), 1);
        assert_eq!(h.highlighted(row).as_deref(), Some("acme"));
    }

    #[test]
    fn test_mutations_are_debounced_into_one_pass() {
        let mut h = Harness::new();
        let (_, tbody) = h.grid();
        h.coordinator.start(h.now);
        h.advance(ms(500));

        let first = h.add_row(tbody, "a@acme.com");
        h.advance(ms(100));
        let second = h.add_row(tbody, "b@acme.com");
        assert!(h.advance(ms(100)).is_empty());

        let reports = h.advance(ms(100));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, PassKind::Incremental);
        assert_eq!(reports[0].rows, 2);
        assert_eq!(h.highlighted(first).as_deref(), Some("acme"));
        assert_eq!(h.highlighted(second).as_deref(), Some("acme"));
    }

    #[test]
    fn test_own_writes_do_not_retrigger() {
        let mut h = Harness::new();
        let (_, tbody) = h.grid();
        h.coordinator.start(h.now);
        h.advance(ms(500));

        h.add_row(tbody, "a@acme.com");
        assert_eq!(h.advance(ms(200)).len(), 1);
        // The pass's own attribute and class writes must not schedule another.
        assert!(h.advance(ms(5_000)).iter().all(|r| r.kind != PassKind::Incremental));
    }

    #[test]
    fn test_rule_change_sweeps_after_refresh_delay() {
        let mut h = Harness::new();
        let (_, tbody) = h.grid();
        let row = h.add_row(tbody, "bob@acme.com");
        h.coordinator.start(h.now);
        h.advance(ms(500));
        assert!(h.highlighted(row).is_some());

        h.coordinator.set_rules(Vec::new(), h.now);
        assert_eq!(h.coordinator.poll_timeout(), Some(h.now + ms(100)));
        let reports = h.advance(ms(100));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].cleared, 1);
        assert!(h.highlighted(row).is_none());
    }

    #[test]
    fn test_navigation_reattaches_and_drops_stale_records() {
        let mut h = Harness::new();
        let (table, old_tbody) = h.grid();
        h.coordinator.start(h.now);
        h.advance(ms(500));
        let old_observer = h.coordinator.container_observer;

        let new_table = h
            .doc
            .replace(
                table,
                element("table").attr("role", "grid").child(
                    element("tbody").child(
                        element("tr")
                            .class("zA")
                            .child(element("span").attr("email", "c@acme.com")),
                    ),
                ),
            )
            .unwrap();
        let new_tbody = h.doc.children(new_table)[0];
        let row = h.doc.children(new_tbody)[0];

        h.advance(ms(0));
        assert_eq!(h.coordinator.container(), Some(&new_tbody));

        // A late record from the old container's observation is ignored.
        h.coordinator.handle_mutations(
            MutationBatch {
                observer: old_observer.unwrap(),
                records: vec![MutationRecord::ChildList {
                    target: old_tbody,
                    added: Vec::new(),
                    removed: Vec::new(),
                }],
            },
            h.now,
            &mut h.doc,
        );
        assert!(h.coordinator.pending.is_empty());

        assert!(h.advance(ms(499)).is_empty());
        assert!(h.highlighted(row).is_none());

        let reports = h.advance(ms(1));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, PassKind::Sweep);
        assert_eq!(h.highlighted(row).as_deref(), Some("acme"));
        assert_eq!(h.coordinator.stats().navigations, 1);
    }

    #[test]
    fn test_removed_container_returns_to_attaching() {
        let mut h = Harness::new();
        let (table, _) = h.grid();
        h.coordinator.start(h.now);
        h.advance(ms(500));

        h.doc.remove(table).unwrap();
        h.advance(ms(10));
        assert_eq!(h.coordinator.phase(), &Phase::Attaching);
    }

    #[test]
    fn test_shutdown_disconnects_everything() {
        let mut h = Harness::new();
        h.grid();
        h.coordinator.start(h.now);
        h.advance(ms(500));
        assert_eq!(h.doc.observer_count(), 2);

        h.coordinator.shutdown(&mut h.doc);
        assert_eq!(h.doc.observer_count(), 0);
        assert_eq!(h.coordinator.phase(), &Phase::Uninitialized);
        assert_eq!(h.coordinator.poll_timeout(), None);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (sink, _rx) = mpsc::unbounded_channel::<MutationBatch<NodeId>>();
        let mut config = EngineConfig::default();
        config.selectors.containers = vec!["tbody >".to_string()];
        assert!(Coordinator::<Document>::new(config, sink).is_err());
    }

    /// A document that refuses attribute writes on one row.
    struct ReadOnlyRow {
        inner: Document,
        locked: NodeId,
    }

    impl HostDom for ReadOnlyRow {
        type Node = NodeId;

        fn body(&self) -> Option<NodeId> {
            self.inner.body()
        }

        fn query_selector(&self, scope: Option<&NodeId>, selector: &Selector) -> Option<NodeId> {
            self.inner.query_selector(scope, selector)
        }

        fn query_selector_all(&self, scope: Option<&NodeId>, selector: &Selector) -> Vec<NodeId> {
            self.inner.query_selector_all(scope, selector)
        }

        fn tag_name(&self, node: &NodeId) -> Option<String> {
            self.inner.tag_name(node)
        }

        fn parent_element(&self, node: &NodeId) -> Option<NodeId> {
            self.inner.parent_element(node)
        }

        fn is_connected(&self, node: &NodeId) -> bool {
            self.inner.is_connected(node)
        }

        fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
            self.inner.attribute(node, name)
        }

        fn has_class(&self, node: &NodeId, class: &str) -> bool {
            self.inner.has_class(node, class)
        }

        fn style_property(&self, node: &NodeId, property: &str) -> Option<String> {
            self.inner.style_property(node, property)
        }

        fn text_content(&self, node: &NodeId) -> String {
            self.inner.text_content(node)
        }

        fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) -> DomResult<()> {
            if *node == self.locked {
                return Err(DomError::Host(format!("{node:?} is read-only")));
            }
            self.inner.set_attribute(node, name, value)
        }

        fn remove_attribute(&mut self, node: &NodeId, name: &str) -> DomResult<()> {
            self.inner.remove_attribute(node, name)
        }

        fn add_class(&mut self, node: &NodeId, class: &str) -> DomResult<()> {
            self.inner.add_class(node, class)
        }

        fn remove_class(&mut self, node: &NodeId, class: &str) -> DomResult<()> {
            self.inner.remove_class(node, class)
        }

        fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) -> DomResult<()> {
            self.inner.set_style_property(node, property, value)
        }

        fn remove_style_property(&mut self, node: &NodeId, property: &str) -> DomResult<()> {
            self.inner.remove_style_property(node, property)
        }

        fn observe(
            &mut self,
            root: &NodeId,
            options: ObserveOptions,
            sink: MutationSink<NodeId>,
        ) -> DomResult<ObserverId> {
            self.inner.observe(root, options, sink)
        }

        fn disconnect(&mut self, observer: ObserverId) {
            self.inner.disconnect(observer);
        }
    }

    #[test]
    fn test_failing_row_does_not_stop_siblings() {
        let mut h = Harness::new();
        let (_, tbody) = h.grid();
        let first = h.add_row(tbody, "a@acme.com");
        let locked = h.add_row(tbody, "b@acme.com");
        let last = h.add_row(tbody, "c@acme.com");

        let (sink, _mutations) = mpsc::unbounded_channel();
        let mut coordinator = Coordinator::<ReadOnlyRow>::new(EngineConfig::default(), sink).unwrap();
        let mut dom = ReadOnlyRow {
            inner: h.doc,
            locked,
        };
        let now = Instant::now();
        coordinator.set_rules(
            vec![Rule::new("acme", RuleKind::SenderContains, "@acme.com", "#FF0000")],
            now,
        );
        coordinator.start(now);
        let first_check = coordinator.poll_timeout().unwrap();
        let report = coordinator.handle_timeout(first_check, &mut dom).unwrap();

        assert_eq!(report.kind, PassKind::Sweep);
        assert_eq!(report.rows, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.applied, 2);
        assert_eq!(coordinator.stats().failures, 1);
        for row in [first, last] {
            assert_eq!(dom.attribute(&row, "data-highlight-rule-id").as_deref(), Some("acme"));
        }
        assert_eq!(dom.attribute(&locked, "data-highlight-rule-id"), None);
    }
}
