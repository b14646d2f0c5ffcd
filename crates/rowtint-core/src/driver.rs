//! The async driver around [`Coordinator`].
//!
//! One task, one logical thread: mutation batches, rule changes, deadlines and
//! shutdown are multiplexed with `tokio::select!` and each is handled to
//! completion before the next. The host tree is shared as `Rc<RefCell<_>>`
//! and only borrowed inside those synchronous steps, so the future is not
//! `Send`; run it on a current-thread runtime or a `LocalSet`.

use std::cell::RefCell;
use std::rc::Rc;

use rowtint_dom::HostDom;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info};

use crate::Result;
use crate::config::EngineConfig;
use crate::coordinator::{Coordinator, PassReport};
use crate::rules::{RuleStore, load_or_empty};

/// Runs the highlighting engine against a host document.
#[derive(Debug)]
pub struct Highlighter<S> {
    config: EngineConfig,
    store: S,
    reports: Option<mpsc::UnboundedSender<PassReport>>,
}

impl<S: RuleStore> Highlighter<S> {
    /// Creates a highlighter reading rules from `store`.
    #[must_use]
    pub const fn new(config: EngineConfig, store: S) -> Self {
        Self {
            config,
            store,
            reports: None,
        }
    }

    /// Returns a receiver for the report of every pass.
    pub fn subscribe_reports(&mut self) -> mpsc::UnboundedReceiver<PassReport> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.reports = Some(tx);
        rx
    }

    /// Runs until `shutdown` fires or its sender is dropped.
    ///
    /// A rule store that fails to load is treated as holding no rules.
    /// Observations are disconnected on exit; highlights stay in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or a configured
    /// selector does not parse.
    pub async fn run<D: HostDom>(
        self,
        dom: Rc<RefCell<D>>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        let (sink, mut mutations) = mpsc::unbounded_channel();
        let mut coordinator = Coordinator::<D>::new(self.config, sink)?;

        let mut rule_changes = self.store.subscribe();
        let rules = load_or_empty(&self.store).await;
        rule_changes.mark_unchanged();
        let mut store_open = true;

        let now = Instant::now();
        coordinator.set_rules(rules, now);
        coordinator.start(now);

        loop {
            let deadline = coordinator.poll_timeout();
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Shutdown requested");
                    break;
                }
                Some(batch) = mutations.recv() => {
                    coordinator.handle_mutations(batch, Instant::now(), &mut *dom.borrow_mut());
                }
                changed = rule_changes.changed(), if store_open => {
                    if changed.is_ok() {
                        let rules = rule_changes.borrow_and_update().clone();
                        coordinator.set_rules(rules, Instant::now());
                    } else {
                        info!("Rule store closed; keeping current rules");
                        store_open = false;
                    }
                }
                () = sleep_until_deadline(deadline) => {
                    let report = coordinator.handle_timeout(Instant::now(), &mut *dom.borrow_mut());
                    if let (Some(report), Some(reports)) = (report, &self.reports) {
                        // A dropped receiver only means nobody is listening.
                        let _ = reports.send(report);
                    }
                }
            }
        }

        coordinator.shutdown(&mut *dom.borrow_mut());
        Ok(())
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
