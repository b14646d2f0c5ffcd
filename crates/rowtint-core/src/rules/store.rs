//! The rule store seam.
//!
//! The persistent store belongs to the rule-management component; the engine
//! only loads the list once and then follows change notifications.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::model::Rule;
use super::set::parse_rules;
use crate::Result;
use crate::config::STORAGE_KEY;

/// Source of the rule list.
pub trait RuleStore {
    /// Loads the current rule list.
    fn load(&self) -> impl Future<Output = Result<Vec<Rule>>> + Send;

    /// Subscribes to changes. Each notification carries the complete new list.
    fn subscribe(&self) -> watch::Receiver<Vec<Rule>>;
}

/// Loads rules, treating any failure as an empty list.
pub async fn load_or_empty<S: RuleStore>(store: &S) -> Vec<Rule> {
    match store.load().await {
        Ok(rules) => {
            debug!("Loaded {} rules", rules.len());
            rules
        }
        Err(e) => {
            warn!("Failed to load rules, continuing with none: {e}");
            Vec::new()
        }
    }
}

/// An in-process rule store backed by a watch channel.
///
/// Clones share the same underlying list.
#[derive(Debug, Clone)]
pub struct MemoryRuleStore {
    sender: Arc<watch::Sender<Vec<Rule>>>,
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryRuleStore {
    /// Creates a store holding `rules`.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        let (sender, _) = watch::channel(rules);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a store from a raw stored value.
    #[must_use]
    pub fn from_raw(value: &Value) -> Self {
        Self::new(parse_rules(value))
    }

    /// Creates a store from a storage snapshot keyed by [`STORAGE_KEY`].
    ///
    /// A snapshot without the key holds no rules.
    #[must_use]
    pub fn from_storage(items: &Value) -> Self {
        Self::from_raw(items.get(STORAGE_KEY).unwrap_or(&Value::Null))
    }

    /// Applies a storage change set of the form `{key: {oldValue, newValue}}`.
    ///
    /// Returns `false` and leaves the rules alone if the rule key did not
    /// change. A change without `newValue` removed the rules.
    pub fn apply_storage_change(&self, changes: &Value) -> bool {
        let Some(change) = changes.get(STORAGE_KEY) else {
            return false;
        };
        debug!("Stored rules changed");
        self.set_raw(change.get("newValue").unwrap_or(&Value::Null));
        true
    }

    /// Replaces the rule list and notifies subscribers.
    pub fn set_rules(&self, rules: Vec<Rule>) {
        self.sender.send_replace(rules);
    }

    /// Replaces the rule list from a raw stored value and notifies subscribers.
    pub fn set_raw(&self, value: &Value) {
        self.set_rules(parse_rules(value));
    }

    /// Applies an edit to the rule list and notifies subscribers.
    pub fn update(&self, edit: impl FnOnce(&mut Vec<Rule>)) {
        self.sender.send_modify(edit);
    }

    /// Returns a copy of the current list.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        self.sender.borrow().clone()
    }
}

impl RuleStore for MemoryRuleStore {
    async fn load(&self) -> Result<Vec<Rule>> {
        Ok(self.rules())
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Rule>> {
        self.sender.subscribe()
    }
}
