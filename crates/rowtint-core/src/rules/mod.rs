//! Highlighting rules: model, matching, the in-memory list and the store seam.
//!
//! Rules are owned by the rule-management component. The engine reads them
//! in priority order and never writes them back.
//!
//! # Example
//!
//! ```
//! use rowtint_core::rules::{Rule, RuleKind, RuleSet};
//! use rowtint_core::RowData;
//!
//! let rules = RuleSet::new(vec![
//!     Rule::new("work", RuleKind::SenderContains, "@acme.com", "#FF0000"),
//!     Rule::new("vip", RuleKind::LabelContains, "Urgent, VIP", "#00FF00"),
//! ]);
//!
//! let row = RowData::new("bob@example.com", "Lunch?", ["VIP"]);
//! assert_eq!(rules.first_match(&row).map(|r| r.id.as_str()), Some("vip"));
//! ```

mod matcher;
mod model;
mod set;
mod store;

pub use matcher::{find_first_match, matches_any, rule_matches};
pub use model::{Rule, RuleId, RuleKind};
pub use set::{RuleSet, parse_rules};
pub use store::{MemoryRuleStore, RuleStore, load_or_empty};
