//! # rowtint-core
//!
//! Rule-driven highlighting of message rows in a live webmail list.
//!
//! The host application owns and constantly re-renders the list; this crate
//! keeps a tint on every row whose sender, subject or labels match a
//! user-defined rule, and removes it when the row or the rules change.
//!
//! This crate provides:
//! - [`rules`]: the rule model, pattern matching and the rule store seam
//! - [`Extractor`]: multi-strategy extraction of [`RowData`] from a row
//! - [`Reconciler`]: the per-row decision table and its DOM writes
//! - [`ContainerLocator`]: finding the row container by identity
//! - [`Coordinator`]: the sans-I/O state machine that debounces mutations,
//!   follows navigations and schedules sweeps
//! - [`Highlighter`]: the async driver tying a host document, a rule store
//!   and the coordinator together
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use rowtint_core::rules::{MemoryRuleStore, Rule, RuleKind};
//! use rowtint_core::{EngineConfig, Highlighter};
//! use rowtint_dom::{Document, HostDom, element};
//!
//! # #[tokio::main(flavor = "current_thread", start_paused = true)]
//! # async fn main() {
//! let dom = Rc::new(RefCell::new(Document::new()));
//! let row = {
//!     let mut doc = dom.borrow_mut();
//!     let body = doc.body_id();
//!     let table = doc
//!         .append(body, element("table").attr("role", "grid").child(element("tbody")))
//!         .unwrap();
//!     let tbody = doc.children(table)[0];
//!     doc.append(
//!         tbody,
//!         element("tr").class("zA").child(element("span").attr("email", "bob@acme.com")),
//!     )
//!     .unwrap()
//! };
//!
//! let store = MemoryRuleStore::new(vec![Rule::new(
//!     "work",
//!     RuleKind::SenderContains,
//!     "@acme.com",
//!     "#FF0000",
//! )]);
//! let (stop, shutdown) = tokio::sync::oneshot::channel();
//! let engine = Highlighter::new(EngineConfig::default(), store).run(dom.clone(), shutdown);
//!
//! let check = async {
//!     tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!     let tint = dom.borrow().style_property(&row, "background-color");
//!     stop.send(()).unwrap();
//!     tint
//! };
//! let (result, tint) = tokio::join!(engine, check);
//! result.unwrap();
//! assert_eq!(tint.as_deref(), Some("#FF0000"));
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod coordinator;
mod diagnostics;
mod driver;
mod error;
pub mod extract;
mod locator;
mod markers;
pub mod reconcile;
mod rows;
pub mod rules;

pub use config::{EngineConfig, EngineConfigBuilder, MarkerConfig, RowConfig, STORAGE_KEY, SelectorConfig};
pub use coordinator::{Coordinator, EngineStats, PassKind, PassReport, Phase};
pub use diagnostics::{DiagnosticKind, Diagnostics};
pub use driver::Highlighter;
pub use error::{Error, Result};
pub use extract::{Extractor, RowData, find_email};
pub use locator::ContainerLocator;
pub use markers::Markers;
pub use reconcile::{ClearReason, Decision, Outcome, Reconciler, decide};
pub use rows::RowMatcher;
pub use rules::{Rule, RuleId, RuleKind, RuleSet};
