//! # rowtint-dom
//!
//! The host document layer for `rowtint`.
//!
//! This crate provides:
//! - [`HostDom`]: the trait through which the engine reads and annotates the
//!   host application's tree and subscribes to its mutations
//! - [`Selector`]: the CSS selector subset used by extraction and location
//!   strategies
//! - [`Document`]: an in-memory implementation with browser-like mutation
//!   observation, used for embedding and tests
//!
//! ## Example
//!
//! ```
//! use rowtint_dom::{Document, HostDom, Selector, element};
//!
//! let mut doc = Document::new();
//! let body = doc.body_id();
//! doc.append(body, element("table").attr("role", "grid").child(element("tbody")))
//!     .unwrap();
//!
//! let selector = Selector::parse("table[role=\"grid\"] tbody").unwrap();
//! let tbody = doc.query_selector(None, &selector).unwrap();
//! assert!(doc.is_connected(&tbody));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod document;
mod error;
pub mod host;
pub mod selector;

pub use document::{Document, ElementSpec, NodeId, NodeSpec, element, text};
pub use error::{DomError, Result, SelectorError};
pub use host::{HostDom, MutationBatch, MutationRecord, MutationSink, ObserveOptions, ObserverId};
pub use selector::Selector;
