//! Engine configuration.
//!
//! Everything that describes the host's markup lives here as data: the
//! ordered selector strategies for readiness, containers, rows, senders,
//! subjects and labels, and the marker names the engine writes. A host
//! redesign is handled by editing these lists, not the extraction code.

use std::time::Duration;

use rowtint_dom::Selector;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Storage key under which the rule list is persisted.
pub const STORAGE_KEY: &str = "gmailRowHighlighterRules";

/// Timing and strategy configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period after the last mutation before a pass runs.
    #[serde(rename = "debounce_ms", with = "duration_ms")]
    pub debounce: Duration,
    /// Delay between a rule-list change and the full sweep it triggers.
    #[serde(rename = "rule_refresh_delay_ms", with = "duration_ms")]
    pub rule_refresh_delay: Duration,
    /// Delay between adopting a new container and sweeping it.
    #[serde(rename = "navigation_settle_ms", with = "duration_ms")]
    pub navigation_settle: Duration,
    /// Period of the container re-probe.
    #[serde(rename = "probe_interval_ms", with = "duration_ms")]
    pub probe_interval: Duration,
    /// Delay before the first readiness check.
    #[serde(rename = "ready_initial_delay_ms", with = "duration_ms")]
    pub ready_initial_delay: Duration,
    /// Interval between readiness checks.
    #[serde(rename = "ready_poll_interval_ms", with = "duration_ms")]
    pub ready_poll_interval: Duration,
    /// Time after which the engine proceeds even if the host never looked ready.
    #[serde(rename = "ready_timeout_ms", with = "duration_ms")]
    pub ready_timeout: Duration,
    /// Selector strategies.
    pub selectors: SelectorConfig,
    /// Names of the markers written onto rows.
    pub markers: MarkerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            rule_refresh_delay: Duration::from_millis(100),
            navigation_settle: Duration::from_millis(500),
            probe_interval: Duration::from_secs(2),
            ready_initial_delay: Duration::from_millis(500),
            ready_poll_interval: Duration::from_millis(100),
            ready_timeout: Duration::from_secs(10),
            selectors: SelectorConfig::default(),
            markers: MarkerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Parses a JSON configuration document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON for this shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.debounce.is_zero() {
            return Err(Error::Config("debounce must be non-zero".to_string()));
        }
        if self.probe_interval.is_zero() || self.ready_poll_interval.is_zero() {
            return Err(Error::Config("poll intervals must be non-zero".to_string()));
        }
        if self.selectors.containers.is_empty() {
            return Err(Error::Config(
                "at least one container selector is required".to_string(),
            ));
        }
        if self.selectors.rows.tag.trim().is_empty() {
            return Err(Error::Config("row tag must not be empty".to_string()));
        }
        let prefix = &self.markers.attribute_prefix;
        if !prefix.starts_with("data-") || prefix.len() <= "data-".len() {
            return Err(Error::Config(format!(
                "marker prefix `{prefix}` must be a non-empty data- attribute prefix"
            )));
        }
        if self
            .selectors
            .rows
            .observed_attributes
            .iter()
            .any(|name| name.starts_with(prefix.as_str()))
        {
            return Err(Error::Config(
                "observed row attributes must not use the marker prefix".to_string(),
            ));
        }
        if self.markers.highlight_class.split_ascii_whitespace().count() != 1 {
            return Err(Error::Config(
                "highlight class must be a single class name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered selector strategies describing the host's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Any of these existing means the host has rendered.
    pub readiness: Vec<String>,
    /// Candidates for the navigation watch root; falls back to `<body>`.
    pub navigation_root: Vec<String>,
    /// Candidates for the element enclosing all rows, in priority order.
    pub containers: Vec<String>,
    /// How rows are recognised.
    pub rows: RowConfig,
    /// Attribute carrying an explicit email address.
    pub email_attribute: String,
    /// Sender cell candidates, in priority order.
    pub sender: Vec<String>,
    /// Subject candidates, in priority order.
    pub subject: Vec<String>,
    /// Label candidates; all matches are collected.
    pub labels: Vec<String>,
    /// Attribute preferred for a label's name.
    pub label_name_attribute: String,
    /// Attribute used when the label-name attribute is absent.
    pub label_title_attribute: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            readiness: strings(&["[role=\"main\"]", "table[role=\"grid\"]", "tbody"]),
            navigation_root: strings(&["[role=\"main\"]"]),
            containers: strings(&[
                "table[role=\"grid\"] tbody",
                "div[role=\"main\"] table tbody",
                "tbody[role=\"presentation\"]",
                "table tbody",
            ]),
            rows: RowConfig::default(),
            email_attribute: "email".to_string(),
            sender: strings(&[
                ".yW span[email]",
                ".yW",
                "span[data-hovercard-id]",
                "td span[email]",
                "td[class*=\"yW\"] span",
                "td[class*=\"yW\"]",
            ]),
            subject: strings(&[".bqe", ".y6", "span[data-thread-perm-id]", ".bog"]),
            labels: strings(&[".ar", ".at", "[data-label-name]", "span[title]"]),
            label_name_attribute: "data-label-name".to_string(),
            label_title_attribute: "title".to_string(),
        }
    }
}

/// How message rows are recognised inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowConfig {
    /// Tag name of a row element.
    pub tag: String,
    /// A row carries at least one of these classes...
    pub classes: Vec<String>,
    /// ...or this `role` attribute value.
    pub role: Option<String>,
    /// Row attributes whose changes trigger re-evaluation.
    pub observed_attributes: Vec<String>,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self {
            tag: "tr".to_string(),
            classes: strings(&["zA", "zE", "yO"]),
            role: Some("row".to_string()),
            observed_attributes: strings(&["class", "aria-label"]),
        }
    }
}

/// Names of everything the engine writes onto a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Prefix shared by all marker attributes; used to ignore our own writes.
    pub attribute_prefix: String,
    /// Class added to highlighted rows.
    pub highlight_class: String,
    /// Style property carrying the fill color.
    pub style_property: String,
    /// Color used when a rule has none.
    pub fallback_color: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            attribute_prefix: "data-highlight".to_string(),
            highlight_class: "gmail-row-highlighter".to_string(),
            style_property: "background-color".to_string(),
            fallback_color: "#FFF7CC".to_string(),
        }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Compiles one configured selector.
pub(crate) fn compile_selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|source_error| Error::Selector {
        selector: source.to_string(),
        source: source_error,
    })
}

/// Compiles an ordered selector strategy list.
pub(crate) fn compile_selectors(sources: &[String]) -> Result<Vec<Selector>> {
    sources.iter().map(|source| compile_selector(source)).collect()
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Creates a builder seeded with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Sets the debounce quiet period.
    #[must_use]
    pub const fn debounce(mut self, quiet: Duration) -> Self {
        self.config.debounce = quiet;
        self
    }

    /// Sets the delay before a sweep after a rule change.
    #[must_use]
    pub const fn rule_refresh_delay(mut self, delay: Duration) -> Self {
        self.config.rule_refresh_delay = delay;
        self
    }

    /// Sets the settle delay after navigation.
    #[must_use]
    pub const fn navigation_settle(mut self, delay: Duration) -> Self {
        self.config.navigation_settle = delay;
        self
    }

    /// Sets the container re-probe period.
    #[must_use]
    pub const fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    /// Sets the readiness polling schedule.
    #[must_use]
    pub const fn readiness(mut self, initial_delay: Duration, poll: Duration, timeout: Duration) -> Self {
        self.config.ready_initial_delay = initial_delay;
        self.config.ready_poll_interval = poll;
        self.config.ready_timeout = timeout;
        self
    }

    /// Replaces the selector strategies.
    #[must_use]
    pub fn selectors(mut self, selectors: SelectorConfig) -> Self {
        self.config.selectors = selectors;
        self
    }

    /// Replaces the marker names.
    #[must_use]
    pub fn markers(mut self, markers: MarkerConfig) -> Self {
        self.config.markers = markers;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serde helpers for durations stored as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // Required by serde with= signature
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
