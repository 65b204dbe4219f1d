use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::default::Default;
use std::path::Path;

use crate::encoders::QuotePolicy;
use crate::errors::ConfigError;

/// Filter configuration module
/// This module handles the engine configuration including loading,
/// validating and saving configuration settings. Configuration errors
/// are fatal at configuration time, before traversal starts.
/// Loose BCP-47-shaped locale tag check ("en", "fr-FR", "zh-Hant-TW", ...)
static LOCALE_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("Invalid locale tag regex")
});

/// Represents the full engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterConfig {
    /// Source language tag
    pub source_locale: String,

    /// Target language tag
    pub target_locale: String,

    /// Content-type identifier used to select the output encoder
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Traversal and escaping options
    #[serde(default)]
    pub options: FilterOptions,

    /// Element classification rules for the traversal decision table
    #[serde(default)]
    pub rules: RuleSet,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_content_type() -> String {
    "text/xml".to_string()
}

/// Per-filter traversal and escaping options
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FilterOptions {
    // @option: Quote-escaping policy for the output encoder
    #[serde(default)]
    pub quote_policy: QuotePolicy,

    // @option: Escape '>' unconditionally
    #[serde(default)]
    pub escape_gt: bool,

    // @option: Escape the non-breaking space character
    #[serde(default)]
    pub escape_nbsp: bool,

    // @option: Escape line breaks numerically instead of substituting
    #[serde(default)]
    pub escape_line_breaks: bool,

    // @option: Escape '/' in data-interchange output
    #[serde(default)]
    pub escape_forward_slashes: bool,

    // @option: Emit a text unit even when it carries only inline codes
    #[serde(default)]
    pub extract_code_only: bool,

    // @option: Split into a new text unit on explicit line-break elements
    #[serde(default = "default_true")]
    pub new_tu_on_break: bool,

    // @option: Move edge-only inline codes into the skeleton
    #[serde(default)]
    pub simplify_codes: bool,

    // @option: Skip content blocks above this text size (0 = unlimited)
    #[serde(default)]
    pub max_block_size: usize,

    // @option: Preserve whitespace in extracted fragments
    #[serde(default = "default_true")]
    pub preserve_whitespace: bool,

    /// Declared output encoding label
    #[serde(default = "default_encoding")]
    pub output_encoding: String,

    /// Output line-break string substituted for line breaks
    #[serde(default = "default_line_break")]
    pub line_break: String,
}

fn default_true() -> bool {
    true
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

fn default_line_break() -> String {
    "\n".to_string()
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            quote_policy: QuotePolicy::default(),
            escape_gt: false,
            escape_nbsp: false,
            escape_line_breaks: false,
            escape_forward_slashes: false,
            extract_code_only: false,
            new_tu_on_break: true,
            simplify_codes: false,
            max_block_size: 0,
            preserve_whitespace: true,
            output_encoding: default_encoding(),
            line_break: default_line_break(),
        }
    }
}

/// Element classification rules driving the traversal decision table.
///
/// The sets hold element names; anything unlisted falls back to plain
/// structural handling (tags become inline codes inside an open
/// fragment, skeleton pass-through outside of one).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RuleSet {
    /// Elements that open an extractable content block
    #[serde(default)]
    pub content_elements: BTreeSet<String>,

    /// Elements treated as inline codes within an open fragment
    #[serde(default)]
    pub inline_elements: BTreeSet<String>,

    /// Elements that force a mid-stream split of the open fragment
    #[serde(default)]
    pub break_elements: BTreeSet<String>,

    /// Elements that start a structural group scope
    #[serde(default)]
    pub group_elements: BTreeSet<String>,

    /// Elements replaced by a reference placeholder and passed through verbatim
    #[serde(default)]
    pub embedded_elements: BTreeSet<String>,

    /// Elements whose whole subtree is skeleton-only
    #[serde(default)]
    pub skip_elements: BTreeSet<String>,

    /// Elements whose scope is never translatable
    #[serde(default)]
    pub untranslatable_elements: BTreeSet<String>,

    /// Attributes that must be present on a given element; a missing
    /// one is a fatal input error
    #[serde(default)]
    pub required_attributes: BTreeMap<String, String>,
}

impl RuleSet {
    /// Rules for a small HTML-like markup grammar, used as a default
    /// configuration and by the test suite.
    pub fn html_like() -> Self {
        let set = |names: &[&str]| -> BTreeSet<String> {
            names.iter().map(|s| s.to_string()).collect()
        };
        RuleSet {
            content_elements: set(&["p", "li", "h1", "h2", "h3", "td", "title"]),
            inline_elements: set(&["b", "i", "u", "em", "strong", "span", "font", "sub", "sup"]),
            break_elements: set(&["br"]),
            group_elements: set(&["table", "ul", "ol", "section"]),
            embedded_elements: set(&["img", "object"]),
            skip_elements: set(&["script", "style"]),
            untranslatable_elements: set(&["code", "pre"]),
            required_attributes: [("img".to_string(), "src".to_string())]
                .into_iter()
                .collect(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the log crate's level filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FilterConfig {
    /// Create a configuration with defaults for the given locale pair
    pub fn new(source_locale: &str, target_locale: &str) -> Self {
        FilterConfig {
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
            content_type: default_content_type(),
            options: FilterOptions::default(),
            rules: RuleSet::html_like(),
            log_level: LogLevel::default(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        let config: FilterConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Validate the configuration. Any failure here is fatal and must be
    /// reported before a traversal is started.
    pub fn validate(&self) -> Result<()> {
        self.validate_config().map_err(|e| anyhow!(e))
    }

    /// Typed variant of [`validate`] for library consumers
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        if !LOCALE_TAG_REGEX.is_match(&self.source_locale) {
            return Err(ConfigError::InvalidLocale(self.source_locale.clone()));
        }
        if !LOCALE_TAG_REGEX.is_match(&self.target_locale) {
            return Err(ConfigError::InvalidLocale(self.target_locale.clone()));
        }
        if self.options.line_break.is_empty() {
            return Err(ConfigError::MissingLineBreak);
        }
        if crate::encoders::charset_for_label(&self.options.output_encoding).is_none() {
            return Err(ConfigError::UnknownEncoding(
                self.options.output_encoding.clone(),
            ));
        }
        if self.content_type.is_empty() {
            return Err(ConfigError::InvalidValue {
                option: "content_type".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig::new("en", "fr")
    }
}
