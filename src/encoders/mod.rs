/*!
 * Character-escaping framework for serializing text back into a target
 * format safely.
 *
 * Each target format gets one [`Encoder`]: it escapes the format's
 * reserved characters unconditionally, applies the configured quote
 * policy, substitutes line breaks with the declared output line-break
 * string, and falls back to numeric character references for characters
 * the declared output charset cannot represent. The
 * [`EncoderManager`] caches one encoder instance per content-type
 * identifier, lazily instantiating from a registry.
 */

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::app_config::FilterOptions;
use crate::errors::ConfigError;

pub mod json;
pub mod plain;
pub mod xml;

pub use json::JsonEncoder;
pub use plain::PlainEncoder;
pub use xml::XmlEncoder;

/// Where the text being encoded will end up. Some formats escape body
/// text, skeleton-embedded text and inline-code data differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderContext {
    /// Body text of an extracted fragment
    Text,
    /// Text embedded in skeleton parts, e.g. attribute values
    Skeleton,
    /// Data carried inside inline codes
    Inline,
}

/// Quote-escaping policy. Exactly four policies are supported; the
/// selection comes from configuration, never from the encoder itself.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QuotePolicy {
    /// Escape neither quote character
    Unescaped,
    /// Escape both quote characters with named entities
    #[default]
    All,
    /// Escape double quotes textually and single quotes numerically
    NumericSingleQuotes,
    /// Escape only double quotes
    DoubleQuotesOnly,
}

impl fmt::Display for QuotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuotePolicy::Unescaped => "unescaped",
            QuotePolicy::All => "all",
            QuotePolicy::NumericSingleQuotes => "numeric-single-quotes",
            QuotePolicy::DoubleQuotesOnly => "double-quotes-only",
        };
        write!(f, "{name}")
    }
}

impl FromStr for QuotePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "unescaped" => Ok(QuotePolicy::Unescaped),
            "all" => Ok(QuotePolicy::All),
            "numeric-single-quotes" => Ok(QuotePolicy::NumericSingleQuotes),
            "double-quotes-only" => Ok(QuotePolicy::DoubleQuotesOnly),
            _ => Err(ConfigError::UnknownQuotePolicy(s.to_string())),
        }
    }
}

/// Capability of the declared output charset.
///
/// UTF-8 and UTF-16 are universal and skip the per-character probe
/// entirely; everything else is probed through encoding_rs.
#[derive(Debug, Clone, Copy)]
pub enum Charset {
    /// Can encode every scalar value, no probe needed
    Universal,
    /// Plain 7-bit ASCII
    Ascii,
    /// Probed through the encoding_rs encoder for the labeled charset
    Probed(&'static encoding_rs::Encoding),
}

impl Charset {
    /// Whether the charset can represent the given code point
    pub fn can_encode(&self, cp: u32) -> bool {
        match self {
            Charset::Universal => true,
            Charset::Ascii => cp < 0x80,
            Charset::Probed(encoding) => {
                let Some(c) = char::from_u32(cp) else {
                    return false;
                };
                let mut buf = [0u8; 4];
                let s: &str = c.encode_utf8(&mut buf);
                let (_, _, unmappable) = encoding.encode(s);
                !unmappable
            }
        }
    }
}

/// Resolve a charset label into its capability probe. Returns None for
/// labels no known charset answers to.
pub fn charset_for_label(label: &str) -> Option<Charset> {
    let normalized = label.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "utf-8" | "utf8" | "utf-16" | "utf-16le" | "utf-16be" => Some(Charset::Universal),
        // encoding_rs resolves the ASCII labels to windows-1252, which
        // would wrongly pass 8-bit characters; probe them directly
        "us-ascii" | "ascii" | "ansi_x3.4-1968" | "iso-ir-6" => Some(Charset::Ascii),
        _ => encoding_rs::Encoding::for_label(normalized.as_bytes()).map(Charset::Probed),
    }
}

/// UTF-16 code-unit recombination state.
///
/// Encoding either half of a surrogate pair alone is incorrect; the
/// pair must be recombined into one code point before the capability
/// probe and before reference substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf16Joiner {
    pending_high: Option<u16>,
}

/// Outcome of pushing one UTF-16 code unit into the joiner
pub enum Utf16Step {
    /// A high surrogate is being held back for its pair
    Pending,
    /// A whole code point is ready
    CodePoint(u32),
    /// A surrogate arrived with no usable pair
    LoneSurrogate(u16),
}

impl Utf16Joiner {
    /// Push one code unit and see what it completes
    pub fn push(&mut self, unit: u16) -> Utf16Step {
        if (0xD800..0xDC00).contains(&unit) {
            if self.pending_high.replace(unit).is_some() {
                return Utf16Step::LoneSurrogate(unit);
            }
            return Utf16Step::Pending;
        }
        if (0xDC00..0xE000).contains(&unit) {
            return match self.pending_high.take() {
                Some(high) => {
                    let cp =
                        0x10000 + (((high as u32) - 0xD800) << 10) + ((unit as u32) - 0xDC00);
                    Utf16Step::CodePoint(cp)
                }
                None => Utf16Step::LoneSurrogate(unit),
            };
        }
        if self.pending_high.take().is_some() {
            // The held high surrogate never got its pair
            return Utf16Step::LoneSurrogate(unit);
        }
        Utf16Step::CodePoint(unit as u32)
    }

    /// Drop any held surrogate
    pub fn reset(&mut self) {
        self.pending_high = None;
    }
}

/// Per-target-format escaping strategy.
///
/// Encoders hold small amounts of per-document configuration (quote
/// policy, output charset, line break) and the UTF-16 recombination
/// state, so one instance must not be shared across documents being
/// processed concurrently.
pub trait Encoder {
    /// Apply configuration. Fails fast on an unknown output encoding
    /// or an unset line-break string.
    fn set_options(
        &mut self,
        params: &EncoderParams,
        encoding: &str,
        line_break: &str,
    ) -> Result<(), ConfigError>;

    /// Escape a string for the target format
    fn encode(&mut self, text: &str, context: EncoderContext) -> String;

    /// Escape a single code point
    fn encode_codepoint(&mut self, cp: u32, context: EncoderContext) -> String;

    /// Escape a single character
    fn encode_char(&mut self, c: char, context: EncoderContext) -> String {
        self.encode_codepoint(c as u32, context)
    }

    /// The UTF-16 recombination state of this encoder
    fn utf16_state(&mut self) -> &mut Utf16Joiner;

    /// Escape one UTF-16 code unit, recombining surrogate pairs before
    /// any probe or substitution
    fn encode_code_unit(&mut self, unit: u16, context: EncoderContext) -> String {
        match self.utf16_state().push(unit) {
            Utf16Step::Pending => String::new(),
            Utf16Step::CodePoint(cp) => self.encode_codepoint(cp, context),
            Utf16Step::LoneSurrogate(u) => {
                warn!("Lone surrogate 0x{u:04X} replaced with U+FFFD");
                self.encode_codepoint(0xFFFD, context)
            }
        }
    }

    /// Transform a property value into the format's native form.
    /// Formats with no native notion of the property return the value
    /// unchanged.
    fn to_native(&self, _property: &str, value: &str) -> String {
        value.to_string()
    }

    /// The configured output line-break string
    fn line_break(&self) -> &str;
}

/// Configuration subset the encoders care about
#[derive(Debug, Clone, Default)]
pub struct EncoderParams {
    /// Quote-escaping policy
    pub quote_policy: QuotePolicy,
    /// Escape '>' unconditionally
    pub escape_gt: bool,
    /// Escape the non-breaking space
    pub escape_nbsp: bool,
    /// Escape line breaks numerically instead of substituting
    pub escape_line_breaks: bool,
    /// Escape '/' in data-interchange output
    pub escape_forward_slashes: bool,
}

impl From<&FilterOptions> for EncoderParams {
    fn from(options: &FilterOptions) -> Self {
        EncoderParams {
            quote_policy: options.quote_policy,
            escape_gt: options.escape_gt,
            escape_nbsp: options.escape_nbsp,
            escape_line_breaks: options.escape_line_breaks,
            escape_forward_slashes: options.escape_forward_slashes,
        }
    }
}

/// Constructor entry of the encoder registry
pub type EncoderFactory = fn() -> Box<dyn Encoder>;

fn make_xml() -> Box<dyn Encoder> {
    Box::new(XmlEncoder::new())
}

fn make_json() -> Box<dyn Encoder> {
    Box::new(JsonEncoder::new())
}

fn make_plain() -> Box<dyn Encoder> {
    Box::new(PlainEncoder::new())
}

/// Default content-type to encoder mappings
static DEFAULT_MAPPINGS: Lazy<BTreeMap<&'static str, EncoderFactory>> = Lazy::new(|| {
    let mut map: BTreeMap<&'static str, EncoderFactory> = BTreeMap::new();
    map.insert("text/xml", make_xml as EncoderFactory);
    map.insert("application/xml", make_xml as EncoderFactory);
    map.insert("text/html", make_xml as EncoderFactory);
    map.insert("application/json", make_json as EncoderFactory);
    map.insert("text/plain", make_plain as EncoderFactory);
    map
});

/// Caching and lookup for the encoders used when writing out text.
///
/// One encoder instance is cached per content-type identifier and
/// lazily instantiated from the registry on first use.
pub struct EncoderManager {
    mappings: BTreeMap<String, EncoderFactory>,
    cache: BTreeMap<String, Box<dyn Encoder>>,
    current: Option<String>,
    params: EncoderParams,
    encoding: String,
    line_break: String,
}

impl EncoderManager {
    /// Create a manager with the default registry loaded
    pub fn new() -> Self {
        EncoderManager {
            mappings: DEFAULT_MAPPINGS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            cache: BTreeMap::new(),
            current: None,
            params: EncoderParams::default(),
            encoding: "UTF-8".to_string(),
            line_break: "\n".to_string(),
        }
    }

    /// Add or override a mapping. A cached instance built from a
    /// different factory is dropped.
    pub fn set_mapping(&mut self, content_type: &str, factory: EncoderFactory) {
        if let Some(existing) = self.mappings.get(content_type) {
            if *existing != factory {
                self.cache.remove(content_type);
            }
        }
        self.mappings.insert(content_type.to_string(), factory);
    }

    /// Remove a mapping and its cached instance
    pub fn remove_mapping(&mut self, content_type: &str) {
        self.mappings.remove(content_type);
        self.cache.remove(content_type);
        if self.current.as_deref() == Some(content_type) {
            self.current = None;
        }
    }

    /// Merge another manager's mappings into this one. Conflicting
    /// mappings keep the current one and log a warning.
    pub fn merge_mappings(&mut self, other: &EncoderManager) {
        for (content_type, factory) in &other.mappings {
            match self.mappings.get(content_type) {
                Some(existing) if existing != factory => {
                    warn!(
                        "Content type '{content_type}' already mapped; keeping the current encoder"
                    );
                }
                Some(_) => {}
                None => {
                    self.mappings.insert(content_type.clone(), *factory);
                }
            }
        }
    }

    /// Set the escaping options applied to every encoder this manager
    /// hands out. Fatal on an unknown encoding or empty line break.
    pub fn set_options(
        &mut self,
        params: EncoderParams,
        encoding: &str,
        line_break: &str,
    ) -> Result<(), ConfigError> {
        if line_break.is_empty() {
            return Err(ConfigError::MissingLineBreak);
        }
        if charset_for_label(encoding).is_none() {
            return Err(ConfigError::UnknownEncoding(encoding.to_string()));
        }
        self.params = params;
        self.encoding = encoding.to_string();
        self.line_break = line_break.to_string();
        for encoder in self.cache.values_mut() {
            encoder.set_options(&self.params, &self.encoding, &self.line_break)?;
        }
        Ok(())
    }

    /// Select the encoder for a content type, instantiating and
    /// configuring it on first use. Unknown content types clear the
    /// selection; encoding then passes text through unchanged.
    pub fn update_encoder(&mut self, content_type: &str) -> Result<(), ConfigError> {
        if !self.mappings.contains_key(content_type) {
            self.current = None;
            return Ok(());
        }
        if !self.cache.contains_key(content_type) {
            let factory = self.mappings[content_type];
            let mut encoder = factory();
            encoder.set_options(&self.params, &self.encoding, &self.line_break)?;
            self.cache.insert(content_type.to_string(), encoder);
        }
        self.current = Some(content_type.to_string());
        Ok(())
    }

    /// The currently selected encoder, if any
    pub fn encoder_mut(&mut self) -> Option<&mut Box<dyn Encoder>> {
        let current = self.current.clone()?;
        self.cache.get_mut(&current)
    }

    /// Escape a string with the current encoder
    pub fn encode(&mut self, text: &str, context: EncoderContext) -> String {
        match self.encoder_mut() {
            Some(encoder) => encoder.encode(text, context),
            None => text.to_string(),
        }
    }

    /// Escape one code point with the current encoder
    pub fn encode_codepoint(&mut self, cp: u32, context: EncoderContext) -> String {
        match self.encoder_mut() {
            Some(encoder) => encoder.encode_codepoint(cp, context),
            None => char::from_u32(cp).map(String::from).unwrap_or_default(),
        }
    }

    /// Escape one UTF-16 code unit with the current encoder
    pub fn encode_code_unit(&mut self, unit: u16, context: EncoderContext) -> String {
        match self.encoder_mut() {
            Some(encoder) => encoder.encode_code_unit(unit, context),
            None => char::from_u32(unit as u32)
                .map(String::from)
                .unwrap_or_default(),
        }
    }

    /// Transform a property value through the current encoder
    pub fn to_native(&self, property: &str, value: &str) -> String {
        match self.current.as_ref().and_then(|c| self.cache.get(c)) {
            Some(encoder) => encoder.to_native(property, value),
            None => value.to_string(),
        }
    }

    /// The currently selected content type
    pub fn content_type(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl Default for EncoderManager {
    fn default() -> Self {
        EncoderManager::new()
    }
}

/// Format a numeric character reference: 4-hex-digit minimum, extended
/// form for values needing more than 16 bits
pub(crate) fn numeric_reference(cp: u32) -> String {
    format!("&#x{cp:04X};")
}
