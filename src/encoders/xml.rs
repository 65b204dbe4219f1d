use crate::encoders::{
    Charset, Encoder, EncoderContext, EncoderParams, QuotePolicy, Utf16Joiner, charset_for_label,
    numeric_reference,
};
use crate::errors::ConfigError;

// @module: XML/HTML-flavored markup encoder

/// Encoder for markup targets.
///
/// Escapes the markup-reserved characters unconditionally, applies the
/// configured quote policy to body text, and always escapes both quote
/// characters in skeleton context since skeleton-embedded text mostly
/// ends up in attribute values.
pub struct XmlEncoder {
    quote_policy: QuotePolicy,
    escape_gt: bool,
    escape_nbsp: bool,
    escape_line_breaks: bool,
    charset: Charset,
    line_break: String,
    joiner: Utf16Joiner,
}

impl XmlEncoder {
    /// Create an encoder with default options (UTF-8 output)
    pub fn new() -> Self {
        XmlEncoder {
            quote_policy: QuotePolicy::default(),
            escape_gt: false,
            escape_nbsp: false,
            escape_line_breaks: false,
            charset: Charset::Universal,
            line_break: "\n".to_string(),
            joiner: Utf16Joiner::default(),
        }
    }

    fn encode_quote_double(&self, context: EncoderContext) -> &'static str {
        if context == EncoderContext::Skeleton {
            return "&quot;";
        }
        match self.quote_policy {
            QuotePolicy::Unescaped => "\"",
            _ => "&quot;",
        }
    }

    fn encode_quote_single(&self, context: EncoderContext) -> &'static str {
        if context == EncoderContext::Skeleton {
            return "&apos;";
        }
        match self.quote_policy {
            QuotePolicy::Unescaped | QuotePolicy::DoubleQuotesOnly => "'",
            QuotePolicy::All => "&apos;",
            QuotePolicy::NumericSingleQuotes => "&#39;",
        }
    }

    fn push_codepoint(&self, cp: u32, context: EncoderContext, out: &mut String) {
        match cp {
            0x26 => out.push_str("&amp;"),
            0x3C => out.push_str("&lt;"),
            0x3E => {
                if self.escape_gt {
                    out.push_str("&gt;");
                } else {
                    out.push('>');
                }
            }
            0x22 => out.push_str(self.encode_quote_double(context)),
            0x27 => out.push_str(self.encode_quote_single(context)),
            0x0A => {
                if self.escape_line_breaks {
                    out.push_str("&#10;");
                } else {
                    out.push_str(&self.line_break);
                }
            }
            0x0D => out.push_str("&#13;"),
            0xA0 => {
                if self.escape_nbsp {
                    out.push_str("&#x00A0;");
                } else if self.charset.can_encode(cp) {
                    out.push('\u{A0}');
                } else {
                    out.push_str(&numeric_reference(cp));
                }
            }
            cp if cp < 0x80 => out.push(cp as u8 as char),
            cp => {
                if self.charset.can_encode(cp) {
                    match char::from_u32(cp) {
                        Some(c) => out.push(c),
                        None => out.push_str(&numeric_reference(cp)),
                    }
                } else {
                    out.push_str(&numeric_reference(cp));
                }
            }
        }
    }
}

impl Encoder for XmlEncoder {
    fn set_options(
        &mut self,
        params: &EncoderParams,
        encoding: &str,
        line_break: &str,
    ) -> Result<(), ConfigError> {
        if line_break.is_empty() {
            return Err(ConfigError::MissingLineBreak);
        }
        self.charset = charset_for_label(encoding)
            .ok_or_else(|| ConfigError::UnknownEncoding(encoding.to_string()))?;
        self.quote_policy = params.quote_policy;
        self.escape_gt = params.escape_gt;
        self.escape_nbsp = params.escape_nbsp;
        self.escape_line_breaks = params.escape_line_breaks;
        self.line_break = line_break.to_string();
        self.joiner.reset();
        Ok(())
    }

    fn encode(&mut self, text: &str, context: EncoderContext) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            self.push_codepoint(c as u32, context, &mut out);
        }
        out
    }

    fn encode_codepoint(&mut self, cp: u32, context: EncoderContext) -> String {
        let mut out = String::new();
        self.push_codepoint(cp, context, &mut out);
        out
    }

    fn utf16_state(&mut self) -> &mut Utf16Joiner {
        &mut self.joiner
    }

    fn to_native(&self, property: &str, value: &str) -> String {
        // The approved flag maps to a state marker in markup targets
        if property == "approved" {
            return match value {
                "yes" => "final".to_string(),
                "no" => "needs-review-translation".to_string(),
                other => other.to_string(),
            };
        }
        value.to_string()
    }

    fn line_break(&self) -> &str {
        &self.line_break
    }
}

impl Default for XmlEncoder {
    fn default() -> Self {
        XmlEncoder::new()
    }
}
