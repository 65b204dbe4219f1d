use crate::encoders::{
    Charset, Encoder, EncoderContext, EncoderParams, Utf16Joiner, charset_for_label,
};
use crate::errors::ConfigError;

// @module: Data-interchange (JSON) encoder

/// Encoder for JSON string values.
///
/// The double quote and backslash are always escaped; forward-slash
/// escaping is option-driven. Characters the output charset cannot
/// represent become `\uXXXX` escapes, as a surrogate pair for code
/// points above the Basic Multilingual Plane.
pub struct JsonEncoder {
    escape_forward_slashes: bool,
    charset: Charset,
    line_break: String,
    joiner: Utf16Joiner,
}

impl JsonEncoder {
    /// Create an encoder with default options (UTF-8 output)
    pub fn new() -> Self {
        JsonEncoder {
            escape_forward_slashes: false,
            charset: Charset::Universal,
            line_break: "\n".to_string(),
            joiner: Utf16Joiner::default(),
        }
    }

    fn push_codepoint(&self, cp: u32, out: &mut String) {
        match cp {
            0x22 => out.push_str("\\\""),
            0x5C => out.push_str("\\\\"),
            0x2F => {
                if self.escape_forward_slashes {
                    out.push_str("\\/");
                } else {
                    out.push('/');
                }
            }
            0x08 => out.push_str("\\b"),
            0x0C => out.push_str("\\f"),
            0x09 => out.push_str("\\t"),
            0x0A => out.push_str("\\n"),
            0x0D => out.push_str("\\r"),
            cp if cp < 0x20 => out.push_str(&format!("\\u{cp:04x}")),
            cp if cp < 0x80 => out.push(cp as u8 as char),
            cp => {
                if self.charset.can_encode(cp) {
                    match char::from_u32(cp) {
                        Some(c) => out.push(c),
                        None => push_escaped(cp, out),
                    }
                } else {
                    push_escaped(cp, out);
                }
            }
        }
    }
}

/// Emit a `\uXXXX` escape, split into a surrogate-pair escape for code
/// points above U+FFFF
fn push_escaped(cp: u32, out: &mut String) {
    if cp > 0xFFFF {
        let offset = cp - 0x10000;
        let high = 0xD800 + (offset >> 10);
        let low = 0xDC00 + (offset & 0x3FF);
        out.push_str(&format!("\\u{high:04x}\\u{low:04x}"));
    } else {
        out.push_str(&format!("\\u{cp:04x}"));
    }
}

impl Encoder for JsonEncoder {
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
        self.escape_forward_slashes = params.escape_forward_slashes;
        self.line_break = line_break.to_string();
        self.joiner.reset();
        Ok(())
    }

    fn encode(&mut self, text: &str, _context: EncoderContext) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            self.push_codepoint(c as u32, &mut out);
        }
        out
    }

    fn encode_codepoint(&mut self, cp: u32, _context: EncoderContext) -> String {
        let mut out = String::new();
        self.push_codepoint(cp, &mut out);
        out
    }

    fn utf16_state(&mut self) -> &mut Utf16Joiner {
        &mut self.joiner
    }

    fn line_break(&self) -> &str {
        &self.line_break
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        JsonEncoder::new()
    }
}
