use crate::encoders::{Encoder, EncoderContext, EncoderParams, Utf16Joiner};
use crate::errors::ConfigError;

// @module: Pass-through encoder for formats with no reserved characters

/// Encoder that only substitutes line breaks.
///
/// Used for plain-text targets and as the fallback when no mapping
/// exists for a content type.
pub struct PlainEncoder {
    line_break: String,
    joiner: Utf16Joiner,
}

impl PlainEncoder {
    /// Create a pass-through encoder
    pub fn new() -> Self {
        PlainEncoder {
            line_break: "\n".to_string(),
            joiner: Utf16Joiner::default(),
        }
    }
}

impl Encoder for PlainEncoder {
    fn set_options(
        &mut self,
        _params: &EncoderParams,
        _encoding: &str,
        line_break: &str,
    ) -> Result<(), ConfigError> {
        if line_break.is_empty() {
            return Err(ConfigError::MissingLineBreak);
        }
        self.line_break = line_break.to_string();
        self.joiner.reset();
        Ok(())
    }

    fn encode(&mut self, text: &str, _context: EncoderContext) -> String {
        if !text.contains('\n') {
            return text.to_string();
        }
        text.replace('\n', &self.line_break)
    }

    fn encode_codepoint(&mut self, cp: u32, _context: EncoderContext) -> String {
        if cp == 0x0A {
            return self.line_break.clone();
        }
        char::from_u32(cp).map(String::from).unwrap_or_default()
    }

    fn utf16_state(&mut self) -> &mut Utf16Joiner {
        &mut self.joiner
    }

    fn line_break(&self) -> &str {
        &self.line_break
    }
}

impl Default for PlainEncoder {
    fn default() -> Self {
        PlainEncoder::new()
    }
}
