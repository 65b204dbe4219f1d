use anyhow::{Result, anyhow};
use std::fmt;

use crate::content::code::{InlineCode, TagType, UNASSIGNED_ID};
use crate::encoders::{Encoder, EncoderContext};

// @module: Coded text fragment with inline codes

/// Marker character for an opening inline code
pub const MARKER_OPENING: char = '\u{E101}';

/// Marker character for a closing inline code
pub const MARKER_CLOSING: char = '\u{E102}';

/// Marker character for an isolated (placeholder) inline code
pub const MARKER_ISOLATED: char = '\u{E103}';

/// Base value for encoding code indices as characters
pub const CHARBASE: u32 = 0xE110;

/// Highest code index representable by an index character. The index
/// characters must stay inside the private use area.
const MAX_CODE_INDEX: usize = (0xF8FF - CHARBASE) as usize;

/// Encode a code index into its marker index character
pub fn to_char(index: usize) -> Option<char> {
    if index > MAX_CODE_INDEX {
        return None;
    }
    char::from_u32(CHARBASE + index as u32)
}

/// Decode a marker index character back into a code index
pub fn to_index(c: char) -> usize {
    (c as u32 - CHARBASE) as usize
}

/// Whether a character is one of the three marker kind characters
pub fn is_marker(c: char) -> bool {
    matches!(c, MARKER_OPENING | MARKER_CLOSING | MARKER_ISOLATED)
}

/// One run of a fragment: either plain text or an inline code
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentPart<'a> {
    /// A run of plain characters
    Text(&'a str),
    /// An inline code and the marker kind it was stored under
    Code(&'a InlineCode, TagType),
}

/// A pre-parsed flat representation of content with inline codes.
///
/// The model uses two stores: a coded text string and a list of
/// [`InlineCode`] objects. The coded text is composed of normal
/// characters and two-character markers; a marker is a kind character
/// (in the Unicode private use area) followed by an index character
/// pointing at the corresponding code. The fragment exclusively owns
/// its code list; codes are never shared across fragments, and they
/// are never renumbered in place. When codes must be renumbered (for
/// example during simplification) the fragment is rebuilt instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFragment {
    /// Coded text: plain characters plus markers
    text: String,

    /// Inline codes, addressed by marker index characters
    codes: Vec<InlineCode>,

    /// Highest id assigned so far
    last_code_id: i32,
}

impl TextFragment {
    /// Create an empty fragment
    pub fn new() -> Self {
        TextFragment::default()
    }

    /// Create a fragment holding plain text only
    pub fn from_text(text: &str) -> Self {
        let mut fragment = TextFragment::new();
        fragment.append_text(text);
        fragment
    }

    /// Append plain text
    pub fn append_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Append a single plain character
    pub fn append_char(&mut self, c: char) {
        self.text.push(c);
    }

    /// Append an inline code built from a tag, assigning its id.
    ///
    /// Opening and placeholder codes get a fresh id. A closing code
    /// reuses the id of the last opening code of the same type that is
    /// not closed yet; if none exists the closing code gets a fresh id
    /// and stays unpaired, which is legal.
    pub fn append_tag(&mut self, tag_type: TagType, code_type: &str, data: &str) -> Result<i32> {
        self.append_code(InlineCode::new(tag_type, code_type, data))
    }

    /// Append a pre-built inline code, assigning an id if it has none.
    /// Returns the id the code ended up with. Fails when the code list
    /// has no marker index character left.
    pub fn append_code(&mut self, mut code: InlineCode) -> Result<i32> {
        if code.id() == UNASSIGNED_ID {
            let id = match code.tag_type() {
                TagType::Closing => self.matching_opening_id(code.code_type()),
                _ => None,
            };
            let id = id.unwrap_or_else(|| {
                self.last_code_id += 1;
                self.last_code_id
            });
            code.set_id(id);
        } else if code.id() > self.last_code_id {
            self.last_code_id = code.id();
        }

        let index = self.codes.len();
        let Some(index_char) = to_char(index) else {
            return Err(anyhow!(
                "Inline code capacity exceeded: {} codes in one fragment",
                index
            ));
        };
        let id = code.id();
        let marker = match code.tag_type() {
            TagType::Opening => MARKER_OPENING,
            TagType::Closing => MARKER_CLOSING,
            TagType::Placeholder => MARKER_ISOLATED,
        };
        self.codes.push(code);
        self.text.push(marker);
        self.text.push(index_char);
        Ok(id)
    }

    /// Find the id of the last opening code with the given type that
    /// has no closing code yet
    fn matching_opening_id(&self, code_type: &str) -> Option<i32> {
        for code in self.codes.iter().rev() {
            if code.tag_type() == TagType::Opening && code.code_type() == code_type {
                let closed = self
                    .codes
                    .iter()
                    .any(|c| c.tag_type() == TagType::Closing && c.id() == code.id());
                if !closed {
                    return Some(code.id());
                }
            }
        }
        None
    }

    /// The round-trippable internal serialized form (marker string)
    pub fn coded_text(&self) -> &str {
        &self.text
    }

    /// Replace the coded text, validating that every marker index is
    /// still valid for the owned code list. Used after transformations
    /// that touch only the plain-text runs.
    pub fn set_coded_text(&mut self, text: String) -> Result<()> {
        let backup = std::mem::replace(&mut self.text, text);
        if let Err(e) = self.validate_markers() {
            self.text = backup;
            return Err(e);
        }
        Ok(())
    }

    /// The inline codes of this fragment
    pub fn codes(&self) -> &[InlineCode] {
        &self.codes
    }

    /// Access one code by marker index
    pub fn code_at(&self, index: usize) -> Option<&InlineCode> {
        self.codes.get(index)
    }

    /// Mutable access to one code by marker index
    pub fn code_at_mut(&mut self, index: usize) -> Option<&mut InlineCode> {
        self.codes.get_mut(index)
    }

    /// Whether the fragment holds nothing at all
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Whether the fragment holds at least one plain character.
    /// With `include_whitespace` set, whitespace counts as text.
    pub fn has_text(&self, include_whitespace: bool) -> bool {
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                chars.next();
                continue;
            }
            if include_whitespace || !c.is_whitespace() {
                return true;
            }
        }
        false
    }

    /// Whether the fragment holds at least one inline code
    pub fn has_code(&self) -> bool {
        !self.codes.is_empty()
    }

    /// Iterate the fragment as alternating text and code parts
    pub fn parts(&self) -> FragmentParts<'_> {
        FragmentParts {
            fragment: self,
            pos: 0,
        }
    }

    /// Raw concatenation of plain text and original code data
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for part in self.parts() {
            match part {
                FragmentPart::Text(t) => out.push_str(t),
                FragmentPart::Code(code, _) => out.push_str(code.data()),
            }
        }
        out
    }

    /// Escaped serialized form: plain-text runs go through the encoder,
    /// already-serialized inline-code data is left untouched.
    pub fn to_escaped(&self, encoder: &mut dyn Encoder, context: EncoderContext) -> String {
        let mut out = String::with_capacity(self.text.len());
        for part in self.parts() {
            match part {
                FragmentPart::Text(t) => out.push_str(&encoder.encode(t, context)),
                FragmentPart::Code(code, _) => out.push_str(code.data()),
            }
        }
        out
    }

    /// Display form with numbered pseudo-tags: `<code1>`, `</code1>`,
    /// `<code2/>`. Used for review output and for round-tripping
    /// translations supplied as plain strings.
    pub fn to_generic(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for part in self.parts() {
            match part {
                FragmentPart::Text(t) => out.push_str(t),
                FragmentPart::Code(code, kind) => match kind {
                    TagType::Opening => out.push_str(&format!("<code{}>", code.id())),
                    TagType::Closing => out.push_str(&format!("</code{}>", code.id())),
                    TagType::Placeholder => out.push_str(&format!("<code{}/>", code.id())),
                },
            }
        }
        out
    }

    /// Rebuild a fragment from a generic-form string, reusing the codes
    /// of a base fragment matched by id. Unknown code ids are an error:
    /// a translation must not invent markup.
    pub fn from_generic(generic: &str, base: &TextFragment) -> Result<TextFragment> {
        let mut fragment = TextFragment::new();
        let mut rest = generic;
        while let Some(start) = rest.find('<') {
            let (before, tag_and_rest) = rest.split_at(start);
            fragment.append_text(before);
            let Some(end) = tag_and_rest.find('>') else {
                // A lone '<' is plain text
                fragment.append_text(tag_and_rest);
                return Ok(fragment);
            };
            let tag = &tag_and_rest[1..end];
            rest = &tag_and_rest[end + 1..];
            let (body, kind) = if let Some(body) = tag.strip_prefix('/') {
                (body, TagType::Closing)
            } else if let Some(body) = tag.strip_suffix('/') {
                (body, TagType::Placeholder)
            } else {
                (tag, TagType::Opening)
            };
            let id: i32 = body
                .strip_prefix("code")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| anyhow!("Unknown tag '<{}>' in generic text", tag))?;
            let code = base
                .codes
                .iter()
                .find(|c| c.id() == id && (c.tag_type() == kind || kind == TagType::Placeholder))
                .ok_or_else(|| anyhow!("No inline code with id {} in the base fragment", id))?;
            fragment.append_code(code.clone())?;
        }
        fragment.append_text(rest);
        Ok(fragment)
    }

    /// Check that every marker index is valid and that every opening
    /// code id is unique within the fragment
    pub fn validate_markers(&self) -> Result<()> {
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            if is_marker(c) {
                let Some(index_char) = chars.next() else {
                    return Err(anyhow!("Truncated marker at end of coded text"));
                };
                let index = to_index(index_char);
                if index >= self.codes.len() {
                    return Err(anyhow!(
                        "Marker index {} out of range ({} codes)",
                        index,
                        self.codes.len()
                    ));
                }
            }
        }
        let mut opening_ids = Vec::new();
        for code in &self.codes {
            if code.tag_type() == TagType::Opening {
                if opening_ids.contains(&code.id()) {
                    return Err(anyhow!("Duplicate opening code id {}", code.id()));
                }
                opening_ids.push(code.id());
            }
        }
        Ok(())
    }

    /// Ids of opening codes with no matching closing code in this
    /// fragment. Such codes are legal; the merge stage re-joins them
    /// across forced-unit boundaries.
    pub fn unmatched_opening_ids(&self) -> Vec<i32> {
        self.codes
            .iter()
            .filter(|c| {
                c.tag_type() == TagType::Opening
                    && !self
                        .codes
                        .iter()
                        .any(|o| o.tag_type() == TagType::Closing && o.id() == c.id())
            })
            .map(|c| c.id())
            .collect()
    }
}

/// Iterator over the parts of a fragment
pub struct FragmentParts<'a> {
    fragment: &'a TextFragment,
    pos: usize,
}

impl<'a> Iterator for FragmentParts<'a> {
    type Item = FragmentPart<'a>;

    fn next(&mut self) -> Option<FragmentPart<'a>> {
        let text = &self.fragment.text[self.pos..];
        let mut chars = text.char_indices();
        let (_, first) = chars.next()?;
        if is_marker(first) {
            let (_, index_char) = chars.next()?;
            self.pos += first.len_utf8() + index_char.len_utf8();
            let code = self.fragment.codes.get(to_index(index_char))?;
            let kind = match first {
                MARKER_OPENING => TagType::Opening,
                MARKER_CLOSING => TagType::Closing,
                _ => TagType::Placeholder,
            };
            return Some(FragmentPart::Code(code, kind));
        }
        // Plain run: up to the next marker or end of text
        let mut end = text.len();
        for (i, c) in text.char_indices() {
            if is_marker(c) {
                end = i;
                break;
            }
        }
        self.pos += end;
        Some(FragmentPart::Text(&text[..end]))
    }
}

impl fmt::Display for TextFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_generic())
    }
}
