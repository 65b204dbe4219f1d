use std::collections::BTreeMap;
use std::fmt;

// @module: Inline code representation

/// Kinds of tag an inline code can stand for.
///
/// `Placeholder` means the code is self-contained and has no matching
/// pair; `Opening` and `Closing` pair up through a shared id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    Opening,
    Closing,
    Placeholder,
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagType::Opening => write!(f, "opening"),
            TagType::Closing => write!(f, "closing"),
            TagType::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Id value of a code that has not been assigned one yet
pub const UNASSIGNED_ID: i32 = -1;

/// One inline markup unit embedded inside extracted text.
///
/// An inline code carries the original serialized form of the markup it
/// replaces, so the merge stage can re-emit it byte-for-byte. Every
/// opening code has at most one closing code with the same id within
/// the same fragment; an unmatched opening at fragment end is legal
/// (its close lives in a sibling fragment) and is tracked by the merge
/// stage through the forced-unit mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineCode {
    // @field: Numeric id, unique per fragment; pairs opening with closing
    id: i32,

    // @field: Tag kind
    tag_type: TagType,

    // @field: Semantic category ("bold", "lb", "x-ref", ...)
    code_type: String,

    // @field: Original serialized form
    data: String,

    // @field: Optional key/value metadata attached by the traversal
    annotations: BTreeMap<String, String>,
}

impl InlineCode {
    /// Create a new inline code with an unassigned id
    pub fn new(tag_type: TagType, code_type: &str, data: &str) -> Self {
        InlineCode {
            id: UNASSIGNED_ID,
            tag_type,
            code_type: code_type.to_string(),
            data: data.to_string(),
            annotations: BTreeMap::new(),
        }
    }

    /// Create a new inline code with an explicit id
    pub fn with_id(id: i32, tag_type: TagType, code_type: &str, data: &str) -> Self {
        let mut code = Self::new(tag_type, code_type, data);
        code.id = id;
        code
    }

    /// Numeric id of the code
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Set the numeric id
    pub fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    /// Tag kind of the code
    pub fn tag_type(&self) -> TagType {
        self.tag_type
    }

    /// Change the tag kind. Used when an unmatched opening code is
    /// degraded to a placeholder at end of document.
    pub fn set_tag_type(&mut self, tag_type: TagType) {
        self.tag_type = tag_type;
    }

    /// Semantic category label
    pub fn code_type(&self) -> &str {
        &self.code_type
    }

    /// Original serialized form
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Append to the original serialized form
    pub fn append_data(&mut self, more: &str) {
        self.data.push_str(more);
    }

    /// Attach an annotation
    pub fn set_annotation(&mut self, key: &str, value: &str) {
        self.annotations.insert(key.to_string(), value.to_string());
    }

    /// Look up an annotation
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(|s| s.as_str())
    }

    /// Whether the code carries the given annotation
    pub fn has_annotation(&self, key: &str) -> bool {
        self.annotations.contains_key(key)
    }
}

impl fmt::Display for InlineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} id={} type={} data={:?}]",
            self.tag_type, self.id, self.code_type, self.data
        )
    }
}
