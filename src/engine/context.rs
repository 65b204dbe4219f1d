/*!
 * Per-level traversal state.
 *
 * The engine keeps one `ContextItem` per open structural level (the
 * document root plus every open group). Paragraph-style extraction
 * scopes are tracked on the current item rather than as levels of
 * their own, so forced splits can close and reopen a scope without
 * disturbing the stack.
 */

use std::collections::BTreeMap;

use crate::content::{TagType, TextFragment};
use crate::dom::{Document, NodeId};
use crate::engine::classify::ScopeMeta;
use crate::errors::InputError;

/// Append an inline code, mapping a full code list to the fatal input
/// condition
fn append(
    fragment: &mut TextFragment,
    tag_type: TagType,
    code_type: &str,
    data: &str,
) -> Result<(), InputError> {
    fragment
        .append_tag(tag_type, code_type, data)
        .map(|_| ())
        .map_err(|_| InputError::TooManyInlineCodes)
}

// @module: Sequential identifier generator for units, groups and parts
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    counter: u32,
}

impl IdGenerator {
    pub fn new(prefix: &str) -> Self {
        IdGenerator {
            prefix: prefix.to_string(),
            counter: 0,
        }
    }

    /// Create and return the next identifier in the sequence
    pub fn create_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.prefix, self.counter)
    }

    /// The identifier most recently returned by `create_id`
    pub fn last_id(&self) -> String {
        format!("{}{}", self.prefix, self.counter)
    }
}

/// State for one open structural level of the traversal
#[derive(Debug)]
pub struct ContextItem {
    node: NodeId,
    translatable: bool,
    label: String,
    in_scope: bool,
    scope_node: Option<NodeId>,
    unit_id: String,
    unit_meta: ScopeMeta,
    fragment: TextFragment,
    references: Vec<(String, Document)>,
}

impl ContextItem {
    pub fn new(node: NodeId, translatable: bool) -> Self {
        ContextItem {
            node,
            translatable,
            label: String::new(),
            in_scope: false,
            scope_node: None,
            unit_id: String::new(),
            unit_meta: ScopeMeta::default(),
            fragment: TextFragment::new(),
            references: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_translatable(&self) -> bool {
        self.translatable
    }

    /// Resource id of the group this level was opened for
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn in_scope(&self) -> bool {
        self.in_scope
    }

    pub fn scope_node(&self) -> Option<NodeId> {
        self.scope_node
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn unit_meta(&self) -> &ScopeMeta {
        &self.unit_meta
    }

    /// Open an extraction scope rooted at `scope_node`. Any previous
    /// fragment content is discarded, so the caller must seal the
    /// current scope first.
    pub fn enter_scope(&mut self, scope_node: NodeId, unit_id: String, meta: ScopeMeta) {
        self.in_scope = true;
        self.scope_node = Some(scope_node);
        self.unit_id = unit_id;
        self.unit_meta = meta;
        self.fragment = TextFragment::new();
    }

    /// Close the scope and take its accumulated content
    pub fn take_scope(&mut self) -> (TextFragment, Vec<(String, Document)>, ScopeMeta) {
        self.in_scope = false;
        self.scope_node = None;
        (
            std::mem::take(&mut self.fragment),
            std::mem::take(&mut self.references),
            std::mem::take(&mut self.unit_meta),
        )
    }

    pub fn add_text(&mut self, text: &str) {
        self.fragment.append_text(text);
    }

    pub fn add_code(
        &mut self,
        tag_type: TagType,
        code_type: &str,
        data: &str,
    ) -> Result<(), InputError> {
        append(&mut self.fragment, tag_type, code_type, data)
    }

    pub fn add_start_tag(&mut self, doc: &Document, node: NodeId) -> Result<(), InputError> {
        let name = doc.name(node).unwrap_or_default().to_string();
        append(
            &mut self.fragment,
            TagType::Opening,
            &name,
            &doc.start_tag(node),
        )
    }

    pub fn add_end_tag(&mut self, doc: &Document, node: NodeId) -> Result<(), InputError> {
        let name = doc.name(node).unwrap_or_default().to_string();
        append(
            &mut self.fragment,
            TagType::Closing,
            &name,
            &doc.end_tag(node),
        )
    }

    pub fn add_placeholder(&mut self, doc: &Document, node: NodeId) -> Result<(), InputError> {
        let name = doc.name(node).unwrap_or_default().to_string();
        append(
            &mut self.fragment,
            TagType::Placeholder,
            &name,
            &doc.start_tag(node),
        )
    }

    pub fn add_reference(&mut self, key: String, subtree: Document) {
        self.references.push((key, subtree));
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.unit_meta.annotations
    }
}
