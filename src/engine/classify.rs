/*!
 * Element classification.
 *
 * The traversal asks a `NodeClassifier` what role each element plays.
 * The default implementation is driven entirely by the configured
 * `RuleSet`, which keeps the engine itself grammar-agnostic.
 */

use std::collections::BTreeMap;

use crate::app_config::RuleSet;
use crate::dom::{Document, NodeId};
use crate::errors::InputError;

/// Role an element plays in the traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeVerdict {
    /// Opens an extraction scope; its text becomes unit content
    Content,
    /// Becomes a paired or placeholder inline code inside a scope
    Inline,
    /// Forces a unit split inside a scope
    Break,
    /// Passed through verbatim behind a reference placeholder
    Embedded,
    /// Opens a structural group
    Group,
    /// Never extracted, carried as protected data
    Skip,
    /// No specific role; markup inside a scope, skeleton outside
    Default,
}

/// Metadata captured when an extraction scope opens
#[derive(Debug, Clone, Default)]
pub struct ScopeMeta {
    pub name: Option<String>,
    pub note: Option<String>,
    pub preserve_whitespace: Option<bool>,
    pub annotations: BTreeMap<String, String>,
}

/// Decides the role and metadata of each element
pub trait NodeClassifier {
    fn classify(&self, doc: &Document, node: NodeId) -> Result<NodeVerdict, InputError>;

    /// Whether the element's content may be extracted at all
    fn is_translatable(&self, _doc: &Document, _node: NodeId) -> bool {
        true
    }

    /// Metadata for a scope opened on this element
    fn scope_meta(&self, _doc: &Document, _node: NodeId) -> ScopeMeta {
        ScopeMeta::default()
    }
}

// @module: RuleSet-driven classifier
pub struct RuleClassifier {
    rules: RuleSet,
}

impl RuleClassifier {
    pub fn new(rules: RuleSet) -> Self {
        RuleClassifier { rules }
    }
}

impl NodeClassifier for RuleClassifier {
    fn classify(&self, doc: &Document, node: NodeId) -> Result<NodeVerdict, InputError> {
        let name = match doc.name(node) {
            Some(n) => n,
            None => return Ok(NodeVerdict::Default),
        };
        if let Some(attr) = self.rules.required_attributes.get(name) {
            if doc.attr(node, attr).is_none() {
                return Err(InputError::MissingAttribute {
                    element: name.to_string(),
                    attribute: attr.clone(),
                });
            }
        }
        let verdict = if self.rules.skip_elements.contains(name) {
            NodeVerdict::Skip
        } else if self.rules.content_elements.contains(name) {
            NodeVerdict::Content
        } else if self.rules.inline_elements.contains(name) {
            NodeVerdict::Inline
        } else if self.rules.break_elements.contains(name) {
            NodeVerdict::Break
        } else if self.rules.group_elements.contains(name) {
            NodeVerdict::Group
        } else if self.rules.embedded_elements.contains(name) {
            NodeVerdict::Embedded
        } else {
            NodeVerdict::Default
        };
        Ok(verdict)
    }

    fn is_translatable(&self, doc: &Document, node: NodeId) -> bool {
        if doc.attr(node, "translate") == Some("no") {
            return false;
        }
        match doc.name(node) {
            Some(name) => !self.rules.untranslatable_elements.contains(name),
            None => true,
        }
    }

    fn scope_meta(&self, doc: &Document, node: NodeId) -> ScopeMeta {
        let mut meta = ScopeMeta {
            name: doc.attr(node, "id").map(str::to_string),
            note: doc.attr(node, "locNote").map(str::to_string),
            preserve_whitespace: match doc.attr(node, "xml:space") {
                Some("preserve") => Some(true),
                Some("default") => Some(false),
                _ => None,
            },
            annotations: BTreeMap::new(),
        };
        if let crate::dom::NodeKind::Element { attrs, .. } = doc.kind(node) {
            for (key, value) in attrs {
                if let Some(stripped) = key.strip_prefix("its:") {
                    meta.annotations.insert(stripped.to_string(), value.clone());
                }
            }
        }
        meta
    }
}
