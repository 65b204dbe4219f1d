/*!
 * Skeleton: the non-extracted structural context of a text unit.
 *
 * A skeleton records everything the merge stage needs to put a
 * (possibly translated) fragment back into its place: the shared
 * original document root, the scope node being replaced, deep-cloned
 * snapshots of referenced sub-trees, inline content temporarily moved
 * out of the fragment, and the forced flag for units that are partial
 * fragments of a larger structural unit.
 */

use std::rc::Rc;

use crate::content::fragment::TextFragment;
use crate::dom::{Document, NodeId};

/// Element name of the placeholder markers substituted by the merge
/// stage with the skeleton's cloned reference sub-trees
pub const REF_MARKER: &str = "ref-marker";

/// Build the serialized placeholder for a reference key
pub fn ref_marker(key: &str) -> String {
    format!("<{REF_MARKER} id=\"{key}\"/>")
}

/// Inline content temporarily excised from a fragment so the remaining
/// coded text stays well-formed during merge
#[derive(Debug, Clone, Default)]
pub struct MovedParts {
    /// Codes moved from the front of the fragment
    pub before: TextFragment,
    /// Codes moved from the back of the fragment
    pub after: TextFragment,
}

/// Per-text-unit record of non-extracted structure.
///
/// The original document root is shared read-only state that outlives
/// every skeleton derived from it. Reference sub-trees are deep clones
/// taken at extraction time; the live tree may be freely mutated or
/// discarded afterwards without invalidating a pending merge.
#[derive(Debug, Clone)]
pub struct Skeleton {
    /// The original document root, shared and read-only
    original: Rc<Document>,

    /// The node whose content gets replaced at merge time
    scope: NodeId,

    /// Reference key to deep-cloned sub-tree snapshots, in capture order
    references: Vec<(String, Document)>,

    /// Inline content moved out to keep the fragment well-formed
    moved_parts: Option<MovedParts>,

    /// Whether the owning unit is one fragment of a larger structural
    /// unit split across multiple units
    forced: bool,
}

impl Skeleton {
    /// Create a skeleton for a scope node of the original document
    pub fn new(original: Rc<Document>, scope: NodeId) -> Self {
        Skeleton {
            original,
            scope,
            references: Vec::new(),
            moved_parts: None,
            forced: false,
        }
    }

    /// The shared original document
    pub fn original(&self) -> &Rc<Document> {
        &self.original
    }

    /// The scope node being replaced at merge time
    pub fn scope(&self) -> NodeId {
        self.scope
    }

    /// Store a deep-cloned snapshot of a referenced sub-tree. Cloning
    /// before detachment is mandatory: the live node may be gone by the
    /// time of merge.
    pub fn add_reference(&mut self, key: &str, snapshot: Document) {
        self.references.push((key.to_string(), snapshot));
    }

    /// Whether any reference snapshots are stored
    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    /// The stored reference snapshots
    pub fn references(&self) -> &[(String, Document)] {
        &self.references
    }

    /// Look up one reference snapshot by key
    pub fn reference(&self, key: &str) -> Option<&Document> {
        self.references
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, doc)| doc)
    }

    /// Store inline content temporarily excised from the fragment
    pub fn set_moved_parts(&mut self, parts: MovedParts) {
        self.moved_parts = Some(parts);
    }

    /// The moved inline content, if any
    pub fn moved_parts(&self) -> Option<&MovedParts> {
        self.moved_parts.as_ref()
    }

    /// Whether the owning unit requires accumulation before final merge
    pub fn forced(&self) -> bool {
        self.forced
    }

    /// Flag the owning unit as a partial fragment of a larger unit
    pub fn set_forced(&mut self, forced: bool) {
        self.forced = forced;
    }
}
