use std::collections::BTreeMap;
use std::fmt;

use crate::content::fragment::TextFragment;
use crate::skeleton::Skeleton;

// @module: Atomic extractable item

/// One extracted translatable item.
///
/// Created by the traversal when extractable content is found, mutated
/// by downstream translation steps (setting target content), and only
/// read by the writer. Target fragments are keyed by locale tag.
#[derive(Debug, Clone)]
pub struct TextUnit {
    // @field: Unit id, unique within the document
    id: String,

    // @field: Resource name carried over from the source (id override)
    name: Option<String>,

    // @field: Localization note for translators
    note: Option<String>,

    // @field: Free-form properties (provenance annotations and the like)
    properties: BTreeMap<String, String>,

    // @field: Whitespace significance of the extracted content
    preserve_whitespace: bool,

    // @field: Source content
    source: TextFragment,

    // @field: Target content by locale
    targets: BTreeMap<String, TextFragment>,

    // @field: Non-extracted structural context
    skeleton: Option<Skeleton>,

    // @field: Whether this unit is referenced from another unit's inline code
    is_referent: bool,
}

impl TextUnit {
    /// Create an empty text unit
    pub fn new(id: &str) -> Self {
        TextUnit {
            id: id.to_string(),
            name: None,
            note: None,
            properties: BTreeMap::new(),
            preserve_whitespace: false,
            source: TextFragment::new(),
            targets: BTreeMap::new(),
            skeleton: None,
            is_referent: false,
        }
    }

    /// Unit id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resource name, if the source carried one
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set the resource name
    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// Localization note
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Set the localization note
    pub fn set_note(&mut self, note: &str) {
        self.note = Some(note.to_string());
    }

    /// Look up a free-form property
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|s| s.as_str())
    }

    /// Set a free-form property
    pub fn set_property(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    /// All free-form properties
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Whitespace significance flag
    pub fn preserve_whitespace(&self) -> bool {
        self.preserve_whitespace
    }

    /// Set the whitespace significance flag
    pub fn set_preserve_whitespace(&mut self, preserve: bool) {
        self.preserve_whitespace = preserve;
    }

    /// Source content
    pub fn source(&self) -> &TextFragment {
        &self.source
    }

    /// Mutable source content
    pub fn source_mut(&mut self) -> &mut TextFragment {
        &mut self.source
    }

    /// Replace the source content
    pub fn set_source(&mut self, fragment: TextFragment) {
        self.source = fragment;
    }

    /// Target content for a locale, if set
    pub fn target(&self, locale: &str) -> Option<&TextFragment> {
        self.targets.get(locale)
    }

    /// Set the target content for a locale
    pub fn set_target(&mut self, locale: &str, fragment: TextFragment) {
        self.targets.insert(locale.to_string(), fragment);
    }

    /// Locales that have target content
    pub fn target_locales(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(|s| s.as_str())
    }

    /// Target content for a locale, falling back to the source
    pub fn effective_content(&self, locale: &str) -> &TextFragment {
        self.targets.get(locale).unwrap_or(&self.source)
    }

    /// Attached skeleton
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    /// Mutable access to the attached skeleton
    pub fn skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        self.skeleton.as_mut()
    }

    /// Attach a skeleton. The skeleton lives and dies with the unit.
    pub fn set_skeleton(&mut self, skeleton: Skeleton) {
        self.skeleton = Some(skeleton);
    }

    /// Whether the unit is referenced from another unit's inline code
    pub fn is_referent(&self) -> bool {
        self.is_referent
    }

    /// Mark the unit as a referent
    pub fn set_is_referent(&mut self, referent: bool) {
        self.is_referent = referent;
    }
}

impl fmt::Display for TextUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.source.to_generic())
    }
}
