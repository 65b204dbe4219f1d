/*!
 * Subfilters: nested extraction of embedded foreign content.
 *
 * An embedded sub-tree normally travels as an opaque snapshot behind a
 * reference marker. A subfilter instead runs a nested extraction over
 * that content and contributes its units to the host stream as
 * referents: they are translated like any other unit and folded back
 * into the marker position by the writer.
 */

use log::debug;

use crate::app_config::FilterConfig;
use crate::content::TextUnit;
use crate::engine::FilterEngine;
use crate::errors::FilterError;
use crate::event::Event;

/// Nested extractor for embedded content of one format
pub trait Subfilter {
    /// Content type this subfilter handles
    fn content_type(&self) -> &str;

    /// Extract referent units from raw embedded content. Unit ids must
    /// be unique within the host document, so they are derived from
    /// `id_prefix`.
    fn extract(&mut self, content: &str, id_prefix: &str) -> Result<Vec<TextUnit>, FilterError>;
}

/// Subfilter that applies the host extraction rules to embedded
/// XML content
pub struct XmlSubfilter {
    config: FilterConfig,
}

impl XmlSubfilter {
    pub fn new(config: FilterConfig) -> Self {
        XmlSubfilter { config }
    }
}

impl Subfilter for XmlSubfilter {
    fn content_type(&self) -> &str {
        "text/xml"
    }

    fn extract(&mut self, content: &str, id_prefix: &str) -> Result<Vec<TextUnit>, FilterError> {
        let engine = FilterEngine::new(content, id_prefix, self.config.clone())?;
        let mut units = Vec::new();
        for event in engine {
            if let Some(mut unit) = event?.into_text_unit() {
                let sub_id = format!("{id_prefix}-{}", unit.id());
                unit = reid(unit, &sub_id);
                unit.set_is_referent(true);
                units.push(unit);
            }
        }
        debug!("Subfilter extracted {} referent unit(s) under {id_prefix}", units.len());
        Ok(units)
    }
}

fn reid(unit: TextUnit, id: &str) -> TextUnit {
    let mut fresh = TextUnit::new(id);
    if let Some(name) = unit.name() {
        fresh.set_name(name);
    }
    if let Some(note) = unit.note() {
        fresh.set_note(note);
    }
    for (key, value) in unit.properties() {
        fresh.set_property(key, value);
    }
    fresh.set_preserve_whitespace(unit.preserve_whitespace());
    fresh.set_source(unit.source().clone());
    if let Some(skeleton) = unit.skeleton() {
        fresh.set_skeleton(skeleton.clone());
    }
    fresh
}

/// Wrap referent units as text-unit events, ready to be spliced into a
/// host stream ahead of the unit that refers to them
pub fn as_referent_events(units: Vec<TextUnit>) -> Vec<Event> {
    units.into_iter().map(Event::TextUnit).collect()
}
