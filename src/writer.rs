/*!
 * Event-stream writer: merges translated units back into a copy of
 * the original tree and re-serializes it.
 *
 * The writer deep-clones the shared original document once, at the
 * start-document event. Node ids of every skeleton stay valid in the
 * clone because cloning preserves arena indexes. Forced units are
 * accumulated per scope until the sealing unit arrives, referent units
 * are held on a stack until a referring unit consumes them, and stored
 * reference snapshots are re-injected in place of their markers.
 */

use std::collections::BTreeMap;

use log::{error, warn};

use crate::app_config::FilterConfig;
use crate::content::{TextFragment, TextUnit};
use crate::dom::{Document, NodeId};
use crate::encoders::{EncoderContext, EncoderManager};
use crate::errors::{FilterError, ReferenceError};
use crate::event::Event;
use crate::skeleton::{MovedParts, Skeleton, REF_MARKER};

// @module: Merge stage of the pipeline

/// Counters reported after a merge run
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterStats {
    /// Units merged into the output tree
    pub merged_units: u32,
    /// Units left in their original form
    pub skipped_units: u32,
    /// Reference markers with no stored snapshot or referent
    pub missing_references: u32,
}

/// Accumulator for one forced-split run over a single scope node
#[derive(Default)]
struct ForcedRun {
    pieces: Vec<String>,
    references: Vec<(String, Document)>,
}

/// Consumes the event stream and produces the merged document
pub struct FilterWriter {
    target_locale: String,
    encoders: EncoderManager,
    working: Option<Document>,
    forced_runs: BTreeMap<NodeId, ForcedRun>,
    referents: Vec<TextUnit>,
    stats: WriterStats,
}

impl FilterWriter {
    /// Create a writer for the configured target locale and encoder
    /// options
    pub fn new(config: &FilterConfig) -> Result<Self, FilterError> {
        let mut encoders = EncoderManager::new();
        encoders.set_options(
            (&config.options).into(),
            &config.options.output_encoding,
            &config.options.line_break,
        )?;
        encoders.update_encoder(&config.content_type)?;
        Ok(FilterWriter {
            target_locale: config.target_locale.clone(),
            encoders,
            working: None,
            forced_runs: BTreeMap::new(),
            referents: Vec::new(),
            stats: WriterStats::default(),
        })
    }

    /// Feed one event of the stream
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::StartDocument(start) => {
                self.working = Some((*start.document).clone());
            }
            Event::TextUnit(unit) => self.handle_unit(unit),
            Event::Canceled => {
                warn!("Merge canceled, output is incomplete");
                self.working = None;
            }
            // Structure and skeleton parts are re-serialized from the
            // tree, not from the stream
            _ => {}
        }
    }

    /// Merge counters accumulated so far
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Serialize the merged tree. Unsealed forced runs are flushed
    /// with a warning first.
    pub fn output(&mut self) -> Result<String, FilterError> {
        if !self.forced_runs.is_empty() {
            warn!(
                "{} forced run(s) never sealed, merging their pieces as-is",
                self.forced_runs.len()
            );
            let runs = std::mem::take(&mut self.forced_runs);
            for (scope, run) in runs {
                self.splice(scope, run.pieces.concat(), run.references);
            }
        }
        match &self.working {
            Some(doc) => Ok(doc.serialize()),
            None => Err(FilterError::Unknown(
                "No document to write: stream never started or was canceled".to_string(),
            )),
        }
    }

    fn handle_unit(&mut self, unit: &TextUnit) {
        if unit.is_referent() {
            self.referents.push(unit.clone());
            return;
        }
        let skeleton = match unit.skeleton() {
            Some(skeleton) => skeleton,
            None => {
                warn!("Unit {} has no structural context, skipping", unit.id());
                self.stats.skipped_units += 1;
                return;
            }
        };
        let scope = skeleton.scope();
        let rendered = self.render(unit, skeleton);
        let run = self.forced_runs.entry(scope).or_default();
        run.pieces.push(rendered);
        for (key, snapshot) in skeleton.references() {
            run.references.push((key.clone(), snapshot.clone()));
        }
        if skeleton.forced() {
            // more pieces of this scope follow
            return;
        }
        if let Some(run) = self.forced_runs.remove(&scope) {
            self.splice(scope, run.pieces.concat(), run.references);
        }
    }

    /// Escape one unit's effective content, putting moved edge codes
    /// back around it
    fn render(&mut self, unit: &TextUnit, skeleton: &Skeleton) -> String {
        let fragment = unit.effective_content(&self.target_locale);
        let mut out = String::new();
        if let Some(MovedParts { before, .. }) = skeleton.moved_parts() {
            out.push_str(&self.render_fragment(before));
        }
        out.push_str(&self.render_fragment(fragment));
        if let Some(MovedParts { after, .. }) = skeleton.moved_parts() {
            out.push_str(&self.render_fragment(after));
        }
        out
    }

    fn render_fragment(&mut self, fragment: &TextFragment) -> String {
        match self.encoders.encoder_mut() {
            Some(encoder) => fragment.to_escaped(encoder.as_mut(), EncoderContext::Text),
            None => fragment.to_text(),
        }
    }

    /// Replace the children of `scope` in the working tree with the
    /// re-parsed rendered content, then substitute reference markers
    /// with their stored snapshots
    fn splice(&mut self, scope: NodeId, rendered: String, references: Vec<(String, Document)>) {
        let working = match self.working.as_mut() {
            Some(working) => working,
            None => {
                error!("Text unit arrived before the start of the document");
                self.stats.skipped_units += 1;
                return;
            }
        };
        let wrapped = format!("<r>{rendered}</r>");
        let parsed = match Document::parse(&wrapped) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!("Merged content is not well-formed, keeping the original: {err}");
                self.stats.skipped_units += 1;
                return;
            }
        };
        let parsed_root = match parsed.children(parsed.root()).first() {
            Some(root) => *root,
            None => {
                error!("Merged content wrapper vanished, keeping the original");
                self.stats.skipped_units += 1;
                return;
            }
        };
        working.replace_children(scope, &parsed, parsed_root);
        self.stats.merged_units += 1;

        for marker in working.find_elements(scope, REF_MARKER) {
            let key = working.attr(marker, "id").map(str::to_string);
            let resolved = match &key {
                Some(key) => Self::resolve_reference(&references, &mut self.referents, key),
                None => None,
            };
            match resolved {
                Some((replacement, content)) => {
                    working.replace_with_children(marker, &replacement, content);
                }
                None => {
                    let err = ReferenceError::MissingReferent {
                        key: key.unwrap_or_else(|| "?".to_string()),
                    };
                    warn!("{err}, dropping the marker");
                    working.detach(marker);
                    self.stats.missing_references += 1;
                }
            }
        }
    }

    /// A reference key names either a snapshot stored at extraction
    /// time or a referent unit produced by a subfilter. Returns a
    /// document and the node whose children replace the marker.
    fn resolve_reference(
        references: &[(String, Document)],
        referents: &mut Vec<TextUnit>,
        key: &str,
    ) -> Option<(Document, NodeId)> {
        if let Some((_, snapshot)) = references.iter().find(|(k, _)| k == key) {
            let root = snapshot.root();
            return Some((snapshot.clone(), root));
        }
        let position = referents.iter().rposition(|unit| unit.id() == key)?;
        let referent = referents.remove(position);
        let wrapped = format!("<r>{}</r>", referent.source().to_text());
        match Document::parse(&wrapped) {
            Ok(parsed) => {
                let wrapper = parsed.children(parsed.root()).first().copied()?;
                Some((parsed, wrapper))
            }
            Err(err) => {
                error!("Referent '{key}' is not well-formed: {err}");
                None
            }
        }
    }
}

/// Run a full event stream through a writer and return the merged
/// document
pub fn write_events<'a, I>(config: &FilterConfig, events: I) -> Result<String, FilterError>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut writer = FilterWriter::new(config)?;
    for event in events {
        writer.handle_event(event);
    }
    writer.output()
}
