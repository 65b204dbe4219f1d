/*!
 * The pull-based extraction engine.
 *
 * A `FilterEngine` walks the parsed tree depth-first with an explicit
 * work stack and turns it into the linear event stream. Each call to
 * `next_event` performs a bounded amount of traversal: it steps the
 * walk until at least one event is queued, then returns the head of
 * the queue. Extraction scopes, forced splits and skeleton buffering
 * follow the decision table of the configured classifier.
 */

pub mod classify;
pub mod context;

use std::collections::VecDeque;
use std::rc::Rc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::FilterConfig;
use crate::content::unit::TextUnit;
use crate::content::TagType;
use crate::dom::{Document, NodeId, NodeKind};
use crate::errors::FilterError;
use crate::event::{DocumentPart, Ending, Event, StartDocument, StartGroup};
use crate::simplify::simplify_edges;
use crate::skeleton::{ref_marker, Skeleton};

pub use classify::{NodeClassifier, NodeVerdict, RuleClassifier, ScopeMeta};
pub use context::{ContextItem, IdGenerator};

// @module: Pull-based tree-to-event traversal

static DECL_ENCODING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"encoding="([^"]+)""#).expect("Invalid declared-encoding regex pattern")
});

/// What to do when the walk leaves a node
#[derive(Debug, Clone, Copy)]
enum LeaveAction {
    /// Seal the extraction scope opened on this node
    SealScope,
    /// Append the node's end tag as a closing inline code
    CloseInline,
    /// Close the group opened on this node
    CloseGroup,
    /// Append the node's end tag to the skeleton buffer
    CloseSkeleton,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Enter(NodeId),
    Leave(NodeId, LeaveAction),
}

/// Pull-based filter over one parsed document
pub struct FilterEngine {
    doc: Rc<Document>,
    name: String,
    config: FilterConfig,
    classifier: Box<dyn NodeClassifier>,

    walk: Vec<Step>,
    ctx: Vec<ContextItem>,
    queue: VecDeque<Event>,
    skeleton_buf: String,
    deconstructing: u32,

    tu_ids: IdGenerator,
    group_ids: IdGenerator,
    part_ids: IdGenerator,
    ref_ids: IdGenerator,

    started: bool,
    end_queued: bool,
    finished: bool,
    canceled: bool,
}

impl FilterEngine {
    /// Parse `input` and prepare a traversal with the rule-driven
    /// classifier from the configuration
    pub fn new(input: &str, name: &str, config: FilterConfig) -> Result<Self, FilterError> {
        config.validate_config()?;
        let doc = Document::parse(input)?;
        let classifier = Box::new(RuleClassifier::new(config.rules.clone()));
        Ok(Self::with_classifier(Rc::new(doc), name, config, classifier))
    }

    /// Prepare a traversal over an already-parsed document with a
    /// caller-supplied classifier
    pub fn with_classifier(
        doc: Rc<Document>,
        name: &str,
        config: FilterConfig,
        classifier: Box<dyn NodeClassifier>,
    ) -> Self {
        FilterEngine {
            doc,
            name: name.to_string(),
            config,
            classifier,
            walk: Vec::new(),
            ctx: Vec::new(),
            queue: VecDeque::new(),
            skeleton_buf: String::new(),
            deconstructing: 0,
            tu_ids: IdGenerator::new("tu"),
            group_ids: IdGenerator::new("g"),
            part_ids: IdGenerator::new("dp"),
            ref_ids: IdGenerator::new("ref"),
            started: false,
            end_queued: false,
            finished: false,
            canceled: false,
        }
    }

    /// The shared original document
    pub fn document(&self) -> &Rc<Document> {
        &self.doc
    }

    /// Whether another event will be produced
    pub fn has_next(&self) -> bool {
        !self.finished
    }

    /// Request cooperative cancellation: the next pull returns the
    /// terminal canceled event
    pub fn cancel(&mut self) {
        self.canceled = true;
    }

    /// Drop all pending work; `has_next` is false afterwards
    pub fn close(&mut self) {
        self.walk.clear();
        self.ctx.clear();
        self.queue.clear();
        self.skeleton_buf.clear();
        self.finished = true;
    }

    /// Produce the next event of the stream.
    ///
    /// Must not be called once `has_next` is false.
    pub fn next_event(&mut self) -> Result<Event, FilterError> {
        if self.finished {
            return Err(FilterError::Unknown(
                "next_event called on a finished filter".to_string(),
            ));
        }
        if self.canceled {
            self.close();
            debug!("Traversal canceled");
            return Ok(Event::Canceled);
        }
        if !self.started {
            self.open();
        }
        while self.queue.is_empty() && !self.walk.is_empty() {
            if let Some(step) = self.walk.pop() {
                if let Err(err) = self.process(step) {
                    self.close();
                    return Err(err.into());
                }
            }
        }
        if self.queue.is_empty() && !self.end_queued {
            self.finalize();
        }
        match self.queue.pop_front() {
            Some(event) => {
                if matches!(event, Event::EndDocument(_)) {
                    self.finished = true;
                }
                debug!("Event: {}", event.kind());
                Ok(event)
            }
            None => {
                self.finished = true;
                Err(FilterError::Unknown(
                    "Traversal produced no terminal event".to_string(),
                ))
            }
        }
    }

    fn open(&mut self) {
        self.started = true;
        let encoding = self.declared_encoding();
        self.queue.push_back(Event::StartDocument(StartDocument {
            id: "d1".to_string(),
            name: self.name.clone(),
            locale: self.config.source_locale.clone(),
            encoding,
            line_break: self.config.options.line_break.clone(),
            document: Rc::clone(&self.doc),
        }));
        self.ctx.push(ContextItem::new(self.doc.root(), true));
        for child in self.doc.children(self.doc.root()).iter().rev() {
            self.walk.push(Step::Enter(*child));
        }
    }

    /// Encoding label from the XML declaration, if the input carried one
    fn declared_encoding(&self) -> String {
        for child in self.doc.children(self.doc.root()) {
            if let NodeKind::Pi(data) = self.doc.kind(*child) {
                if data.starts_with("xml") {
                    if let Some(captures) = DECL_ENCODING_REGEX.captures(data) {
                        return captures[1].to_string();
                    }
                }
            }
        }
        "UTF-8".to_string()
    }

    fn process(&mut self, step: Step) -> Result<(), crate::errors::InputError> {
        match step {
            Step::Enter(node) => self.enter(node),
            Step::Leave(node, action) => self.leave(node, action),
        }
    }

    fn enter(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        match self.doc.kind(node) {
            NodeKind::Text(text) | NodeKind::CData(text) => {
                let in_content = self.in_translatable_scope();
                if in_content {
                    let text = text.clone();
                    if let Some(top) = self.ctx.last_mut() {
                        top.add_text(&text);
                    }
                } else {
                    let raw = self.doc.serialize_node(node);
                    self.skeleton_buf.push_str(&raw);
                }
                Ok(())
            }
            NodeKind::Comment(_) | NodeKind::Pi(_) | NodeKind::DocType(_) => {
                let code_type = match self.doc.kind(node) {
                    NodeKind::Comment(_) => "comment",
                    NodeKind::Pi(_) => "pi",
                    _ => "doctype",
                };
                let raw = self.doc.serialize_node(node);
                if self.in_scope() {
                    if let Some(top) = self.ctx.last_mut() {
                        top.add_code(TagType::Placeholder, code_type, &raw)?;
                    }
                } else {
                    self.skeleton_buf.push_str(&raw);
                }
                Ok(())
            }
            NodeKind::Element { .. } => self.enter_element(node),
            NodeKind::Root => Ok(()),
        }
    }

    fn enter_element(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        let mut verdict = self.classifier.classify(&self.doc, node)?;

        // Oversized blocks are left in place rather than extracted
        if verdict == NodeVerdict::Content
            && self.config.options.max_block_size > 0
            && self.doc.text_len(node) > self.config.options.max_block_size
        {
            warn!(
                "Block <{}> exceeds {} characters, leaving it unextracted",
                self.doc.name(node).unwrap_or("?"),
                self.config.options.max_block_size
            );
            verdict = NodeVerdict::Default;
        }
        if verdict == NodeVerdict::Break && !self.config.options.new_tu_on_break {
            verdict = NodeVerdict::Inline;
        }

        match verdict {
            NodeVerdict::Content => self.enter_content(node),
            NodeVerdict::Inline => self.enter_inline(node),
            NodeVerdict::Break => self.enter_break(node),
            NodeVerdict::Embedded => self.enter_embedded(node),
            NodeVerdict::Group => self.enter_group(node),
            NodeVerdict::Skip => self.enter_skip(node),
            NodeVerdict::Default => self.enter_default(node),
        }
    }

    fn enter_content(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        let translatable = self.is_translatable_here(node);
        if !translatable {
            return self.enter_default(node);
        }
        if self.in_scope() {
            // A scope inside a scope splits the running unit; its tags
            // travel as unpaired codes and rejoin at merge time
            if self.deconstructing == 0 {
                self.deconstructing = 1;
            }
            if let Some(top) = self.ctx.last_mut() {
                top.add_start_tag(&self.doc, node)?;
            }
            self.force_split();
            self.walk.push(Step::Leave(node, LeaveAction::CloseInline));
            self.push_children(node);
            return Ok(());
        }
        let meta = self.classifier.scope_meta(&self.doc, node);
        let unit_id = self.tu_ids.create_id();
        if let Some(top) = self.ctx.last_mut() {
            top.enter_scope(node, unit_id, meta);
        }
        self.walk.push(Step::Leave(node, LeaveAction::SealScope));
        self.push_children(node);
        Ok(())
    }

    fn enter_inline(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        if !self.in_translatable_scope() {
            return self.enter_default(node);
        }
        if self.doc.children(node).is_empty() {
            if let Some(top) = self.ctx.last_mut() {
                top.add_placeholder(&self.doc, node)?;
            }
            return Ok(());
        }
        if let Some(top) = self.ctx.last_mut() {
            top.add_start_tag(&self.doc, node)?;
        }
        self.walk.push(Step::Leave(node, LeaveAction::CloseInline));
        self.push_children(node);
        Ok(())
    }

    fn enter_break(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        if !self.in_scope() {
            self.skeleton_buf.push_str(&self.doc.serialize_node(node));
            return Ok(());
        }
        if self.deconstructing == 0 {
            self.deconstructing = 1;
        }
        if let Some(top) = self.ctx.last_mut() {
            top.add_placeholder(&self.doc, node)?;
        }
        self.force_split();
        Ok(())
    }

    fn enter_embedded(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        // Passed through verbatim; inside a scope a reference code
        // keeps the position and a snapshot keeps the content
        if self.in_scope() {
            let key = self.ref_ids.create_id();
            let snapshot = self.doc.clone_subtree(node);
            let name = self.doc.name(node).unwrap_or_default().to_string();
            if let Some(top) = self.ctx.last_mut() {
                top.add_code(TagType::Placeholder, &name, &ref_marker(&key))?;
                top.add_reference(key, snapshot);
            }
        } else {
            self.skeleton_buf.push_str(&self.doc.serialize_node(node));
        }
        Ok(())
    }

    fn enter_group(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        if self.in_scope() {
            return self.enter_default(node);
        }
        self.flush_skeleton();
        let translatable = self.is_translatable_here(node);
        let meta = self.classifier.scope_meta(&self.doc, node);
        let group_id = self.group_ids.create_id();
        self.queue.push_back(Event::StartGroup(StartGroup {
            id: group_id.clone(),
            name: meta.name,
            group_type: self.doc.name(node).map(str::to_string),
        }));
        self.skeleton_buf.push_str(&self.doc.start_tag(node));
        let mut item = ContextItem::new(node, translatable);
        item.set_label(&group_id);
        self.ctx.push(item);
        self.walk.push(Step::Leave(node, LeaveAction::CloseGroup));
        self.push_children(node);
        Ok(())
    }

    fn enter_skip(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        let raw = self.doc.serialize_node(node);
        if self.in_scope() {
            let name = self.doc.name(node).unwrap_or_default().to_string();
            if let Some(top) = self.ctx.last_mut() {
                top.add_code(TagType::Placeholder, &name, &raw)?;
            }
        } else {
            self.skeleton_buf.push_str(&raw);
        }
        Ok(())
    }

    fn enter_default(&mut self, node: NodeId) -> Result<(), crate::errors::InputError> {
        if self.in_scope() {
            if self.doc.children(node).is_empty() {
                if let Some(top) = self.ctx.last_mut() {
                    top.add_placeholder(&self.doc, node)?;
                }
                return Ok(());
            }
            if let Some(top) = self.ctx.last_mut() {
                top.add_start_tag(&self.doc, node)?;
            }
            self.walk.push(Step::Leave(node, LeaveAction::CloseInline));
            self.push_children(node);
            return Ok(());
        }
        self.skeleton_buf.push_str(&self.doc.start_tag(node));
        self.walk.push(Step::Leave(node, LeaveAction::CloseSkeleton));
        self.push_children(node);
        Ok(())
    }

    fn leave(&mut self, node: NodeId, action: LeaveAction) -> Result<(), crate::errors::InputError> {
        match action {
            LeaveAction::SealScope => {
                self.trigger_text_unit(false);
                self.deconstructing = 0;
            }
            LeaveAction::CloseInline => {
                if let Some(top) = self.ctx.last_mut() {
                    top.add_end_tag(&self.doc, node)?;
                }
            }
            LeaveAction::CloseGroup => {
                self.skeleton_buf.push_str(&self.doc.end_tag(node));
                self.flush_skeleton();
                let group_id = self
                    .ctx
                    .pop()
                    .map(|item| item.label().to_string())
                    .unwrap_or_default();
                self.queue
                    .push_back(Event::EndGroup(Ending { id: group_id }));
            }
            LeaveAction::CloseSkeleton => {
                self.skeleton_buf.push_str(&self.doc.end_tag(node));
            }
        }
        Ok(())
    }

    fn push_children(&mut self, node: NodeId) {
        for child in self.doc.children(node).iter().rev() {
            self.walk.push(Step::Enter(*child));
        }
    }

    fn in_scope(&self) -> bool {
        self.ctx.last().map(ContextItem::in_scope).unwrap_or(false)
    }

    fn in_translatable_scope(&self) -> bool {
        match self.ctx.last() {
            Some(top) => top.in_scope() && top.is_translatable(),
            None => false,
        }
    }

    fn is_translatable_here(&self, node: NodeId) -> bool {
        let level_ok = self
            .ctx
            .last()
            .map(ContextItem::is_translatable)
            .unwrap_or(true);
        level_ok && self.classifier.is_translatable(&self.doc, node)
    }

    /// Seal the current fragment into a forced unit and reopen the
    /// scope for the content that follows the split point
    fn force_split(&mut self) {
        let reopen = match self.ctx.last() {
            Some(top) if top.in_scope() => {
                Some((top.scope_node(), top.unit_meta().clone()))
            }
            _ => None,
        };
        self.trigger_text_unit(true);
        if let Some((Some(scope_node), meta)) = reopen {
            let unit_id = self.tu_ids.create_id();
            if let Some(top) = self.ctx.last_mut() {
                top.enter_scope(scope_node, unit_id, meta);
            }
        }
    }

    /// Seal the open scope of the top context into a text-unit event.
    /// Empty fragments are dropped unless a forced run is open, where
    /// every piece must appear to keep reassembly positions intact.
    fn trigger_text_unit(&mut self, forced: bool) {
        let depth = self.deconstructing;
        let extract_code_only = self.config.options.extract_code_only;
        let top = match self.ctx.last_mut() {
            Some(top) if top.in_scope() => top,
            _ => return,
        };
        let scope_node = match top.scope_node() {
            Some(node) => node,
            None => return,
        };
        let unit_id = top.unit_id().to_string();
        let (mut fragment, references, meta) = top.take_scope();

        let emptyish = |fragment: &crate::content::TextFragment| {
            !fragment.has_text(false) && !(extract_code_only && fragment.has_code())
        };
        if depth == 0 && emptyish(&fragment) {
            return;
        }
        let mut moved = None;
        if self.config.options.simplify_codes {
            if let Some((parts, rebuilt)) = simplify_edges(&fragment) {
                if depth == 0 && emptyish(&rebuilt) {
                    return;
                }
                fragment = rebuilt;
                moved = Some(parts);
            }
        }

        let mut unit = TextUnit::new(&unit_id);
        if let Some(name) = meta.name {
            unit.set_name(&name);
        }
        if let Some(note) = meta.note {
            unit.set_note(&note);
        }
        unit.set_preserve_whitespace(
            meta.preserve_whitespace
                .unwrap_or(self.config.options.preserve_whitespace),
        );
        for (key, value) in &meta.annotations {
            unit.set_property(key, value);
        }
        unit.set_source(fragment);

        let mut skeleton = Skeleton::new(Rc::clone(&self.doc), scope_node);
        for (key, snapshot) in references {
            skeleton.add_reference(&key, snapshot);
        }
        if let Some(parts) = moved {
            skeleton.set_moved_parts(parts);
        }
        skeleton.set_forced(forced);
        unit.set_skeleton(skeleton);

        self.flush_skeleton();
        self.queue.push_back(Event::TextUnit(unit));
    }

    fn flush_skeleton(&mut self) {
        if self.skeleton_buf.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.skeleton_buf);
        self.queue.push_back(Event::DocumentPart(DocumentPart {
            id: self.part_ids.create_id(),
            data,
        }));
    }

    /// The walk is exhausted: flush any truncated scope, the tail of
    /// the skeleton buffer, and queue the end-document event
    fn finalize(&mut self) {
        if self.in_scope() {
            warn!("Input ended inside an extraction scope, flushing a partial unit");
            self.trigger_text_unit(false);
            self.deconstructing = 0;
        }
        self.flush_skeleton();
        self.queue.push_back(Event::EndDocument(Ending {
            id: "d1".to_string(),
        }));
        self.end_queued = true;
    }
}

impl Iterator for FilterEngine {
    type Item = Result<Event, FilterError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        match self.next_event() {
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
