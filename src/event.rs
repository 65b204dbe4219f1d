/*!
 * The linear structural event stream.
 *
 * The traversal produces events lazily; pipeline stages may transform
 * text-unit events in flight; the writer replays the stream to
 * re-serialize the document. Events form a strictly nested sequence:
 * exactly one start-document first and one end-document last (unless
 * canceled), with balanced group boundaries in between.
 */

use std::rc::Rc;

use crate::content::unit::TextUnit;
use crate::dom::Document;

/// Resource of the start-document event
#[derive(Debug, Clone)]
pub struct StartDocument {
    /// Generated document id
    pub id: String,
    /// Display name (usually the input path)
    pub name: String,
    /// Source locale tag
    pub locale: String,
    /// Declared input encoding label
    pub encoding: String,
    /// Line-break string of the source
    pub line_break: String,
    /// The parsed original document, shared read-only
    pub document: Rc<Document>,
}

/// Resource of the start-group event
#[derive(Debug, Clone)]
pub struct StartGroup {
    /// Generated group id
    pub id: String,
    /// Resource name carried over from the source
    pub name: Option<String>,
    /// Semantic group type label
    pub group_type: Option<String>,
}

/// Resource of the end-group and end-document events
#[derive(Debug, Clone)]
pub struct Ending {
    /// Id of the resource being ended
    pub id: String,
}

/// Resource of the document-part event: raw skeleton-only content with
/// no extractable text
#[derive(Debug, Clone)]
pub struct DocumentPart {
    /// Generated part id
    pub id: String,
    /// Serialized verbatim content
    pub data: String,
}

/// One item of the linear structural stream
#[derive(Debug, Clone)]
pub enum Event {
    StartDocument(StartDocument),
    StartGroup(StartGroup),
    EndGroup(Ending),
    TextUnit(TextUnit),
    DocumentPart(DocumentPart),
    EndDocument(Ending),
    /// Terminal event after cooperative cancellation; not an error
    Canceled,
}

impl Event {
    /// Short name of the event kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::StartDocument(_) => "START_DOCUMENT",
            Event::StartGroup(_) => "START_GROUP",
            Event::EndGroup(_) => "END_GROUP",
            Event::TextUnit(_) => "TEXT_UNIT",
            Event::DocumentPart(_) => "DOCUMENT_PART",
            Event::EndDocument(_) => "END_DOCUMENT",
            Event::Canceled => "CANCELED",
        }
    }

    /// The text unit, if this is a text-unit event
    pub fn as_text_unit(&self) -> Option<&TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    /// Mutable access to the text unit, if this is a text-unit event
    pub fn as_text_unit_mut(&mut self) -> Option<&mut TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }

    /// Consume the event into its text unit, if it is one
    pub fn into_text_unit(self) -> Option<TextUnit> {
        match self {
            Event::TextUnit(tu) => Some(tu),
            _ => None,
        }
    }
}
