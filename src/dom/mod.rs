/*!
 * Arena document tree.
 *
 * The engine navigates, clones and re-serializes markup through this
 * tree; it never defines grammar knowledge of its own. Nodes live in a
 * flat arena addressed by [`NodeId`]. Removal only unlinks a node from
 * its parent and leaves the arena entry in place, so node ids handed
 * out earlier (for example the scope ids stored in skeletons) stay
 * valid across writer-side mutations.
 *
 * Serialization is canonical: attributes are written in source order as
 * `name="value"`, text escapes the markup-reserved characters, and
 * nothing else is reformatted. Parse followed by serialize is a fixed
 * point on canonical input, which is what the round-trip guarantees of
 * the engine are stated against.
 */

use quick_xml::Reader;
use quick_xml::events::Event as XmlEvent;

use crate::errors::InputError;

/// Handle to one node in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// What a node is
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The synthetic document node at the arena root
    Root,
    /// An element with its name and ordered attributes
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// A text node (stored unescaped)
    Text(String),
    /// A CDATA section (stored raw)
    CData(String),
    /// A comment
    Comment(String),
    /// A processing instruction, including the XML declaration
    Pi(String),
    /// A document type declaration
    DocType(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed document held in a flat arena
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Create an empty document holding only the root node
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// The synthetic root node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The first element child of the root, if any
    pub fn root_element(&self) -> Option<NodeId> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|id| matches!(self.nodes[id.0].kind, NodeKind::Element { .. }))
    }

    /// Parse a document from a string
    pub fn parse(input: &str) -> Result<Document, InputError> {
        let mut doc = Document::new();
        let mut reader = Reader::from_str(input);
        let mut stack: Vec<NodeId> = vec![doc.root()];

        loop {
            let event = reader
                .read_event()
                .map_err(|e| InputError::Malformed(format!("{e}")))?;
            let parent = *stack.last().expect("parse stack is never empty");
            match event {
                XmlEvent::Start(e) => {
                    let id = doc.append_element_from(&e, parent)?;
                    stack.push(id);
                }
                XmlEvent::Empty(e) => {
                    doc.append_element_from(&e, parent)?;
                }
                XmlEvent::End(_) => {
                    if stack.len() <= 1 {
                        return Err(InputError::Malformed(
                            "Unbalanced end tag".to_string(),
                        ));
                    }
                    stack.pop();
                }
                XmlEvent::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| InputError::Malformed(format!("{err}")))?
                        .into_owned();
                    doc.push_node(NodeKind::Text(text), parent);
                }
                XmlEvent::CData(e) => {
                    let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    doc.push_node(NodeKind::CData(raw), parent);
                }
                XmlEvent::Comment(e) => {
                    let bytes: &[u8] = &e;
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    doc.push_node(NodeKind::Comment(text), parent);
                }
                XmlEvent::PI(e) => {
                    let bytes: &[u8] = &e;
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    doc.push_node(NodeKind::Pi(text), parent);
                }
                XmlEvent::Decl(e) => {
                    let mut data = String::from("xml");
                    if let Ok(version) = e.version() {
                        data.push_str(&format!(
                            " version=\"{}\"",
                            String::from_utf8_lossy(&version)
                        ));
                    }
                    if let Some(Ok(encoding)) = e.encoding() {
                        data.push_str(&format!(
                            " encoding=\"{}\"",
                            String::from_utf8_lossy(&encoding)
                        ));
                    }
                    if let Some(Ok(standalone)) = e.standalone() {
                        data.push_str(&format!(
                            " standalone=\"{}\"",
                            String::from_utf8_lossy(&standalone)
                        ));
                    }
                    doc.push_node(NodeKind::Pi(data), parent);
                }
                XmlEvent::DocType(e) => {
                    let bytes: &[u8] = &e;
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    doc.push_node(NodeKind::DocType(text), parent);
                }
                XmlEvent::Eof => break,
            }
        }
        if stack.len() != 1 {
            return Err(InputError::Malformed(
                "Document ended with unclosed elements".to_string(),
            ));
        }
        Ok(doc)
    }

    fn append_element_from(
        &mut self,
        start: &quick_xml::events::BytesStart<'_>,
        parent: NodeId,
    ) -> Result<NodeId, InputError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| InputError::Malformed(format!("{e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| InputError::Malformed(format!("{e}")))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(self.push_node(NodeKind::Element { name, attrs }, parent))
    }

    /// Append a new node under a parent and return its id
    pub fn push_node(&mut self, kind: NodeKind, parent: NodeId) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// The kind of a node
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Element name, if the node is an element
    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Attribute value, if the node is an element carrying it
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Children of a node, in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Next sibling of a node, if any
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let position = siblings.iter().position(|s| *s == id)?;
        siblings.get(position + 1).copied()
    }

    /// Whether a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element { .. })
    }

    /// Text content of a text or CDATA node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Text(t) | NodeKind::CData(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// Total plain-text length in a subtree. Used for the oversized
    /// block threshold.
    pub fn text_len(&self, id: NodeId) -> usize {
        let mut total = match &self.nodes[id.0].kind {
            NodeKind::Text(t) | NodeKind::CData(t) => t.chars().count(),
            _ => 0,
        };
        for child in self.nodes[id.0].children.clone() {
            total += self.text_len(child);
        }
        total
    }

    /// Unlink a node from its parent. The arena entry stays, so other
    /// node ids are unaffected.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        self.nodes[id.0].parent = None;
    }

    /// Deep-clone a subtree into a new standalone document
    pub fn clone_subtree(&self, id: NodeId) -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        doc.import_subtree(root, self, id);
        doc
    }

    /// Deep-copy a node (and its subtree) from another document under
    /// the given parent; returns the id of the imported copy
    pub fn import_subtree(&mut self, parent: NodeId, other: &Document, other_id: NodeId) -> NodeId {
        let id = self.push_node(other.nodes[other_id.0].kind.clone(), parent);
        for child in other.children(other_id) {
            self.import_subtree(id, other, *child);
        }
        id
    }

    /// Deep-copy all children of a node from another document under the
    /// given parent
    pub fn import_children(&mut self, parent: NodeId, other: &Document, other_parent: NodeId) {
        for child in other.children(other_parent).to_vec() {
            self.import_subtree(parent, other, child);
        }
    }

    /// Replace all children of `scope` with copies of the children of
    /// `other_parent` in another document
    pub fn replace_children(&mut self, scope: NodeId, other: &Document, other_parent: NodeId) {
        for child in self.nodes[scope.0].children.clone() {
            self.nodes[child.0].parent = None;
        }
        self.nodes[scope.0].children.clear();
        self.import_children(scope, other, other_parent);
    }

    /// Replace one node with a copy of a node from another document,
    /// keeping its position among its siblings
    pub fn replace_node(&mut self, target: NodeId, other: &Document, other_id: NodeId) -> Option<NodeId> {
        let parent = self.nodes[target.0].parent?;
        let position = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == target)?;
        let id = self.import_subtree(parent, other, other_id);
        // import_subtree appended the copy; move it into place
        self.nodes[parent.0].children.pop();
        self.nodes[parent.0].children[position] = id;
        self.nodes[target.0].parent = None;
        Some(id)
    }

    /// Replace one node with copies of all children of a node from
    /// another document, keeping their position among the siblings.
    /// With no children the target is simply removed. Returns the
    /// number of nodes spliced in.
    pub fn replace_with_children(
        &mut self,
        target: NodeId,
        other: &Document,
        other_parent: NodeId,
    ) -> usize {
        let Some(parent) = self.nodes[target.0].parent else {
            return 0;
        };
        let Some(position) = self.nodes[parent.0].children.iter().position(|c| *c == target)
        else {
            return 0;
        };
        let mut imported = Vec::new();
        for child in other.children(other_parent).to_vec() {
            imported.push(self.import_subtree(parent, other, child));
        }
        let count = imported.len();
        // import_subtree appended the copies; move them into place
        let children = &mut self.nodes[parent.0].children;
        children.truncate(children.len() - count);
        children.splice(position..=position, imported);
        self.nodes[target.0].parent = None;
        count
    }

    /// All elements with the given name in a subtree, in document order
    pub fn find_elements(&self, within: NodeId, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_elements(within, name, &mut found);
        found
    }

    fn collect_elements(&self, id: NodeId, name: &str, found: &mut Vec<NodeId>) {
        if self.name(id) == Some(name) {
            found.push(id);
        }
        for child in self.children(id).to_vec() {
            self.collect_elements(child, name, found);
        }
    }

    /// Serialize the whole document
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root()) {
            self.write_node(*child, &mut out);
        }
        out
    }

    /// Serialize one node and its subtree
    pub fn serialize_node(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// The serialized start tag of an element: `<name a="v">` or
    /// `<name a="v"/>` when the element has no children
    pub fn start_tag(&self, id: NodeId) -> String {
        let NodeKind::Element { name, attrs } = &self.nodes[id.0].kind else {
            return String::new();
        };
        let mut out = String::from("<");
        out.push_str(name);
        for (key, value) in attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }
        if self.nodes[id.0].children.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
        }
        out
    }

    /// The serialized end tag of an element, empty when the start tag
    /// was already self-closed
    pub fn end_tag(&self, id: NodeId) -> String {
        let NodeKind::Element { name, .. } = &self.nodes[id.0].kind else {
            return String::new();
        };
        if self.nodes[id.0].children.is_empty() {
            String::new()
        } else {
            format!("</{name}>")
        }
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match &self.nodes[id.0].kind {
            NodeKind::Root => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Element { .. } => {
                out.push_str(&self.start_tag(id));
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str(&self.end_tag(id));
            }
            NodeKind::Text(t) => out.push_str(&escape_text(t)),
            NodeKind::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(t);
                out.push_str("]]>");
            }
            NodeKind::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            }
            NodeKind::Pi(t) => {
                out.push_str("<?");
                out.push_str(t);
                out.push_str("?>");
            }
            NodeKind::DocType(t) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(t);
                out.push('>');
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

/// Minimal escaping for text nodes
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Minimal escaping for attribute values
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
