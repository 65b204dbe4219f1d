/*!
 * Unit tests for the arena document tree
 */

use docfilter::dom::{Document, NodeKind};

#[test]
fn test_parse_withNestedMarkup_shouldBuildTree() {
    let doc = Document::parse("<doc><p id=\"a\">Hello <b>world</b></p></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    assert_eq!(doc.name(root_element), Some("doc"));
    let p = doc.children(root_element)[0];
    assert_eq!(doc.name(p), Some("p"));
    assert_eq!(doc.attr(p, "id"), Some("a"));
    assert_eq!(doc.children(p).len(), 2);
}

#[test]
fn test_parse_withUnbalancedMarkup_shouldFail() {
    assert!(Document::parse("<doc><p>text</doc>").is_err());
    assert!(Document::parse("<doc><p>text</p>").is_err());
}

#[test]
fn test_serialize_withCanonicalInput_shouldBeFixedPoint() {
    let input = "<doc><p a=\"1\">x &amp; y</p><e/><!--c--></doc>";
    let doc = Document::parse(input).unwrap();
    let once = doc.serialize();
    let twice = Document::parse(&once).unwrap().serialize();
    assert_eq!(once, twice);
    assert_eq!(once, input);
}

#[test]
fn test_detach_shouldKeepNodeIdsStable() {
    let mut doc = Document::parse("<doc><a/><b/><c/></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let b = doc.children(root_element)[1];
    let c = doc.children(root_element)[2];
    doc.detach(b);
    assert_eq!(doc.children(root_element).len(), 2);
    // ids taken before the detach still point at the same nodes
    assert_eq!(doc.name(c), Some("c"));
    assert_eq!(doc.serialize(), "<doc><a/><c/></doc>");
}

#[test]
fn test_nextSibling_shouldWalkForwardAndStopAtEnd() {
    let doc = Document::parse("<doc><a/><b/><c/></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let a = doc.children(root_element)[0];
    let b = doc.next_sibling(a).unwrap();
    assert_eq!(doc.name(b), Some("b"));
    let c = doc.next_sibling(b).unwrap();
    assert_eq!(doc.name(c), Some("c"));
    assert_eq!(doc.next_sibling(c), None);
    assert_eq!(doc.next_sibling(root_element), None);
}

#[test]
fn test_cloneSubtree_shouldBeIndependentOfSource() {
    let mut doc = Document::parse("<doc><p>keep <b>this</b></p></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let p = doc.children(root_element)[0];
    let snapshot = doc.clone_subtree(p);
    doc.detach(p);
    let snapshot_p = snapshot.children(snapshot.root())[0];
    assert_eq!(snapshot.name(snapshot_p), Some("p"));
    assert_eq!(snapshot.serialize(), "<p>keep <b>this</b></p>");
}

#[test]
fn test_replaceChildren_shouldSpliceParsedContent() {
    let mut doc = Document::parse("<doc><p>old</p></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let p = doc.children(root_element)[0];
    let replacement = Document::parse("<r>new <b>text</b></r>").unwrap();
    let r = replacement.children(replacement.root())[0];
    doc.replace_children(p, &replacement, r);
    assert_eq!(doc.serialize(), "<doc><p>new <b>text</b></p></doc>");
}

#[test]
fn test_replaceNode_shouldPreservePosition() {
    let mut doc = Document::parse("<doc><a/><mark/><c/></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let mark = doc.children(root_element)[1];
    let other = Document::parse("<img src=\"x.png\"/>").unwrap();
    let img = other.children(other.root())[0];
    doc.replace_node(mark, &other, img);
    assert_eq!(doc.serialize(), "<doc><a/><img src=\"x.png\"/><c/></doc>");
}

#[test]
fn test_replaceWithChildren_shouldSpliceAllInPosition() {
    let mut doc = Document::parse("<doc><p>a<m/>b</p></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let p = doc.children(root_element)[0];
    let m = doc.children(p)[1];
    let donor = Document::parse("<r><i>x</i> and <b>y</b></r>").unwrap();
    let wrapper = donor.children(donor.root())[0];
    let count = doc.replace_with_children(m, &donor, wrapper);
    assert_eq!(count, 3);
    assert_eq!(doc.serialize(), "<doc><p>a<i>x</i> and <b>y</b>b</p></doc>");
}

#[test]
fn test_replaceWithChildren_withEmptyDonor_shouldRemoveTarget() {
    let mut doc = Document::parse("<doc><p>a<m/>b</p></doc>").unwrap();
    let root_element = doc.children(doc.root())[0];
    let p = doc.children(root_element)[0];
    let m = doc.children(p)[1];
    let donor = Document::parse("<r></r>").unwrap();
    let wrapper = donor.children(donor.root())[0];
    assert_eq!(doc.replace_with_children(m, &donor, wrapper), 0);
    assert_eq!(doc.serialize(), "<doc><p>ab</p></doc>");
}

#[test]
fn test_findElements_shouldScopeToSubtree() {
    let doc =
        Document::parse("<doc><p><m id=\"1\"/><b><m id=\"2\"/></b></p><m id=\"3\"/></doc>")
            .unwrap();
    let root_element = doc.children(doc.root())[0];
    let p = doc.children(root_element)[0];
    let found = doc.find_elements(p, "m");
    assert_eq!(found.len(), 2);
    assert_eq!(doc.attr(found[0], "id"), Some("1"));
    assert_eq!(doc.attr(found[1], "id"), Some("2"));
}

#[test]
fn test_parse_withMixedNodeKinds_shouldKeepThemAll() {
    let input = "<doc><?target data?><!--note--><![CDATA[<raw>]]></doc>";
    let doc = Document::parse(input).unwrap();
    let root_element = doc.children(doc.root())[0];
    let kinds: Vec<bool> = doc
        .children(root_element)
        .iter()
        .map(|id| matches!(doc.kind(*id), NodeKind::Pi(_) | NodeKind::Comment(_) | NodeKind::CData(_)))
        .collect();
    assert_eq!(kinds, vec![true, true, true]);
    assert_eq!(doc.serialize(), input);
}
