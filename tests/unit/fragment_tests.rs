/*!
 * Unit tests for coded-text fragments and inline codes
 */

use docfilter::content::fragment::{MARKER_CLOSING, MARKER_ISOLATED, MARKER_OPENING};
use docfilter::content::{TagType, TextFragment};
use docfilter::encoders::xml::XmlEncoder;
use docfilter::encoders::{Encoder, EncoderContext, EncoderParams};

fn markup_fragment() -> TextFragment {
    let mut fragment = TextFragment::new();
    fragment.append_text("Hello ");
    fragment.append_tag(TagType::Opening, "b", "<b>").unwrap();
    fragment.append_text("world");
    fragment.append_tag(TagType::Closing, "b", "</b>").unwrap();
    fragment.append_text("!");
    fragment
}

#[test]
fn test_appendTag_withPair_shouldReuseOpeningId() {
    let fragment = markup_fragment();
    assert_eq!(fragment.codes().len(), 2);
    assert_eq!(fragment.codes()[0].id(), fragment.codes()[1].id());
}

#[test]
fn test_codedText_withCodes_shouldUseTwoCharMarkers() {
    let fragment = markup_fragment();
    let coded = fragment.coded_text();
    let opening = coded.chars().position(|c| c == MARKER_OPENING);
    let closing = coded.chars().position(|c| c == MARKER_CLOSING);
    assert!(opening.is_some());
    assert!(closing.is_some());
    assert!(opening < closing);
    // a marker is always followed by its index character
    assert_eq!(coded.chars().filter(|c| *c == MARKER_OPENING).count(), 1);
}

#[test]
fn test_setCodedText_withDanglingMarker_shouldRejectAndKeepOld() {
    let mut fragment = markup_fragment();
    let before = fragment.coded_text().to_string();
    let mut bad = before.clone();
    bad.push(MARKER_ISOLATED);
    assert!(fragment.set_coded_text(bad).is_err());
    assert_eq!(fragment.coded_text(), before);
}

#[test]
fn test_toGeneric_withPairAndPlaceholder_shouldNumberCodes() {
    let mut fragment = markup_fragment();
    fragment.append_tag(TagType::Placeholder, "br", "<br/>").unwrap();
    assert_eq!(fragment.to_generic(), "Hello <code1>world</code1>!<code2/>");
}

#[test]
fn test_fromGeneric_withReorderedCodes_shouldRebuildFromBase() {
    let base = markup_fragment();
    let rebuilt = TextFragment::from_generic("<code1>Monde</code1> bonjour !", &base)
        .expect("generic parse failed");
    assert_eq!(rebuilt.to_text(), "<b>Monde</b> bonjour !");
    assert_eq!(rebuilt.codes().len(), 2);
}

#[test]
fn test_fromGeneric_withUnknownCodeId_shouldFail() {
    let base = markup_fragment();
    assert!(TextFragment::from_generic("x <code9>y</code9>", &base).is_err());
}

#[test]
fn test_unmatchedOpeningIds_withSplitPair_shouldReportOpening() {
    let mut fragment = TextFragment::new();
    fragment.append_text("one");
    fragment.append_tag(TagType::Opening, "i", "<i>").unwrap();
    fragment.append_text("two");
    assert_eq!(fragment.unmatched_opening_ids().len(), 1);
    assert!(fragment.validate_markers().is_ok());
}

#[test]
fn test_hasText_withWhitespaceOnly_shouldDependOnFlag() {
    let fragment = TextFragment::from_text("  \t ");
    assert!(fragment.has_text(true));
    assert!(!fragment.has_text(false));
}

#[test]
fn test_toEscaped_shouldEncodeTextButNotCodeData() {
    let mut fragment = TextFragment::new();
    fragment.append_text("a & b ");
    fragment.append_tag(TagType::Opening, "b", "<b>").unwrap();
    fragment.append_text("c < d");
    fragment.append_tag(TagType::Closing, "b", "</b>").unwrap();
    let mut encoder = XmlEncoder::new();
    encoder
        .set_options(&EncoderParams::default(), "UTF-8", "\n")
        .expect("encoder options rejected");
    assert_eq!(
        fragment.to_escaped(&mut encoder, EncoderContext::Text),
        "a &amp; b <b>c &lt; d</b>"
    );
}
