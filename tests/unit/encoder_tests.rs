/*!
 * Unit tests for the output encoders and their manager
 */

use docfilter::encoders::{
    charset_for_label, Encoder, EncoderContext, EncoderManager, EncoderParams, QuotePolicy,
};
use docfilter::encoders::json::JsonEncoder;
use docfilter::encoders::plain::PlainEncoder;
use docfilter::encoders::xml::XmlEncoder;

fn xml_encoder(params: EncoderParams) -> XmlEncoder {
    let mut encoder = XmlEncoder::new();
    encoder
        .set_options(&params, "UTF-8", "\n")
        .expect("encoder options rejected");
    encoder
}

#[test]
fn test_encode_withQuotePolicyAll_shouldEscapeBothQuotes() {
    let mut encoder = xml_encoder(EncoderParams {
        quote_policy: QuotePolicy::All,
        ..EncoderParams::default()
    });
    assert_eq!(
        encoder.encode("it's \"ok\"", EncoderContext::Text),
        "it&apos;s &quot;ok&quot;"
    );
}

#[test]
fn test_encode_withQuotePolicyUnescaped_shouldKeepQuotes() {
    let mut encoder = xml_encoder(EncoderParams {
        quote_policy: QuotePolicy::Unescaped,
        ..EncoderParams::default()
    });
    assert_eq!(
        encoder.encode("it's \"ok\"", EncoderContext::Text),
        "it's \"ok\""
    );
}

#[test]
fn test_encode_withNumericSingleQuotes_shouldUseNumericEntity() {
    let mut encoder = xml_encoder(EncoderParams {
        quote_policy: QuotePolicy::NumericSingleQuotes,
        ..EncoderParams::default()
    });
    assert_eq!(
        encoder.encode("it's \"ok\"", EncoderContext::Text),
        "it&#39;s &quot;ok&quot;"
    );
}

#[test]
fn test_encode_withDoubleQuotesOnly_shouldKeepSingleQuote() {
    let mut encoder = xml_encoder(EncoderParams {
        quote_policy: QuotePolicy::DoubleQuotesOnly,
        ..EncoderParams::default()
    });
    assert_eq!(
        encoder.encode("it's \"ok\"", EncoderContext::Text),
        "it's &quot;ok&quot;"
    );
}

#[test]
fn test_encode_withSkeletonContext_shouldAlwaysEscapeQuotes() {
    let mut encoder = xml_encoder(EncoderParams {
        quote_policy: QuotePolicy::Unescaped,
        ..EncoderParams::default()
    });
    assert_eq!(
        encoder.encode("'\"", EncoderContext::Skeleton),
        "&apos;&quot;"
    );
}

#[test]
fn test_encode_withMarkupCharacters_shouldEscapeReserved() {
    let mut encoder = xml_encoder(EncoderParams::default());
    assert_eq!(
        encoder.encode("a < b & c > d", EncoderContext::Text),
        "a &lt; b &amp; c > d"
    );
    let mut gt = xml_encoder(EncoderParams {
        escape_gt: true,
        ..EncoderParams::default()
    });
    assert_eq!(gt.encode(">", EncoderContext::Text), "&gt;");
}

#[test]
fn test_encodeCodeUnit_withSurrogatePair_shouldEmitOneReference() {
    let mut encoder = XmlEncoder::new();
    encoder
        .set_options(&EncoderParams::default(), "us-ascii", "\n")
        .expect("encoder options rejected");
    let mut out = String::new();
    out.push_str(&encoder.encode_code_unit(0xD840, EncoderContext::Text));
    out.push_str(&encoder.encode_code_unit(0xDC00, EncoderContext::Text));
    assert_eq!(out, "&#x20000;");
}

#[test]
fn test_encode_withAsciiTarget_shouldUseNumericReferences() {
    let mut encoder = XmlEncoder::new();
    encoder
        .set_options(&EncoderParams::default(), "us-ascii", "\n")
        .expect("encoder options rejected");
    assert_eq!(encoder.encode("caf\u{E9}", EncoderContext::Text), "caf&#x00E9;");
    let mut utf8 = xml_encoder(EncoderParams::default());
    assert_eq!(utf8.encode("caf\u{E9}", EncoderContext::Text), "caf\u{E9}");
}

#[test]
fn test_toNative_withApprovedProperty_shouldMapStates() {
    let encoder = XmlEncoder::new();
    assert_eq!(encoder.to_native("approved", "yes"), "final");
    assert_eq!(encoder.to_native("approved", "no"), "needs-review-translation");
    assert_eq!(encoder.to_native("other", "value"), "value");
}

#[test]
fn test_encode_withJsonEncoder_shouldUseBackslashEscapes() {
    let mut encoder = JsonEncoder::new();
    encoder
        .set_options(&EncoderParams::default(), "UTF-8", "\n")
        .expect("encoder options rejected");
    assert_eq!(
        encoder.encode("say \"hi\"\n\tdone\\", EncoderContext::Text),
        "say \\\"hi\\\"\\n\\tdone\\\\"
    );
}

#[test]
fn test_charsetForLabel_withKnownLabels_shouldResolve() {
    assert!(charset_for_label("UTF-8").is_some());
    assert!(charset_for_label("utf-16").is_some());
    assert!(charset_for_label("us-ascii").is_some());
    assert!(charset_for_label("windows-1252").is_some());
    assert!(charset_for_label("no-such-charset").is_none());
}

#[test]
fn test_manager_withUnknownContentType_shouldPassThrough() {
    let mut manager = EncoderManager::new();
    manager
        .set_options(EncoderParams::default(), "UTF-8", "\n")
        .expect("manager options rejected");
    manager
        .update_encoder("application/x-unknown")
        .expect("selection failed");
    assert_eq!(manager.encode("a < b", EncoderContext::Text), "a < b");
}

#[test]
fn test_manager_withXmlContentType_shouldEscape() {
    let mut manager = EncoderManager::new();
    manager
        .set_options(EncoderParams::default(), "UTF-8", "\n")
        .expect("manager options rejected");
    manager.update_encoder("text/xml").expect("selection failed");
    assert_eq!(manager.encode("a < b", EncoderContext::Text), "a &lt; b");
    assert_eq!(manager.content_type(), Some("text/xml"));
}

#[test]
fn test_manager_setOptions_withBadEncoding_shouldFail() {
    let mut manager = EncoderManager::new();
    assert!(manager
        .set_options(EncoderParams::default(), "no-such-charset", "\n")
        .is_err());
    assert!(manager
        .set_options(EncoderParams::default(), "UTF-8", "")
        .is_err());
}

#[test]
fn test_encodeChar_shouldMatchCodepointEscaping() {
    let mut encoder = xml_encoder(EncoderParams::default());
    assert_eq!(encoder.encode_char('&', EncoderContext::Text), "&amp;");
    assert_eq!(encoder.encode_char('x', EncoderContext::Text), "x");
}

#[test]
fn test_manager_setMapping_shouldRouteNewContentType() {
    let mut manager = EncoderManager::new();
    manager.set_mapping("text/x-notes", || Box::new(PlainEncoder::new()));
    manager
        .set_options(EncoderParams::default(), "UTF-8", "\n")
        .expect("manager options rejected");
    manager.update_encoder("text/x-notes").expect("selection failed");
    assert_eq!(manager.encode("a < b", EncoderContext::Text), "a < b");
    assert_eq!(manager.content_type(), Some("text/x-notes"));
}

#[test]
fn test_manager_mergeMappings_shouldAddMissingAndKeepConflicting() {
    let mut base = EncoderManager::new();
    base.remove_mapping("text/plain");
    let mut extra = EncoderManager::new();
    extra.set_mapping("text/x-notes", || Box::new(PlainEncoder::new()));
    extra.set_mapping("text/xml", || Box::new(PlainEncoder::new()));
    base.merge_mappings(&extra);
    base.set_options(EncoderParams::default(), "UTF-8", "\n")
        .expect("manager options rejected");
    base.update_encoder("text/x-notes")
        .expect("merged mapping missing");
    base.update_encoder("text/plain")
        .expect("mapping dropped before the merge was not restored");
    // the conflicting text/xml mapping keeps the escaping encoder
    base.update_encoder("text/xml").expect("selection failed");
    assert_eq!(base.encode("a < b", EncoderContext::Text), "a &lt; b");
}
