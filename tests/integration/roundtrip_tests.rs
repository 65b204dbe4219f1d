/*!
 * Extract-then-merge identity tests: with no translation applied the
 * writer must reproduce the canonical form of the input
 */

use crate::common;
use docfilter::app_config::FilterConfig;
use docfilter::writer::write_events;

fn roundtrip(input: &str) -> String {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(input, &config);
    write_events(&config, &events).expect("merge failed")
}

#[test]
fn test_roundtrip_withSampleDocument_shouldBeIdentity() {
    let input = common::sample_document();
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_withNoTranslatableContent_shouldBeIdentity() {
    let input = "<doc><meta a=\"1\"/><!--note--><?pi data?></doc>";
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_withForcedSplits_shouldBeIdentity() {
    let input = "<doc><p>one<br/>two<br/>three</p></doc>";
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_withNestedGroups_shouldBeIdentity() {
    let input = "<doc><section><ul><li>a</li><li><b>b</b></li></ul></section></doc>";
    assert_eq!(roundtrip(input), input);
}

#[test]
fn test_roundtrip_withTargetEqualToSource_shouldBeIdentity() {
    let config = FilterConfig::new("en", "fr");
    let input = "<doc><p>Hello <b>world</b>!</p></doc>";
    let mut events = common::pull_events(input, &config);
    for event in &mut events {
        if let Some(unit) = event.as_text_unit_mut() {
            let source = unit.source().clone();
            unit.set_target("fr", source);
        }
    }
    let output = write_events(&config, &events).expect("merge failed");
    assert_eq!(output, input);
}

#[test]
fn test_roundtrip_withSimplifyCodes_shouldBeIdentity() {
    let mut config = FilterConfig::new("en", "fr");
    config.options.simplify_codes = true;
    let input = "<doc><p><b>all bold</b></p></doc>";
    let events = common::pull_events(input, &config);
    let output = write_events(&config, &events).expect("merge failed");
    assert_eq!(output, input);
}

#[test]
fn test_roundtrip_withWhitespaceOnlyBlocks_shouldBeIdentity() {
    let input = "<doc>\n  <p>  </p>\n  <p>x</p>\n</doc>";
    assert_eq!(roundtrip(input), input);
}
