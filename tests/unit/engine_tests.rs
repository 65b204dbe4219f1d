/*!
 * Unit tests for the traversal engine over the public API
 */

use crate::common;
use docfilter::app_config::FilterConfig;
use docfilter::content::TextUnit;
use docfilter::engine::FilterEngine;
use docfilter::event::Event;

fn units_of(events: &[Event]) -> Vec<&TextUnit> {
    events.iter().filter_map(Event::as_text_unit).collect()
}

#[test]
fn test_pull_withSampleDocument_shouldExtractExpectedUnits() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(common::sample_document(), &config);
    let units = units_of(&events);

    let texts: Vec<String> = units.iter().map(|u| u.source().to_generic()).collect();
    assert_eq!(
        texts,
        vec![
            "Title",
            "First <code1>item</code1>",
            "Second item",
            "Before<code1/>",
            "after <code1/> end",
        ]
    );
}

#[test]
fn test_pull_withSampleDocument_shouldKeepStreamNested() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(common::sample_document(), &config);

    assert_eq!(events.first().map(Event::kind), Some("START_DOCUMENT"));
    assert_eq!(events.last().map(Event::kind), Some("END_DOCUMENT"));
    let mut depth = 0i32;
    for event in &events {
        match event {
            Event::StartGroup(_) => depth += 1,
            Event::EndGroup(_) => {
                depth -= 1;
                assert!(depth >= 0);
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn test_pull_withGroup_shouldPairStartAndEndIds() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(
        "<doc><ul><li>a</li></ul><table><td>b</td></table></doc>",
        &config,
    );
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for event in &events {
        match event {
            Event::StartGroup(group) => starts.push(group.id.clone()),
            Event::EndGroup(ending) => ends.push(ending.id.clone()),
            _ => {}
        }
    }
    assert_eq!(starts, vec!["g1", "g2"]);
    assert_eq!(ends, vec!["g1", "g2"]);
}

#[test]
fn test_pull_withSkipElement_shouldCarryItVerbatim() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(
        "<doc><script>if (a &lt; b) go();</script><p>text</p></doc>",
        &config,
    );
    let parts: String = events
        .iter()
        .filter_map(|event| match event {
            Event::DocumentPart(part) => Some(part.data.clone()),
            _ => None,
        })
        .collect();
    assert!(parts.contains("<script>"));
    assert_eq!(units_of(&events).len(), 1);
}

#[test]
fn test_pull_withUntranslatableElement_shouldNotExtract() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events("<doc><pre>fixed  spacing</pre><p>ok</p></doc>", &config);
    let units = units_of(&events);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source().to_text(), "ok");
}

#[test]
fn test_pull_withMissingRequiredAttribute_shouldSurfaceError() {
    let engine = FilterEngine::new(
        "<doc><p>see <img/></p></doc>",
        "test.xml",
        FilterConfig::new("en", "fr"),
    )
    .expect("engine creation failed");
    let result: Result<Vec<Event>, _> = engine.collect();
    assert!(result.is_err());
}

#[test]
fn test_pull_withScopeMetadata_shouldCarryNameAndNote() {
    let config = FilterConfig::new("en", "fr");
    let events = common::pull_events(
        "<doc><p id=\"intro\" locNote=\"keep short\">text</p></doc>",
        &config,
    );
    let units = units_of(&events);
    assert_eq!(units[0].name(), Some("intro"));
    assert_eq!(units[0].note(), Some("keep short"));
}

#[test]
fn test_pull_withSimplifyCodes_shouldMoveEdgeCodesToSkeleton() {
    let mut config = FilterConfig::new("en", "fr");
    config.options.simplify_codes = true;
    let events = common::pull_events("<doc><p><b>all bold</b></p></doc>", &config);
    let units = units_of(&events);
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].source().to_generic(), "all bold");
    let skeleton = units[0].skeleton().expect("skeleton missing");
    let moved = skeleton.moved_parts().expect("moved parts missing");
    assert!(moved.before.has_code());
    assert!(moved.after.has_code());
}

#[test]
fn test_pull_withXmlSpacePreserve_shouldSetWhitespaceFlag() {
    let mut config = FilterConfig::new("en", "fr");
    config.options.preserve_whitespace = false;
    let events = common::pull_events(
        "<doc><p xml:space=\"preserve\">  keep  </p><p>trim</p></doc>",
        &config,
    );
    let units = units_of(&events);
    assert!(units[0].preserve_whitespace());
    assert!(!units[1].preserve_whitespace());
}
