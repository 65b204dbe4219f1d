/*!
 * Inline-code edge simplification.
 *
 * Fragments often begin and end with markup that never needs
 * translation, e.g. a style range wrapping the whole paragraph. When
 * enabled, the runs of codes at the fragment edges are moved into the
 * skeleton as "moved parts" and the fragment is rebuilt around the
 * remaining content. Codes are never renumbered in place; the rebuilt
 * fragment re-appends the surviving codes with their original ids.
 */

use crate::content::code::{InlineCode, TagType};
use crate::content::fragment::{FragmentPart, TextFragment};
use crate::skeleton::MovedParts;

enum OwnedPart {
    Text(String),
    Code(InlineCode, TagType),
}

/// Move edge-only inline codes out of a fragment.
///
/// Returns the moved parts and the rebuilt middle fragment, or None
/// when there is nothing to move or when moving would split a code
/// pair between an edge and the middle.
pub fn simplify_edges(fragment: &TextFragment) -> Option<(MovedParts, TextFragment)> {
    let parts: Vec<OwnedPart> = fragment
        .parts()
        .map(|p| match p {
            FragmentPart::Text(t) => OwnedPart::Text(t.to_string()),
            FragmentPart::Code(c, kind) => OwnedPart::Code(c.clone(), kind),
        })
        .collect();

    let prefix = parts
        .iter()
        .take_while(|p| matches!(p, OwnedPart::Code(..)))
        .count();
    if prefix == parts.len() {
        // Code-only fragment; nothing sensible to keep
        return None;
    }
    let suffix = parts
        .iter()
        .rev()
        .take_while(|p| matches!(p, OwnedPart::Code(..)))
        .count();
    if prefix == 0 && suffix == 0 {
        return None;
    }

    let middle = &parts[prefix..parts.len() - suffix];

    // Moving must not split a code pair between an edge and the middle
    let edge_ids: Vec<i32> = parts[..prefix]
        .iter()
        .chain(parts[parts.len() - suffix..].iter())
        .filter_map(|p| match p {
            OwnedPart::Code(c, _) => Some(c.id()),
            _ => None,
        })
        .collect();
    let splits_pair = middle.iter().any(|p| match p {
        OwnedPart::Code(c, _) => edge_ids.contains(&c.id()),
        _ => false,
    });
    if splits_pair {
        return None;
    }

    // Rebuilding appends no more codes than the fragment already
    // held, so these appends cannot run out of marker indexes
    let mut moved = MovedParts::default();
    for part in &parts[..prefix] {
        if let OwnedPart::Code(c, _) = part {
            moved.before.append_code(c.clone()).ok()?;
        }
    }
    for part in &parts[parts.len() - suffix..] {
        if let OwnedPart::Code(c, _) = part {
            moved.after.append_code(c.clone()).ok()?;
        }
    }

    let mut rebuilt = TextFragment::new();
    for part in middle {
        match part {
            OwnedPart::Text(t) => rebuilt.append_text(t),
            OwnedPart::Code(c, _) => {
                rebuilt.append_code(c.clone()).ok()?;
            }
        }
    }
    Some((moved, rebuilt))
}
