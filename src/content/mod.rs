/*!
 * Inline-code-aware content model.
 *
 * This module holds the data types that carry extracted translatable
 * content through the pipeline:
 * - `code`: one inline markup unit (opening/closing/placeholder tag)
 * - `fragment`: plain text interleaved with markers referencing codes
 * - `unit`: the atomic extractable item with source and target content
 */

pub mod code;
pub mod fragment;
pub mod unit;

pub use code::{InlineCode, TagType};
pub use fragment::{FragmentPart, TextFragment};
pub use unit::TextUnit;
