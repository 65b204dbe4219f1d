/*!
 * # docfilter - format-preserving document filter for translation
 *
 * A Rust library for extracting translatable text from structured
 * documents and merging translations back without disturbing the
 * surrounding markup.
 *
 * ## Features
 *
 * - Pull-based extraction of flat, translator-friendly text units
 * - Inline markup carried as paired codes inside unit text
 * - Skeleton records that merge translations back into the original
 *   structure, including forced splits and verbatim embedded content
 * - Per-format output encoders with configurable escaping policies
 * - Rule-driven element classification, no hardwired grammar
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management and classification rules
 * - `dom`: Arena-based document tree with stable node ids
 * - `content`: Text fragments, inline codes and text units
 * - `event`: The linear structural event stream
 * - `engine`: The pull-based traversal producing events
 * - `skeleton`: Non-extracted context carried by each unit
 * - `simplify`: Edge-code simplification of extracted fragments
 * - `encoders`: Output escaping per content type
 * - `writer`: The merge stage re-serializing the document
 * - `subfilter`: Nested extraction of embedded foreign content
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod content;
pub mod dom;
pub mod encoders;
pub mod engine;
pub mod errors;
pub mod event;
pub mod file_utils;
pub mod simplify;
pub mod skeleton;
pub mod subfilter;
pub mod writer;

// Re-export main types for easier usage
pub use app_config::{FilterConfig, FilterOptions, RuleSet};
pub use content::{InlineCode, TagType, TextFragment, TextUnit};
pub use engine::FilterEngine;
pub use errors::FilterError;
pub use event::Event;
pub use writer::FilterWriter;
