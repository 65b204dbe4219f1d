/*!
 * Common test utilities for the docfilter test suite
 */

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use tempfile::TempDir;

use docfilter::app_config::FilterConfig;
use docfilter::engine::FilterEngine;
use docfilter::event::Event;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// A small document exercising content, inline, break, group and
/// embedded elements at once
pub fn sample_document() -> &'static str {
    "<doc><h1>Title</h1>\
     <ul><li>First <b>item</b></li><li>Second item</li></ul>\
     <p>Before<br/>after <img src=\"pic.png\"/> end</p>\
     <pre>verbatim</pre></doc>"
}

/// Pulls the complete event stream for an input
pub fn pull_events(input: &str, config: &FilterConfig) -> Vec<Event> {
    let engine = FilterEngine::new(input, "test.xml", config.clone())
        .expect("engine creation failed");
    engine
        .map(|event| event.expect("traversal failed"))
        .collect()
}
