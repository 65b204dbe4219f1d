/*!
 * Unit tests for configuration loading and validation
 */

use crate::common;
use docfilter::app_config::{FilterConfig, LogLevel};
use docfilter::encoders::QuotePolicy;

#[test]
fn test_newConfig_withDefaults_shouldValidate() {
    let config = FilterConfig::new("en", "fr");
    assert!(config.validate().is_ok());
    assert_eq!(config.content_type, "text/xml");
    assert_eq!(config.options.line_break, "\n");
    assert!(config.options.new_tu_on_break);
    assert_eq!(config.log_level, LogLevel::Info);
}

#[test]
fn test_validate_withBadLocaleTag_shouldFail() {
    let mut config = FilterConfig::new("en", "fr");
    config.target_locale = "french language".to_string();
    assert!(config.validate().is_err());

    config.target_locale = "pt-BR".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_withBadOptions_shouldFail() {
    let mut config = FilterConfig::new("en", "fr");
    config.options.line_break = String::new();
    assert!(config.validate().is_err());

    let mut config = FilterConfig::new("en", "fr");
    config.options.output_encoding = "no-such-charset".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_fromFile_withRoundTrip_shouldPreserveSettings() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let path = temp_dir.path().join("conf.json");

    let mut config = FilterConfig::new("en", "de");
    config.options.quote_policy = QuotePolicy::NumericSingleQuotes;
    config.options.simplify_codes = true;
    config.rules.content_elements.insert("caption".to_string());
    config.to_file(&path).expect("config save failed");

    let loaded = FilterConfig::from_file(&path).expect("config load failed");
    assert_eq!(loaded.target_locale, "de");
    assert_eq!(loaded.options.quote_policy, QuotePolicy::NumericSingleQuotes);
    assert!(loaded.options.simplify_codes);
    assert!(loaded.rules.content_elements.contains("caption"));
}

#[test]
fn test_fromFile_withPartialJson_shouldFillDefaults() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let path = common::create_test_file(
        &dir,
        "conf.json",
        r#"{"source_locale": "en", "target_locale": "ja"}"#,
    )
    .expect("test file creation failed");

    let loaded = FilterConfig::from_file(&path).expect("config load failed");
    assert_eq!(loaded.target_locale, "ja");
    assert_eq!(loaded.content_type, "text/xml");
    assert_eq!(loaded.options.quote_policy, QuotePolicy::default());
}
