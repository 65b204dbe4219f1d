/*!
 * End-to-end workflow tests: extract to a manifest file, translate the
 * manifest, merge it back into the document
 */

use crate::common;
use docfilter::app_config::FilterConfig;
use docfilter::app_controller::{Controller, Manifest, ManifestUnit};
use docfilter::file_utils::FileManager;

#[test]
fn test_workflow_withTranslatedManifest_shouldProduceMergedDocument() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let input_path = common::create_test_file(
        &dir,
        "page.xml",
        "<doc><p>Hello <b>world</b>!</p></doc>",
    )
    .expect("test file creation failed");
    let manifest_path = dir.join("page.units.json");
    let output_path = dir.join("page.fr.xml");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    let count = controller
        .extract(&input_path, &manifest_path)
        .expect("extraction failed");
    assert_eq!(count, 1);

    let json = FileManager::read_to_string(&manifest_path).expect("manifest read failed");
    let mut manifest: Manifest = serde_json::from_str(&json).expect("manifest parse failed");
    assert_eq!(manifest.units[0].text, "Hello <code1>world</code1>!");
    manifest.units[0].text = "Bonjour <code1>monde</code1> !".to_string();
    let json = serde_json::to_string_pretty(&manifest).expect("manifest serialize failed");
    FileManager::write_string(&manifest_path, &json).expect("manifest write failed");

    let stats = controller
        .merge(&input_path, &manifest_path, &output_path)
        .expect("merge failed");
    assert_eq!(stats.merged_units, 1);

    let output = FileManager::read_to_string(&output_path).expect("output read failed");
    assert_eq!(output, "<doc><p>Bonjour <b>monde</b> !</p></doc>");
}

#[test]
fn test_merge_withStaleManifestEntry_shouldFail() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let input_path = common::create_test_file(&dir, "page.xml", "<doc><p>only</p></doc>")
        .expect("test file creation failed");
    let manifest_path = dir.join("page.units.json");
    let output_path = dir.join("page.fr.xml");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    controller
        .extract(&input_path, &manifest_path)
        .expect("extraction failed");

    let json = FileManager::read_to_string(&manifest_path).expect("manifest read failed");
    let mut manifest: Manifest = serde_json::from_str(&json).expect("manifest parse failed");
    manifest.units.push(ManifestUnit {
        id: "tu99".to_string(),
        text: "orphan".to_string(),
        name: None,
        note: None,
    });
    let json = serde_json::to_string_pretty(&manifest).expect("manifest serialize failed");
    FileManager::write_string(&manifest_path, &json).expect("manifest write failed");

    let err = controller
        .merge(&input_path, &manifest_path, &output_path)
        .expect_err("merge accepted an entry for a unit the document does not have");
    assert!(err.to_string().contains("tu99"));
    assert!(!output_path.exists());
}

#[test]
fn test_workflow_withMissingTranslation_shouldKeepSource() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let input_path = common::create_test_file(
        &dir,
        "page.xml",
        "<doc><p>first</p><p>second</p></doc>",
    )
    .expect("test file creation failed");
    let manifest_path = dir.join("page.units.json");
    let output_path = dir.join("page.fr.xml");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    controller
        .extract(&input_path, &manifest_path)
        .expect("extraction failed");

    let json = FileManager::read_to_string(&manifest_path).expect("manifest read failed");
    let mut manifest: Manifest = serde_json::from_str(&json).expect("manifest parse failed");
    manifest.units[0].text = "premier".to_string();
    manifest.units.remove(1);
    let json = serde_json::to_string_pretty(&manifest).expect("manifest serialize failed");
    FileManager::write_string(&manifest_path, &json).expect("manifest write failed");

    controller
        .merge(&input_path, &manifest_path, &output_path)
        .expect("merge failed");
    let output = FileManager::read_to_string(&output_path).expect("output read failed");
    assert_eq!(output, "<doc><p>premier</p><p>second</p></doc>");
}

#[test]
fn test_workflow_withInventedMarkup_shouldRejectMerge() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let input_path = common::create_test_file(&dir, "page.xml", "<doc><p>plain</p></doc>")
        .expect("test file creation failed");
    let manifest_path = dir.join("page.units.json");
    let output_path = dir.join("page.fr.xml");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    controller
        .extract(&input_path, &manifest_path)
        .expect("extraction failed");

    let json = FileManager::read_to_string(&manifest_path).expect("manifest read failed");
    let mut manifest: Manifest = serde_json::from_str(&json).expect("manifest parse failed");
    // a translation must not invent inline codes
    manifest.units[0].text = "plat <code7>nope</code7>".to_string();
    let json = serde_json::to_string_pretty(&manifest).expect("manifest serialize failed");
    FileManager::write_string(&manifest_path, &json).expect("manifest write failed");

    assert!(controller
        .merge(&input_path, &manifest_path, &output_path)
        .is_err());
}

#[test]
fn test_workflow_withRoundtripCommand_shouldWriteCanonicalDocument() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    let input = common::sample_document();
    let input_path =
        common::create_test_file(&dir, "page.xml", input).expect("test file creation failed");
    let output_path = dir.join("page.roundtrip.xml");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    controller
        .roundtrip(&input_path, &output_path)
        .expect("roundtrip failed");
    let output = FileManager::read_to_string(&output_path).expect("output read failed");
    assert_eq!(output, input);
}

#[test]
fn test_workflow_withExtractFolder_shouldProcessEveryDocument() {
    let temp_dir = common::create_temp_dir().expect("temp dir creation failed");
    let dir = temp_dir.path().to_path_buf();
    common::create_test_file(&dir, "a.xml", "<doc><p>one</p></doc>")
        .expect("test file creation failed");
    common::create_test_file(&dir, "b.xml", "<doc><p>two</p><p>three</p></doc>")
        .expect("test file creation failed");

    let controller = Controller::with_config(FilterConfig::new("en", "fr"))
        .expect("controller creation failed");
    let total = controller
        .extract_folder(&dir, &dir, "xml")
        .expect("folder extraction failed");
    assert_eq!(total, 3);
    assert!(FileManager::file_exists(dir.join("a.units.json")));
    assert!(FileManager::file_exists(dir.join("b.units.json")));
}
