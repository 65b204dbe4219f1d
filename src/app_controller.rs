use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::app_config::FilterConfig;
use crate::content::TextFragment;
use crate::engine::FilterEngine;
use crate::errors::{FilterError, InputError};
use crate::event::Event;
use crate::file_utils::FileManager;
use crate::writer::{FilterWriter, WriterStats};

// @module: Application controller for document filtering

/// Extraction manifest written next to the source document: the
/// translatable units with display-form text, ready for translation
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub source_locale: String,
    pub target_locale: String,
    pub units: Vec<ManifestUnit>,
}

/// One extracted unit in display form
#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestUnit {
    pub id: String,
    /// Unit text with numbered pseudo-tags standing in for inline codes
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Main application controller for extract and merge runs
pub struct Controller {
    // @field: App configuration
    config: FilterConfig,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Check if the controller is properly initialized with configuration
    pub fn is_initialized(&self) -> bool {
        !self.config.source_locale.is_empty() && !self.config.target_locale.is_empty()
    }

    /// Extract translatable units from a document into a manifest file
    pub fn extract<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input_path: P1,
        manifest_path: P2,
    ) -> Result<usize> {
        let input_path = input_path.as_ref();
        let content = FileManager::read_to_string(input_path)?;
        let config = self.config_for(&content);
        let name = input_path.display().to_string();

        let engine = FilterEngine::new(&content, &name, config)?;
        let mut units = Vec::new();
        for event in engine {
            let event = event.context("Extraction failed")?;
            if let Some(unit) = event.as_text_unit() {
                units.push(ManifestUnit {
                    id: unit.id().to_string(),
                    text: unit.source().to_generic(),
                    name: unit.name().map(str::to_string),
                    note: unit.note().map(str::to_string),
                });
            }
        }
        info!("Extracted {} unit(s) from {}", units.len(), name);

        let manifest = Manifest {
            source_locale: self.config.source_locale.clone(),
            target_locale: self.config.target_locale.clone(),
            units,
        };
        let json = serde_json::to_string_pretty(&manifest)
            .context("Failed to serialize the manifest")?;
        FileManager::write_string(&manifest_path, &json)?;
        Ok(manifest.units.len())
    }

    /// Merge a translated manifest back into a document
    pub fn merge<P1: AsRef<Path>, P2: AsRef<Path>, P3: AsRef<Path>>(
        &self,
        input_path: P1,
        manifest_path: P2,
        output_path: P3,
    ) -> Result<WriterStats> {
        let input_path = input_path.as_ref();
        let content = FileManager::read_to_string(input_path)?;
        let manifest_json = FileManager::read_to_string(manifest_path.as_ref())?;
        let manifest: Manifest = serde_json::from_str(&manifest_json)
            .context("Failed to parse the manifest")?;
        let config = self.config_for(&content);
        let name = input_path.display().to_string();
        let target_locale = config.target_locale.clone();

        let engine = FilterEngine::new(&content, &name, config.clone())?;
        let mut writer = FilterWriter::new(&config)?;
        let mut used = vec![false; manifest.units.len()];
        for event in engine {
            let mut event = event.context("Extraction failed during merge")?;
            if let Some(unit) = event.as_text_unit_mut() {
                match manifest.units.iter().position(|entry| entry.id == unit.id()) {
                    Some(position) => {
                        used[position] = true;
                        let entry = &manifest.units[position];
                        let target = TextFragment::from_generic(&entry.text, unit.source())
                            .with_context(|| {
                                format!("Bad inline markup in translation of unit {}", unit.id())
                            })?;
                        unit.set_target(&target_locale, target);
                    }
                    None => warn!("No translation for unit {}, keeping the source", unit.id()),
                }
            }
            writer.handle_event(&event);
        }
        // A manifest entry that matched no unit names content the
        // document does not have
        if let Some((stale, _)) = manifest.units.iter().zip(&used).find(|(_, used)| !**used) {
            let err = InputError::BadReferenceTarget {
                item_id: name.clone(),
                target: stale.id.clone(),
            };
            return Err(FilterError::from(err).into());
        }
        let output = writer
            .output()
            .map_err(|err| anyhow!("Merge failed: {err}"))?;
        FileManager::write_string(output_path, &output)?;
        let stats = writer.stats();
        info!(
            "Merged {} unit(s), skipped {}, {} missing reference(s)",
            stats.merged_units, stats.skipped_units, stats.missing_references
        );
        Ok(stats)
    }

    /// Extract and immediately merge without translation, writing the
    /// canonical form of the document
    pub fn roundtrip<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input_path: P1,
        output_path: P2,
    ) -> Result<WriterStats> {
        let input_path = input_path.as_ref();
        let content = FileManager::read_to_string(input_path)?;
        let config = self.config_for(&content);
        let name = input_path.display().to_string();

        let engine = FilterEngine::new(&content, &name, config.clone())?;
        let mut writer = FilterWriter::new(&config)?;
        for event in engine {
            let event: Event = event.context("Extraction failed during roundtrip")?;
            writer.handle_event(&event);
        }
        let output = writer
            .output()
            .map_err(|err| anyhow!("Roundtrip failed: {err}"))?;
        FileManager::write_string(output_path, &output)?;
        Ok(writer.stats())
    }

    /// Extract every matching document under a directory
    pub fn extract_folder<P1: AsRef<Path>, P2: AsRef<Path>>(
        &self,
        input_dir: P1,
        output_dir: P2,
        extension: &str,
    ) -> Result<usize> {
        let files = FileManager::find_files_with_extension(&input_dir, extension);
        if files.is_empty() {
            warn!("No .{extension} files under {}", input_dir.as_ref().display());
            return Ok(0);
        }
        let mut total = 0;
        for file in files {
            let manifest_path =
                FileManager::generate_output_path(&file, &output_dir, "units", "json");
            total += self.extract(&file, &manifest_path)?;
        }
        Ok(total)
    }

    /// Clone the configuration with the line break the input actually
    /// uses
    fn config_for(&self, content: &str) -> FilterConfig {
        let mut config = self.config.clone();
        config.options.line_break = FileManager::detect_line_break(content).to_string();
        config
    }
}
