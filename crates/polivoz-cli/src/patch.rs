//! TOML patch file format.
//!
//! A patch is a named bag of `parameter = value` pairs applied through the
//! engine's string dispatch. Unknown parameter names are tolerated by the
//! engine, so patches written for a newer build load cleanly on an older
//! one.

use anyhow::Context;
use polivoz_synth::SynthEngine;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Patch file format.
#[derive(Debug, Deserialize)]
pub struct Patch {
    /// Name of the patch
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Parameter values, applied in name order
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
}

impl Patch {
    /// Load a patch from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading patch file {}", path.display()))?;
        let patch: Patch = toml::from_str(&content)
            .with_context(|| format!("parsing patch file {}", path.display()))?;
        Ok(patch)
    }

    /// Apply every parameter in the patch to an engine.
    pub fn apply<const N: usize>(&self, engine: &SynthEngine<N>) {
        for (name, &value) in &self.parameters {
            engine.set_parameter(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_patch() {
        let toml_str = r#"
            name = "Warm Lead"
            description = "Detuned saw with ladder filter"

            [parameters]
            cutoff = 0.6
            resonance = 0.4
            filtertype = 5.0
            detune = 12.0
            unison = 4.0
            attack = 0.02
        "#;

        let patch: Patch = toml::from_str(toml_str).unwrap();
        assert_eq!(patch.name, "Warm Lead");
        assert_eq!(
            patch.description.as_deref(),
            Some("Detuned saw with ladder filter")
        );
        assert_eq!(patch.parameters.len(), 6);
        assert_eq!(patch.parameters["cutoff"], 0.6);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let patch: Patch = toml::from_str("name = \"Init\"").unwrap();
        assert_eq!(patch.name, "Init");
        assert!(patch.description.is_none());
        assert!(patch.parameters.is_empty());
    }

    #[test]
    fn test_missing_name_is_an_error() {
        let result = toml::from_str::<Patch>("[parameters]\ncutoff = 0.5");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_reports_path_on_missing_file() {
        let err = Patch::load(Path::new("/nonexistent/lead.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("lead.toml"));
    }

    #[test]
    fn test_load_reports_path_on_bad_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name = ").unwrap();

        let err = Patch::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing patch file"));
    }

    #[test]
    fn test_apply_sets_engine_parameters() {
        let patch: Patch = toml::from_str(
            r#"
            name = "Quiet"
            [parameters]
            volume = 0.25
            unison = 3.0
            unknownparam = 1.0
        "#,
        )
        .unwrap();

        let engine: SynthEngine<4> = SynthEngine::new(48000.0);
        // Unknown names must be ignored without failing the whole patch
        patch.apply(&engine);
    }
}
