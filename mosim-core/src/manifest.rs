//! Experiment manifest deserialization.
//!
//! A sweep is described declaratively in an `experiment.toml` file: the
//! models to simulate, candidate values per parameter, command options and
//! the script/working directory layout. The manifest is the CLI's input
//! format; library users can also construct [`Factors`] directly.

use std::path::{Path, PathBuf};

use linked_hash_map::LinkedHashMap;

use crate::error::{Error, Result};
use crate::exps::{gen_experiments, Experiments, Factors};
use crate::param::ParamValue;
use crate::script::ScriptSettings;
use crate::util;
use crate::{DEFAULT_COMMAND, DEFAULT_SCRIPT_FILE, EXPERIMENT_MANIFEST_FILE};

/// Experiment manifest, usually `experiment.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentManifest {
    pub experiment: ExperimentInfo,
    /// Candidate values per parameter name; an array is a list of
    /// candidates, a scalar is a single candidate.
    #[serde(default)]
    pub params: LinkedHashMap<String, toml::Value>,
    /// Candidate values per command option, expanded like `params`.
    #[serde(default)]
    pub options: LinkedHashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentInfo {
    pub name: String,
    /// Models to simulate, full Modelica dot notation.
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default = "default_command")]
    pub command: String,
    /// Script file to generate, relative to the manifest.
    #[serde(default = "default_script")]
    pub script: String,
    /// Working directory for the engine, relative to the manifest.
    /// Defaults to the manifest directory.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Packages to preload or scripts to run before the experiments.
    #[serde(default)]
    pub packages: Vec<String>,
    /// Override of the per-run result file list.
    #[serde(default)]
    pub results: Option<Vec<String>>,
}

fn default_command() -> String {
    DEFAULT_COMMAND.to_string()
}

fn default_script() -> String {
    DEFAULT_SCRIPT_FILE.to_string()
}

impl ExperimentManifest {
    /// Reads a manifest from the given path. A directory path is resolved
    /// to the `experiment.toml` inside it.
    pub fn from_path(path: &Path) -> Result<ExperimentManifest> {
        let manifest_path = if path.is_dir() {
            path.join(EXPERIMENT_MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        debug!("reading experiment manifest: {:?}", manifest_path);
        util::deser_struct_from_path(manifest_path)
    }

    /// Expands the manifest into its full-factorial experiment sequence.
    pub fn experiments(&self) -> Result<Experiments> {
        gen_experiments(
            self.experiment.models.clone(),
            table_to_factors(&self.params)?,
            table_to_factors(&self.options)?,
        )
    }

    /// Builds the script writer settings, resolving relative paths against
    /// the given base directory (normally the manifest's directory).
    pub fn settings(&self, base_dir: &Path) -> ScriptSettings {
        let mut settings = ScriptSettings::new(base_dir.join(&self.experiment.script))
            .command(self.experiment.command.clone())
            .packages(
                self.experiment
                    .packages
                    .iter()
                    .map(|p| resolve(base_dir, p))
                    .collect(),
            );
        settings.working_dir = self
            .experiment
            .working_dir
            .as_ref()
            .map(|dir| resolve(base_dir, dir));
        if let Some(results) = &self.experiment.results {
            settings.results = results.clone();
        }
        settings
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

// A top-level array is a candidate list; anything else is one candidate.
// Arrays nested inside a candidate list turn into Modelica array values.
fn table_to_factors(table: &LinkedHashMap<String, toml::Value>) -> Result<Factors> {
    let mut factors = Factors::new();
    for (name, value) in table.iter() {
        let candidates = match value {
            toml::Value::Array(values) => values
                .iter()
                .map(|v| value_to_param(name, v))
                .collect::<Result<Vec<ParamValue>>>()?,
            other => vec![value_to_param(name, other)?],
        };
        factors.push((name.clone(), candidates));
    }
    Ok(factors)
}

fn value_to_param(name: &str, value: &toml::Value) -> Result<ParamValue> {
    let param = match value {
        toml::Value::Integer(v) => ParamValue::Integer(*v),
        toml::Value::Float(v) => ParamValue::Real(*v),
        toml::Value::Boolean(v) => ParamValue::Bool(*v),
        // strings pass through verbatim; Modelica strings carry their own
        // quotes in the manifest
        toml::Value::String(v) => ParamValue::Raw(v.clone()),
        toml::Value::Array(values) => ParamValue::Array(
            values
                .iter()
                .map(|v| value_to_param(name, v))
                .collect::<Result<Vec<ParamValue>>>()?,
        ),
        _ => return Err(Error::UnsupportedParamValue(name.to_string())),
    };
    Ok(param)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[experiment]
name = "chua_sweep"
models = ["Modelica.Electrical.Analog.Examples.ChuaCircuit"]

[params]
"L.L" = [15, 21]
"C1.C" = 8

[options]
stopTime = 2500
"#;

    #[test]
    fn manifest_expands_to_experiments() {
        let manifest: ExperimentManifest = toml::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.experiment.command, "simulateModel");
        assert_eq!(manifest.experiment.script, "run_sims.mos");

        let experiments: Vec<_> = manifest.experiments().unwrap().collect();
        assert_eq!(experiments.len(), 2);
        assert_eq!(experiments[0].params.to_string(), "(L(L=15), C1(C=8))");
        assert_eq!(experiments[1].params.to_string(), "(L(L=21), C1(C=8))");
        assert_eq!(experiments[0].options.to_string(), "(stopTime=2500)");
    }

    #[test]
    fn settings_resolve_against_the_base_dir() {
        let manifest: ExperimentManifest = toml::from_str(MANIFEST).unwrap();
        let settings = manifest.settings(Path::new("/sweeps/chua"));
        assert_eq!(settings.fname, Path::new("/sweeps/chua/run_sims.mos"));
        assert_eq!(settings.command, "simulateModel");
        assert!(settings.working_dir.is_none());
        assert_eq!(settings.results.len(), 5);
    }

    #[test]
    fn string_values_pass_through_verbatim() {
        let manifest: ExperimentManifest = toml::from_str(
            r#"
[experiment]
name = "m"
models = ["M"]

[options]
method = '"Dassl"'
"#,
        )
        .unwrap();
        let experiments: Vec<_> = manifest.experiments().unwrap().collect();
        assert_eq!(experiments[0].options.to_string(), "(method=\"Dassl\")");
    }
}
