//! Initialize experiment directories based on templates.

#![allow(unused_imports)]

pub mod experiment;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Error, Result};

// Initiate new experiment structure template based on input args
pub fn init_at_path(path_str: &str, name: Option<&str>, template_str: &str) -> Result<()> {
    println!(
        "Initiating new experiment at: {path} (template: {template}) ",
        path = path_str,
        template = template_str
    );

    // default the experiment name to the directory name
    let path = Path::new(path_str);
    let name = match name {
        Some(n) => n.to_string(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                Error::msg(format!("can't derive an experiment name from: {}", path_str))
            })?,
    };

    // test if directory doesn't already exist at path
    if path.exists() {
        return Err(Error::msg(format!(
            "Can't initialize experiment, directory already exists ({}). Try another path.",
            path_str
        )));
    }

    // get the template files
    let template_files = match experiment::collect_template_files(&name, template_str) {
        Some(tf) => tf,
        None => {
            return Err(Error::msg(format!(
                "Failed getting experiment template files for template \"{}\"",
                template_str
            )))
        }
    };

    // create the new directory for the experiment
    fs::create_dir_all(path_str)?;

    // create the template files
    create_template_files(path_str, template_files)?;

    Ok(())
}

// Create actual files from the template file content
fn create_template_files(path_str: &str, files: HashMap<String, String>) -> Result<()> {
    for (name, content) in files {
        let file_full_path = Path::new(path_str).join(name);
        if let Some(parent) = file_full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_full_path, content)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosim::ExperimentManifest;

    #[test]
    fn scaffolded_manifest_is_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my_sweep");
        init_at_path(path.to_str().unwrap(), None, "commented").unwrap();

        let manifest = ExperimentManifest::from_path(&path).unwrap();
        assert_eq!(manifest.experiment.name, "my_sweep");
        // the template carries one model and at least one run
        let experiments: Vec<_> = manifest.experiments().unwrap().collect();
        assert!(!experiments.is_empty());
    }

    #[test]
    fn scaffolded_manifest_is_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep");
        init_at_path(path.to_str().unwrap(), Some("named_sweep"), "commented").unwrap();

        let text = fs::read_to_string(path.join("experiment.toml")).unwrap();
        let value: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(
            value["experiment"]["name"].as_str(),
            Some("named_sweep")
        );
        assert!(value["params"].as_table().is_some());
        assert!(value["options"].as_table().is_some());
    }

    #[test]
    fn existing_directory_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        assert!(init_at_path(dir.path().to_str().unwrap(), None, "commented").is_err());
    }

    #[test]
    fn unknown_template_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep");
        assert!(init_at_path(path.to_str().unwrap(), None, "elaborate").is_err());
    }
}
