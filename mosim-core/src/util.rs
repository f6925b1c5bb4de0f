//! Contains a collection of useful utility functions.

#![allow(unused)]

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// Reads a file at the given path to a String.
pub fn read_text_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut s = String::new();
    file.read_to_string(&mut s)?;
    Ok(s)
}

/// Create a static deser object from given path using serde.
pub fn deser_struct_from_path<T>(file_path: PathBuf) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let bytes = std::fs::read(&file_path)?;
    let d: T = toml::from_slice(&bytes)?;
    Ok(d)
}

/// Makes the given path absolute against the current working directory,
/// without requiring it to exist.
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_relative() {
        env::current_dir()?.join(path)
    } else {
        path.to_path_buf()
    };
    Ok(dunce::simplified(&absolute).to_path_buf())
}

/// Renders a path with forward slashes, the form Modelica tooling accepts
/// on every platform.
pub fn posix_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
