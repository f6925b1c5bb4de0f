//! Reading and writing Dymola-formatted initialization files.
//!
//! These files (`dsin.txt`, `dsfinal.txt`) store one parameter per
//! annotated line. Three line shapes occur: the full 1-or-2-line parameter
//! specification with type, value, bounds and category columns, and the
//! shorter experiment/tuning/output parameter forms with a bare number
//! before the `# name` comment. Values are matched in place; nothing else
//! in the file is touched.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::param::{ParamDict, ParamValue};
use crate::util;

const UNSIGNED: &str = r"\d+";
const INTEGER: &str = r"[+-]?\d+";
const FLOAT: &str = r"[+-]?\d+(?:\.\d+)?(?:[Ee][+-]?\d+)?";

// Patterns for a parameter specification, one capture group around the
// value. Tried in order until one matches.
fn read_patterns(name: &str) -> Vec<String> {
    let name = regex::escape(name);
    vec![
        format!(
            r"(?m)^\s*{i}\s+({f})\s+{f}\s+{f}\s+{u}\s+{u}\s*#\s*{name}\s*$",
            i = INTEGER,
            f = FLOAT,
            u = UNSIGNED,
            name = name
        ),
        format!(r"(?m)^\s*({i})\s*#\s*{name}\s", i = INTEGER, name = name),
        format!(r"(?m)^\s*({f})\s*#\s*{name}\s", f = FLOAT, name = name),
    ]
}

// Same patterns with groups around everything before and after the value.
fn write_patterns(name: &str) -> Vec<String> {
    let name = regex::escape(name);
    vec![
        format!(
            r"(?m)(^\s*{i}\s+){f}(\s+{f}\s+{f}\s+{u}\s+{u}\s*#\s*{name}\s*$)",
            i = INTEGER,
            f = FLOAT,
            u = UNSIGNED,
            name = name
        ),
        format!(r"(?m)(^\s*){i}(\s*#\s*{name}\s)", i = INTEGER, name = name),
        format!(r"(?m)(^\s*){f}(\s*#\s*{name}\s)", f = FLOAT, name = name),
    ]
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::ParsingError(e.to_string()))
}

fn read_param_from(text: &str, name: &str, fname: &str) -> Result<f64> {
    for pattern in read_patterns(name) {
        let re = compile(&pattern)?;
        if let Some(caps) = re.captures(text) {
            return Ok(caps[1].parse::<f64>()?);
        }
    }
    Err(Error::ParamNotInFile(name.to_string(), fname.to_string()))
}

/// Reads a single parameter value from a Dymola-formatted initialization
/// or final values file.
///
/// The name has to carry the full model path in Modelica dot notation,
/// including any array indices (1-based).
pub fn read_param(name: &str, path: &Path) -> Result<f64> {
    let text = util::read_text_file(path)?;
    read_param_from(&text, name, &path.to_string_lossy())
}

/// Reads several parameter values at once, in the given order.
pub fn read_params(names: &[&str], path: &Path) -> Result<Vec<f64>> {
    let text = util::read_text_file(path)?;
    let fname = path.to_string_lossy();
    names
        .iter()
        .map(|name| read_param_from(&text, name, &fname))
        .collect()
}

/// Writes parameter values into a Dymola-formatted initialization file,
/// substituting each value in place.
///
/// Booleans map to 1/0. Strings and arrays are not representable in the
/// initialization file and are rejected; split arrays into indexed scalar
/// entries instead. Null entries are skipped. Fails if a named parameter
/// is missing from the file.
pub fn write_params(params: &ParamDict, path: &Path) -> Result<()> {
    let mut text = util::read_text_file(path)?;
    let fname = path.to_string_lossy().to_string();

    for (name, value) in params.iter() {
        let value = match value {
            Some(v) => v,
            None => continue,
        };
        let rendered = match value {
            ParamValue::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            ParamValue::Integer(i) => i.to_string(),
            ParamValue::Real(r) => r.to_string(),
            _ => return Err(Error::UnsupportedParamValue(name.clone())),
        };

        let mut substituted = false;
        for pattern in write_patterns(name) {
            let re = compile(&pattern)?;
            if re.is_match(&text) {
                text = re
                    .replace(&text, |caps: &regex::Captures| {
                        format!("{}{}{}", &caps[1], rendered, &caps[2])
                    })
                    .into_owned();
                substituted = true;
                break;
            }
        }
        if !substituted {
            return Err(Error::ParamNotInFile(name.clone(), fname.clone()));
        }
    }

    fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DSIN: &str = "\
#1
char Aclass(3,24)
Adymosim
1.4
Modelica experiment file

double experiment(7,1)
       0                   # StartTime
  2500                     # StopTime    Time at which integration stops
  0.5                      # Ti
  0.1                      # Td

double initialValue(2,6)
  -1      0.5      0       0                  6  256   # damper.d
  -1      21       0       0                  1  280   # L.L
";

    fn fixture() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DSIN.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_experiment_parameters() {
        let file = fixture();
        let values = read_params(&["Ti", "Td", "StopTime"], file.path()).unwrap();
        assert_eq!(values, vec![0.5, 0.1, 2500.0]);
    }

    #[test]
    fn reads_full_parameter_specifications() {
        let file = fixture();
        assert_eq!(read_param("damper.d", file.path()).unwrap(), 0.5);
        assert_eq!(read_param("L.L", file.path()).unwrap(), 21.0);
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let file = fixture();
        assert!(matches!(
            read_param("does.not.exist", file.path()),
            Err(Error::ParamNotInFile(_, _))
        ));
    }

    #[test]
    fn writes_values_in_place() {
        let file = fixture();
        let mut params = ParamDict::new();
        params.set("Ti", 5).unwrap();
        params.set("damper.d", 0.7).unwrap();
        params.set("L.L", true).unwrap();
        write_params(&params, file.path()).unwrap();

        assert_eq!(read_param("Ti", file.path()).unwrap(), 5.0);
        assert_eq!(read_param("damper.d", file.path()).unwrap(), 0.7);
        assert_eq!(read_param("L.L", file.path()).unwrap(), 1.0);
        // untouched neighbors survive
        assert_eq!(read_param("Td", file.path()).unwrap(), 0.1);
    }

    #[test]
    fn strings_are_rejected() {
        let file = fixture();
        let mut params = ParamDict::new();
        params.set("Ti", "\"hello\"").unwrap();
        assert!(matches!(
            write_params(&params, file.path()),
            Err(Error::UnsupportedParamValue(_))
        ));
    }
}
