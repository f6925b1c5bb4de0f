//! Parameter values and insertion-ordered parameter maps.
//!
//! [`ParamDict`] is the building block for everything that ends up in a
//! generated script: model modifiers, command options and the run log
//! columns are all serialized from it. The map keeps insertion order and
//! prints as Modelica's nested tuple-based modifier syntax:
//!
//! ```
//! use mosim_core::ParamDict;
//!
//! let mut d = ParamDict::new();
//! d.set("a", 1).unwrap();
//! d.set("b.c", vec![2.into(), 3.into()]).unwrap();
//! d.set("b.d", false).unwrap();
//! assert_eq!(d.to_string(), "(a=1, b(c={2, 3}, d=false))");
//! ```
//!
//! Only the string mapping is nested. The underlying storage stays flat,
//! keyed by the full dot-notation parameter name.

use std::fmt;

use linked_hash_map::LinkedHashMap;

use crate::error::{Error, Result};

/// Single Modelica-representable parameter value.
///
/// Strings are passed through verbatim and must carry their own double
/// quotes where a Modelica string is meant (e.g. `"\"hello\""`). This also
/// covers enumerations (`Axis.x`), function calls (`fill(true, 2, 2)`) and
/// redeclaration targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Real(f64),
    Raw(String),
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Parses a single Modelica literal. Anything that is not a boolean,
    /// a number or an array is kept verbatim as [`ParamValue::Raw`].
    pub fn from_literal(literal: &str) -> Result<ParamValue> {
        let literal = literal.trim();
        match literal {
            "true" => return Ok(ParamValue::Bool(true)),
            "false" => return Ok(ParamValue::Bool(false)),
            _ => (),
        }
        if let Ok(i) = literal.parse::<i64>() {
            return Ok(ParamValue::Integer(i));
        }
        if let Ok(f) = literal.parse::<f64>() {
            return Ok(ParamValue::Real(f));
        }
        if literal.starts_with('{') && literal.ends_with('}') {
            let inner = &literal[1..literal.len() - 1];
            let mut values = Vec::new();
            for element in split_top_level(inner) {
                values.push(ParamValue::from_literal(&element)?);
            }
            return Ok(ParamValue::Array(values));
        }
        if literal.is_empty() {
            return Err(Error::ParsingError("empty parameter literal".to_string()));
        }
        Ok(ParamValue::Raw(literal.to_string()))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Integer(v) => write!(f, "{}", v),
            ParamValue::Real(v) => write!(f, "{}", v),
            ParamValue::Raw(v) => write!(f, "{}", v),
            ParamValue::Array(values) => {
                let elements: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", elements.join(", "))
            }
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}
impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Integer(v as i64)
    }
}
impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Integer(v)
    }
}
impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Real(v)
    }
}
impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Raw(v.to_string())
    }
}
impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Raw(v)
    }
}
impl From<Vec<ParamValue>> for ParamValue {
    fn from(v: Vec<ParamValue>) -> Self {
        ParamValue::Array(v)
    }
}

/// Insertion-ordered map from hierarchical parameter name to value.
///
/// Keys use Modelica dot notation (`C1.C`, `axis.motor.Ra.R`). Entries with
/// a `None` value are kept in the map but omitted from every serialized
/// form. Two keys must not collide after flattening, i.e. no key may be a
/// dotted prefix of another; such inserts are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamDict {
    entries: LinkedHashMap<String, Option<ParamValue>>,
}

impl ParamDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, replacing any previous value under the same key.
    ///
    /// Fails if the key is a dotted prefix of an existing key (or the other
    /// way around), since the two could not coexist in the nested modifier
    /// string.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<ParamValue>) -> Result<()> {
        let key = key.into();
        for existing in self.entries.keys() {
            if keys_collide(existing, &key) {
                return Err(Error::ParamCollision(key, existing.clone()));
            }
        }
        self.entries.insert(key, value);
        Ok(())
    }

    /// Inserts a present value. See [`ParamDict::insert`].
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Result<()> {
        self.insert(key, Some(value.into()))
    }

    pub fn remove(&mut self, key: &str) -> Option<Option<ParamValue>> {
        self.entries.remove(key)
    }

    /// Returns the value under the given key, `None` for both missing and
    /// null entries.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key).and_then(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<ParamValue>)> {
        self.entries.iter()
    }

    /// Copies all entries of `other` into `self`, replacing same-key
    /// entries.
    pub fn extend_from(&mut self, other: &ParamDict) -> Result<()> {
        for (key, value) in other.iter() {
            self.insert(key.clone(), value.clone())?;
        }
        Ok(())
    }

    /// Serialized form without the enclosing parentheses, as used for the
    /// `Options` column of the run log.
    pub fn inner(&self) -> String {
        self.render_elements().join(", ")
    }

    /// Parses a nested modifier string (the inverse of `Display`) back
    /// into a flat map with dotted keys.
    pub fn parse(text: &str) -> Result<ParamDict> {
        let text = text.trim();
        let mut dict = ParamDict::new();
        if text.is_empty() {
            return Ok(dict);
        }
        let chars: Vec<char> = text.chars().collect();
        let mut pos = 0;
        parse_group(&chars, &mut pos, "", &mut dict)?;
        skip_whitespace(&chars, &mut pos);
        if pos != chars.len() {
            return Err(Error::ParsingError(format!(
                "trailing input after modifier string: {}",
                chars[pos..].iter().collect::<String>()
            )));
        }
        Ok(dict)
    }

    // Renders the top-level elements of the nested modifier string.
    fn render_elements(&self) -> Vec<String> {
        let mut root = Branch::default();
        for (name, value) in self.entries.iter() {
            let value = match value {
                Some(v) => v,
                // null entries are dropped from the string mapping
                None => continue,
            };
            root.insert(name, value);
        }
        root.render()
    }
}

impl fmt::Display for ParamDict {
    /// Maps the dictionary to a nested tuple-based modifier string. An
    /// empty (or all-null) dictionary prints as an empty string, not `()`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let elements = self.render_elements();
        if elements.is_empty() {
            Ok(())
        } else {
            write!(f, "({})", elements.join(", "))
        }
    }
}

fn keys_collide(a: &str, b: &str) -> bool {
    if a == b {
        // same key replaces, that's not a collision
        return false;
    }
    let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
    long.starts_with(short) && long.as_bytes()[short.len()] == b'.'
}

/// Transient tree used to nest dotted keys for rendering.
#[derive(Default)]
struct Branch<'a> {
    children: LinkedHashMap<&'a str, Node<'a>>,
}

enum Node<'a> {
    Leaf(&'a ParamValue),
    Branch(Branch<'a>),
}

impl<'a> Branch<'a> {
    fn insert(&mut self, name: &'a str, value: &'a ParamValue) {
        match name.split_once('.') {
            Some((head, rest)) => {
                let node = self
                    .children
                    .entry(head)
                    .or_insert_with(|| Node::Branch(Branch::default()));
                if let Node::Branch(branch) = node {
                    branch.insert(rest, value);
                }
            }
            None => {
                self.children.insert(name, Node::Leaf(value));
            }
        }
    }

    fn render(&self) -> Vec<String> {
        let mut elements = Vec::new();
        for (name, node) in self.children.iter() {
            match node {
                Node::Leaf(value) => elements.push(format!("{}={}", name, value)),
                Node::Branch(branch) => {
                    elements.push(format!("{}({})", name, branch.render().join(", ")))
                }
            }
        }
        elements
    }
}

fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

// Parses `(name=value, name(...), ...)` starting at `pos`, inserting the
// flattened entries under the given dotted prefix.
fn parse_group(chars: &[char], pos: &mut usize, prefix: &str, dict: &mut ParamDict) -> Result<()> {
    skip_whitespace(chars, pos);
    if *pos >= chars.len() || chars[*pos] != '(' {
        return Err(Error::ParsingError(
            "expected '(' at start of modifier group".to_string(),
        ));
    }
    *pos += 1;
    loop {
        skip_whitespace(chars, pos);
        if *pos < chars.len() && chars[*pos] == ')' {
            *pos += 1;
            return Ok(());
        }

        // read the name part, up to '=' (value follows) or '(' (subgroup)
        let name_start = *pos;
        while *pos < chars.len() && chars[*pos] != '=' && chars[*pos] != '(' {
            *pos += 1;
        }
        if *pos >= chars.len() {
            return Err(Error::ParsingError(
                "unterminated modifier group".to_string(),
            ));
        }
        let name: String = chars[name_start..*pos].iter().collect();
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::ParsingError(
                "empty name in modifier group".to_string(),
            ));
        }
        let full_name = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };

        if chars[*pos] == '(' {
            parse_group(chars, pos, &full_name, dict)?;
        } else {
            *pos += 1; // '='
            let literal = read_value(chars, pos)?;
            dict.insert(full_name, Some(ParamValue::from_literal(&literal)?))?;
        }

        skip_whitespace(chars, pos);
        match chars.get(*pos) {
            Some(',') => *pos += 1,
            Some(')') => {
                *pos += 1;
                return Ok(());
            }
            _ => {
                return Err(Error::ParsingError(
                    "expected ',' or ')' in modifier group".to_string(),
                ))
            }
        }
    }
}

// Reads a value literal up to the next top-level ',' or ')'. Parentheses,
// braces and double-quoted strings may nest inside.
fn read_value(chars: &[char], pos: &mut usize) -> Result<String> {
    let start = *pos;
    let mut depth = 0i32;
    let mut in_string = false;
    while *pos < chars.len() {
        let c = chars[*pos];
        if in_string {
            if c == '"' {
                in_string = false;
            }
        } else {
            match c {
                '"' => in_string = true,
                '(' | '{' => depth += 1,
                '}' => depth -= 1,
                ')' if depth == 0 => break,
                ')' => depth -= 1,
                ',' if depth == 0 => break,
                _ => (),
            }
        }
        *pos += 1;
    }
    if *pos >= chars.len() || in_string {
        return Err(Error::ParsingError("unterminated value literal".to_string()));
    }
    Ok(chars[start..*pos].iter().collect())
}

/// Splits on commas that are not nested in braces, parens or strings.
fn split_top_level(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut current = String::new();
    for c in text.chars() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_modifier_string() {
        let mut d = ParamDict::new();
        d.set("a", 1).unwrap();
        d.set("b.c", vec![2.into(), 3.into()]).unwrap();
        d.set("b.d", false).unwrap();
        d.set("b.e", "\"hello\"").unwrap();
        d.insert("b.f", None).unwrap();
        assert_eq!(d.to_string(), "(a=1, b(c={2, 3}, d=false, e=\"hello\"))");
    }

    #[test]
    fn empty_dict_prints_as_empty_string() {
        assert_eq!(ParamDict::new().to_string(), "");
        let mut d = ParamDict::new();
        d.insert("only.null", None).unwrap();
        assert_eq!(d.to_string(), "");
    }

    #[test]
    fn keys_keep_insertion_order() {
        let mut d = ParamDict::new();
        d.set("stopTime", 2500).unwrap();
        d.set("method", "\"Dassl\"").unwrap();
        d.set("startTime", 0).unwrap();
        assert_eq!(
            d.inner(),
            "stopTime=2500, method=\"Dassl\", startTime=0"
        );
    }

    #[test]
    fn prefix_keys_are_rejected() {
        let mut d = ParamDict::new();
        d.set("a.b", 1).unwrap();
        assert!(matches!(
            d.set("a.b.c", 2),
            Err(Error::ParamCollision(_, _))
        ));
        // replacing the exact same key is fine
        d.set("a.b", 3).unwrap();
        assert_eq!(d.get("a.b"), Some(&ParamValue::Integer(3)));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn parse_round_trips_flattened_keys() {
        let mut d = ParamDict::new();
        d.set("a", 1).unwrap();
        d.set("b.c", vec![2.into(), 3.into()]).unwrap();
        d.set("b.d", false).unwrap();
        d.set("b.e", "\"hello\"").unwrap();
        let parsed = ParamDict::parse(&d.to_string()).unwrap();
        assert_eq!(parsed, d);
    }

    #[test]
    fn parse_keeps_function_calls_verbatim() {
        let parsed = ParamDict::parse("(a=fill(true, 2, 2), b=Axis.x)").unwrap();
        assert_eq!(parsed.get("a"), Some(&ParamValue::Raw("fill(true, 2, 2)".to_string())));
        assert_eq!(parsed.get("b"), Some(&ParamValue::Raw("Axis.x".to_string())));
    }

    #[test]
    fn parse_empty_string() {
        assert!(ParamDict::parse("").unwrap().is_empty());
    }

    #[test]
    fn real_values_render_plainly() {
        let mut d = ParamDict::new();
        d.set("tolerance", 0.0001).unwrap();
        assert_eq!(d.to_string(), "(tolerance=0.0001)");
    }
}
