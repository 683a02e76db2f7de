//! Handler documentation parsing.
//!
//! A handler's documentation text is laid out as:
//!
//! ```text
//! One line summary
//!
//! Free text description, possibly
//! spanning several lines.
//! ---
//! tags: [items]
//! parameters:
//!   - name: body
//!     in: body
//!     schema: ...
//! ```
//!
//! Everything from the first line starting with `---` is a YAML specification fragment.

use crate::error::{Error, Result};
use serde_json::{Map, Number, Value};

/// Parsed handler documentation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Docstring {
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Structured fragment; `None` when the text has no `---` block
    pub fragment: Option<Map<String, Value>>,
}

/// Normalise indentation the way doc comments and indented string literals need it: the first
/// line loses its leading whitespace, the following lines lose their common indentation, and
/// blank lines at either end are dropped.
pub fn clean_doc(doc: &str) -> String {
    let expanded = doc.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines[1..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start().to_string());
    for line in &lines[1..] {
        if line.trim().is_empty() {
            cleaned.push(String::new());
        } else {
            cleaned.push(line[margin..].trim_end().to_string());
        }
    }

    while cleaned.first().map_or(false, |l| l.trim().is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().map_or(false, |l| l.trim().is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

fn sanitize(text: &str) -> String {
    text.replace('\n', "<br/>")
}

/// Offset of the first line that starts with `---`
fn find_fragment_marker(text: &str) -> Option<usize> {
    if text.starts_with("---") {
        return Some(0);
    }
    text.find("\n---").map(|i| i + 1)
}

/// Split documentation text into summary, description and structured fragment
pub fn parse_docstring(doc: Option<&str>) -> Result<Docstring> {
    let doc = match doc.map(clean_doc) {
        Some(doc) if !doc.is_empty() => doc,
        _ => return Ok(Docstring::default()),
    };

    let mut parsed = Docstring::default();
    match doc.find('\n') {
        Some(line_feed) => {
            parsed.summary = Some(sanitize(&doc[..line_feed]));
            let rest = &doc[line_feed + 1..];
            match find_fragment_marker(rest) {
                Some(sep) => {
                    parsed.description = Some(sanitize(&rest[..sep]));
                    parsed.fragment = Some(parse_fragment(&rest[sep..])?);
                }
                None => parsed.description = Some(sanitize(rest)),
            }
        }
        None => parsed.summary = Some(doc.clone()),
    }

    if parsed.summary.as_deref().map_or(false, |s| s.trim().is_empty()) {
        parsed.summary = parsed.description.clone();
    }
    Ok(parsed)
}

/// Parse a YAML fragment (including its leading `---`) into a JSON object
pub fn parse_fragment(text: &str) -> Result<Map<String, Value>> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|e| Error::Fragment(format!("invalid YAML: {}", e)))?;
    match yaml_to_json(yaml) {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        other => Err(Error::Fragment(format!(
            "expected a mapping but got {}",
            other
        ))),
    }
}

/// Convert YAML into JSON, rendering non-string mapping keys (such as status codes) as strings
pub fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(seq.into_iter().map(yaml_to_json).collect()),
        serde_yaml::Value::Mapping(mapping) => Value::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => yaml_to_json(other).to_string(),
    }
}
