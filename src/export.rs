//! Export encoders: indented JSON, YAML and indented XML.

use std::fmt;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    Xml,
}

impl ExportFormat {
    /// Parse a format name; anything unknown is a validation error.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "yaml" | "yml" => Ok(ExportFormat::Yaml),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(Error::validation(format!(
                "unsupported export format: {} (expected json, yaml or xml)",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Yaml => "yaml",
            ExportFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode `data` as `format`, using `root` as the XML document element.
pub fn export<T: Serialize>(data: &T, format: ExportFormat, root: &str) -> Result<String> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(data)
            .map_err(|e| Error::system_with("failed to encode JSON", e)),
        ExportFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| Error::system_with("failed to encode YAML", e))
        }
        ExportFormat::Xml => {
            let value =
                serde_json::to_value(data).map_err(|e| Error::system_with("failed to encode XML", e))?;
            to_xml(&value, root)
        }
    }
}

fn to_xml(value: &Value, root: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write_xml(&mut writer, value, root)
        .map_err(|e| Error::system_with("failed to encode XML", e))?;
    let body = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::system_with("XML output is not UTF-8", e))?;

    let mut decl = Writer::new(Vec::new());
    decl.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::system_with("failed to encode XML", e))?;
    let decl = String::from_utf8(decl.into_inner())
        .map_err(|e| Error::system_with("XML output is not UTF-8", e))?;

    Ok(format!("{}\n{}\n", decl, body))
}

fn write_xml(writer: &mut Writer<Vec<u8>>, value: &Value, name: &str) -> quick_xml::Result<()> {
    let start = if is_xml_name(name) {
        BytesStart::new(name)
    } else {
        let mut entry = BytesStart::new("entry");
        entry.push_attribute(("key", name));
        entry
    };
    let end_name = if is_xml_name(name) { name } else { "entry" };

    match value {
        Value::Null => writer.write_event(Event::Empty(start))?,
        Value::Object(map) => {
            writer.write_event(Event::Start(start))?;
            for (key, child) in map {
                write_xml(writer, child, key)?;
            }
            writer.write_event(Event::End(BytesEnd::new(end_name)))?;
        }
        Value::Array(items) => {
            writer.write_event(Event::Start(start))?;
            for item in items {
                write_xml(writer, item, "item")?;
            }
            writer.write_event(Event::End(BytesEnd::new(end_name)))?;
        }
        scalar => {
            let text = match scalar {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&text)))?;
            writer.write_event(Event::End(BytesEnd::new(end_name)))?;
        }
    }
    Ok(())
}

/// Conservative XML element-name check.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unsupported_format_is_validation_error() {
        let err = ExportFormat::parse("csv").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert_eq!(ExportFormat::parse(" YAML ").unwrap(), ExportFormat::Yaml);
    }

    #[test]
    fn test_json_is_indented() {
        let out = export(&json!({"a": [1, 2]}), ExportFormat::Json, "root").unwrap();
        assert!(out.contains("\n  \"a\": [\n"));
    }

    #[test]
    fn test_yaml() {
        let out = export(&json!({"method": "GET", "path": "/users"}), ExportFormat::Yaml, "r")
            .unwrap();
        assert!(out.contains("method: GET"));
        assert!(out.contains("path: /users"));
    }

    #[test]
    fn test_xml_structure_and_escaping() {
        let data = json!({
            "path": "/users/:id",
            "handler": "a<b>&c",
            "middlewares": ["auth", "cors"],
            "request_type": null,
            "api/router.go": 3
        });
        let out = export(&data, ExportFormat::Xml, "endpoint").unwrap();

        assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(out.contains("<endpoint>"));
        assert!(out.contains("  <path>/users/:id</path>"));
        assert!(out.contains("<handler>a&lt;b&gt;&amp;c</handler>"));
        assert!(out.contains("    <item>auth</item>"));
        assert!(out.contains("<request_type/>"));
        assert!(out.contains("<entry key=\"api/router.go\">3</entry>"));
        assert!(out.trim_end().ends_with("</endpoint>"));
    }

    #[test]
    fn test_xml_names() {
        assert!(is_xml_name("created_at"));
        assert!(!is_xml_name("1abc"));
        assert!(!is_xml_name("a/b"));
        assert!(!is_xml_name(""));
    }
}
