//! Serialization module for converting Swagger documents to YAML or JSON format.
//!
//! This module provides functions to serialize Swagger documents into standard formats
//! and write them to files or return them as strings.

use crate::swagger_builder::SwaggerDocument;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Serializes a Swagger document to YAML format.
///
/// # Example
///
/// ```
/// use swagger_from_routes::serializer::serialize_yaml;
/// use swagger_from_routes::swagger_builder::SwaggerBuilder;
///
/// let doc = SwaggerBuilder::new().build();
/// let yaml = serialize_yaml(&doc).unwrap();
/// assert!(yaml.contains("swagger:"));
/// ```
pub fn serialize_yaml(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing Swagger document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize Swagger document to YAML")
}

/// Serializes a Swagger document to JSON format with pretty printing.
pub fn serialize_json(doc: &SwaggerDocument) -> Result<String> {
    debug!("Serializing Swagger document to JSON");
    serde_json::to_string_pretty(doc).context("Failed to serialize Swagger document to JSON")
}

/// Writes string content to a file.
///
/// Creates the file (and its parent directories) if it doesn't exist, or overwrites it if it
/// does.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{HandlerMeta, Route, StaticRouteTable};
    use crate::swagger_builder::{swagger, SwaggerBuilder};
    use tempfile::TempDir;

    fn create_test_document() -> SwaggerDocument {
        let table = StaticRouteTable::new().route(Route::function(
            "/users/<int:id>",
            &["GET"],
            HandlerMeta::new("app.users", "get_user").doc("Get a user\n---\ntags: [users]"),
        ));
        swagger(&table).unwrap()
    }

    #[test]
    fn test_serialize_yaml() {
        let yaml = serialize_yaml(&create_test_document()).unwrap();

        assert!(yaml.contains("swagger:"));
        assert!(yaml.contains("2.0"));
        assert!(yaml.contains("title: swagger project"));
        assert!(yaml.contains("/users/{id}:"));
        assert!(yaml.contains("get:"));
        assert!(yaml.contains("definitions:"));
    }

    #[test]
    fn test_serialize_json() {
        let json = serialize_json(&create_test_document()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["swagger"], "2.0");
        assert_eq!(parsed["info"]["version"], "0.0.1");
        let op = &parsed["paths"]["/users/{id}"]["get"];
        assert_eq!(op["summary"], "Get a user");
        assert_eq!(op["tags"][0], "users");
        assert_eq!(op["parameters"][0]["in"], "path");
        // nothing between the summary line and the separator
        assert_eq!(op["description"], "");
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let json = serialize_json(&SwaggerBuilder::new().build()).unwrap();

        assert!(json.contains('\n'));
        assert!(json.contains("  "));
        assert!(json.lines().count() > 5, "Pretty printed JSON should have multiple lines");
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("test.yaml");

        write_to_file("test content", &file_path).unwrap();
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "test content");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_write_yaml_file_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("swagger.yaml");

        let doc = create_test_document();
        write_to_file(&serialize_yaml(&doc).unwrap(), &file_path).unwrap();

        let content = fs::read_to_string(&file_path).unwrap();
        let deserialized: SwaggerDocument = serde_yaml::from_str(&content).unwrap();
        assert_eq!(deserialized, doc);
    }
}
