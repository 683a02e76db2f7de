//! Declared response schemas.
//!
//! A [`SwaggerResponse`] pairs a schema with a status code. Attaching it to a handler extracts
//! the schema right away, so an unsupported field is reported when the handler is declared, and
//! stores `{"<status>": {"description", "schema"}}` on the handler metadata. Nothing about how
//! the handler runs changes.

use crate::error::Result;
use crate::route::HandlerMeta;
use crate::schema::SchemaInstance;
use log::debug;
use serde_json::{json, Map, Value};

/// Response schema bound to an HTTP status code
#[derive(Debug, Clone)]
pub struct SwaggerResponse {
    schema: SchemaInstance,
    status: u16,
}

impl SwaggerResponse {
    /// `schema` may be a schema class (used with default options) or a configured instance
    pub fn new<S: Into<SchemaInstance>>(schema: S, status: u16) -> Self {
        Self {
            schema: schema.into(),
            status,
        }
    }

    /// A `200` response
    pub fn ok<S: Into<SchemaInstance>>(schema: S) -> Self {
        Self::new(schema, 200)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// The response mapping this descriptor contributes
    pub fn responses(&self) -> Result<Map<String, Value>> {
        let mut responses = Map::new();
        responses.insert(
            self.status.to_string(),
            json!({
                "description": "api result",
                "schema": self.schema.extract()?,
            }),
        );
        Ok(responses)
    }

    /// Store the response mapping on `handler`, replacing an entry with the same status
    pub fn attach(&self, handler: &mut HandlerMeta) -> Result<()> {
        debug!(
            "Attaching {} response {} to {}",
            self.status,
            self.schema.class().name(),
            handler.name
        );
        let responses = self.responses()?;
        handler
            .responses
            .get_or_insert_with(Map::new)
            .extend(responses);
        Ok(())
    }
}
