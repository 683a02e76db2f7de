//! Swagger From Routes - Swagger 2.0 documents from a web application's route table.
//!
//! Handlers carry their API description in their documentation text: a summary, a free text
//! description and, after a `---` line, a YAML fragment of the Swagger operation. The library
//! completes each fragment with what the application already declares elsewhere and assembles
//! the result into one document.
//!
//! # Architecture
//!
//! 1. [`field`] - Declarative request fields that read, convert and check one value
//! 2. [`form`] - Named field sets with inheritance, bound to handlers, exported as parameters
//! 3. [`schema`] - Maps data-model schemas onto Swagger property descriptors
//! 4. [`response`] - Attaches response schemas to handler metadata
//! 5. [`docstring`] - Splits documentation text into summary, description and fragment
//! 6. [`route`] - Read interface onto the application's route table
//! 7. [`swagger_builder`] - Assembles paths and the namespaced definition table
//! 8. [`manifest`] / [`scanner`] / [`serializer`] - Build-time generation from YAML or JSON
//!    manifests
//!
//! # Example Usage
//!
//! ```
//! use swagger_from_routes::field::{FieldSpec, Source};
//! use swagger_from_routes::form::{FormBinding, FormDecl};
//! use swagger_from_routes::route::{HandlerMeta, Route, StaticRouteTable};
//! use swagger_from_routes::schema::{NumType, SchemaDef, SchemaField};
//! use swagger_from_routes::swagger_builder::swagger;
//!
//! let item = SchemaDef::new("Item")
//!     .field("id", SchemaField::Number(NumType::Int))
//!     .field("title", SchemaField::String)
//!     .build();
//! let page = FormDecl::new("PageForm")
//!     .field("page", FieldSpec::int(Source::Args).optional())
//!     .register();
//!
//! let handler = HandlerMeta::new("app.items", "list_items")
//!     .doc("List items.\n---\ntags: [items]")
//!     .form(FormBinding::new(page))
//!     .with_response(&item, 200)
//!     .unwrap();
//! let table = StaticRouteTable::new().route(Route::function("/items", &["GET"], handler));
//!
//! let doc = swagger(&table).unwrap();
//! assert!(doc.paths["/items"].contains_key("get"));
//! assert!(doc.definitions.contains_key("app.items.list_items:Item"));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod docstring;
pub mod error;
pub mod field;
pub mod form;
pub mod manifest;
pub mod request;
pub mod response;
pub mod route;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod swagger_builder;
