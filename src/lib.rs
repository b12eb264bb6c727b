//! Swagger Synth - Swagger 2.0 documents from controller metadata.
//!
//! Web controllers, their handler methods, handler parameters and model
//! fields carry metadata facts. This library walks the facts of a set of
//! controller classes and assembles one Swagger 2.0 document: a tag list,
//! one operation per (path, verb) pair, and a definition for every model
//! that is referenced.
//!
//! # Architecture
//!
//! 1. [`facts`] - The [`facts::FactStore`] trait and the in-memory store
//! 2. [`manifest`] - Loads controller and model declarations from YAML or JSON
//! 3. [`scanner`] - Finds manifest files in a directory tree
//! 4. [`type_resolver`] - Classifies declared types against the facts
//! 5. [`schema_generator`] - Converts types to schemas and owns the definitions
//! 6. [`document_builder`] - Registers controllers and builds the document
//! 7. [`serializer`] - Serializes the document to JSON or YAML
//! 8. [`booter`] - Mounts the document and its viewer page on a router
//!
//! # Example Usage
//!
//! ```
//! use swagger_synth::document_builder::DocumentBuilder;
//! use swagger_synth::manifest::Manifest;
//! use swagger_synth::facts::store::MetadataStore;
//!
//! let manifest = Manifest::parse(
//!     "controllers:
//!        - name: PingController
//!          base_path: /api
//!          handlers:
//!            - name: ping
//!              routes: [{method: GET, path: /ping}]",
//! )
//! .unwrap();
//!
//! let mut store = MetadataStore::new();
//! let controllers = manifest.apply(&mut store);
//!
//! let mut builder = DocumentBuilder::new(&store);
//! for controller in &controllers {
//!     builder.register(controller);
//! }
//! let document = builder.build();
//! assert!(document.paths["/api/ping"].contains_key("get"));
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod booter;
pub mod cli;
pub mod config;
pub mod document_builder;
pub mod error;
pub mod facts;
pub mod manifest;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod type_resolver;
