//! OpenAPI Assembler - builds one OpenAPI 3.0 document from schema fragments,
//! annotated Rust controllers and on-disk code samples.
//!
//! # Architecture
//!
//! The library is organized into one module per pipeline stage:
//!
//! 1. [`scanner`] - Resolves glob patterns into an ordered list of files
//! 2. [`registry`] - Merges schema fragment files into the schema registry
//! 3. [`parser`] / [`controller`] - Parses controller sources and collects routed methods
//! 4. [`metadata`] - The per-parameter side table shared by the later stages
//! 5. [`linker`] - Points annotated parameters at registry schemas
//! 6. [`schema_generator`] / [`openapi_builder`] - Generate the document model
//! 7. [`composer`] - Builds the document and applies the static overlay
//! 8. [`postprocess`] - Attaches code samples and injects server lists
//! 9. [`serializer`] - Serializes the document and writes it atomically
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_assembler::{cli, config::Config};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("openapi-assembler.yaml")).unwrap();
//! let summary = cli::generate(config, Path::new(".")).unwrap();
//! println!("{} operations written to {}", summary.operations, summary.out.display());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod config;
pub mod scanner;
pub mod parser;
pub mod controller;
pub mod metadata;
pub mod registry;
pub mod linker;
pub mod schema_generator;
pub mod openapi_builder;
pub mod composer;
pub mod postprocess;
pub mod serializer;
pub mod error;
