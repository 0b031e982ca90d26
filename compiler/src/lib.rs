//! protostream-compiler
//!
//! This crate implements:
//!  1) A lazy tokenizer + recursive-descent parser for protostream IDL files,
//!  2) Code generation (`compile_schema_to_rust` → `String`), streaming types
//!     for top-level messages and plain types for nested ones,
//!  3) `EmissionProfile`, the target-library conventions the output is spelled with,
//!  4) Error types (`ProtoError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod tokenizer;
pub mod parser;
pub mod profile;
pub mod compiler;
pub mod gen_rust;

pub use compiler::{compile_file, compile_reader, compile_schema};
pub use error::ProtoError;
pub use gen_rust::{compile_schema_to_rust, generate_with, GenOptions};
pub use parser::{parse_reader, parse_schema};
pub use profile::{EmissionProfile, ProtobufProfile};
