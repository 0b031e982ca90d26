use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::{
    error::ProtoError,
    gen_rust::{generate_with, GenOptions},
    parser::{parse_reader, parse_schema},
    profile::{EmissionProfile, ProtobufProfile},
    types::Protobuf,
};

/// Compile a textual schema into `(Protobuf, String)` with the default profile.
/// Returns `Err(ProtoError)` if tokenization or parsing fails; no code is produced then.
pub fn compile_schema(text: &str) -> Result<(Protobuf, String), ProtoError> {
    let schema = parse_schema(text)?;
    let code = generate_with(&schema, &ProtobufProfile::default(), &GenOptions::default());
    Ok((schema, code))
}

/// Compile a schema read from `reader`.
pub fn compile_reader<R: Read>(
    reader: R,
    profile: &dyn EmissionProfile,
    options: &GenOptions,
) -> Result<(Protobuf, String), ProtoError> {
    let schema = parse_reader(reader)?;
    let code = generate_with(&schema, profile, options);
    Ok((schema, code))
}

/// Open and compile the schema file at `path`.
pub fn compile_file(
    path: &Path,
    profile: &dyn EmissionProfile,
    options: &GenOptions,
) -> Result<(Protobuf, String), ProtoError> {
    debug!(path = %path.display(), "compiling schema file");
    let file = File::open(path)?;
    compile_reader(file, profile, options)
}
