use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::{
    profile::{EmissionProfile, ProtobufProfile},
    types::{Field, Message, Protobuf},
    utils::{capitalize, escape_rust_keyword, module_name, to_snake_case},
};

const INDENT: &str = "    ";

/// Internal members of a streaming type.
pub const ERRORS_MEMBER: &str = "errors_ch";
pub const CLOSED_MEMBER: &str = "close_ch";
pub const GUARD_MEMBER:  &str = "close_guard";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarType {
    pub rust: &'static str,
    /// Initializer for types that can already be empty, which are never wrapped in `Option`.
    pub empty: Option<&'static str>,
}

lazy_static! {
    /// Primitive IDL keywords and the Rust types they render as.
    pub static ref TYPE_MAP: HashMap<&'static str, ScalarType> = {
        let mut map = HashMap::new();
        map.insert("string", ScalarType { rust: "String",  empty: None });
        map.insert("bytes",  ScalarType { rust: "Vec<u8>", empty: Some("Vec::new()") });
        map.insert("int32",  ScalarType { rust: "i32",     empty: None });
        map.insert("uint32", ScalarType { rust: "u32",     empty: None });
        map.insert("int64",  ScalarType { rust: "i64",     empty: None });
        map.insert("uint64", ScalarType { rust: "u64",     empty: None });
        map.insert("bool",   ScalarType { rust: "bool",    empty: None });
        map
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenOptions {
    /// Guard `close()` so that only the first call closes anything.
    pub idempotent_close: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions { idempotent_close: true }
    }
}

enum ElementType {
    Scalar(ScalarType),
    Reference(String),
}

impl ElementType {
    /// Any keyword missing from the type table names a message under `prefix`.
    fn resolve(type_: &str, prefix: &str) -> Self {
        match TYPE_MAP.get(type_) {
            Some(scalar) => ElementType::Scalar(*scalar),
            None => ElementType::Reference(format!("{}{}", prefix, capitalize(type_))),
        }
    }

    fn name(&self) -> &str {
        match self {
            ElementType::Scalar(scalar) => scalar.rust,
            ElementType::Reference(name) => name,
        }
    }
}

/// Flattened name of a message declared under `prefix`.
pub fn type_name(prefix: &str, name: &str) -> String {
    format!("{}{}", prefix, capitalize(name))
}

pub fn member_name(field: &Field) -> String {
    escape_rust_keyword(&to_snake_case(&field.name))
}

struct Generator<'a> {
    profile: &'a dyn EmissionProfile,
    options: &'a GenOptions,
    lines:   Vec<String>,
}

impl<'a> Generator<'a> {
    fn new(profile: &'a dyn EmissionProfile, options: &'a GenOptions) -> Self {
        Generator {
            profile,
            options,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, depth: usize, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines.push(format!("{}{}", INDENT.repeat(depth), text));
        }
    }

    fn finish(mut self) -> Vec<String> {
        while self.lines.last().map_or(false, |l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn member_type(&self, field: &Field, prefix: &str, stream: bool) -> String {
        let element = ElementType::resolve(&field.type_, prefix);
        if field.is_repeated() {
            return if stream {
                self.profile.channel_type(element.name())
            } else {
                format!("Vec<{}>", element.name())
            };
        }
        match element {
            ElementType::Scalar(ScalarType { rust, empty: Some(_) }) => rust.to_string(),
            ElementType::Scalar(scalar) => format!("Option<{}>", scalar.rust),
            ElementType::Reference(name) => format!("Option<Box<{}>>", name),
        }
    }

    fn initializer(&self, field: &Field, stream: bool) -> String {
        if field.is_repeated() {
            return if stream {
                self.profile.new_channel(0)
            } else {
                "Vec::new()".to_string()
            };
        }
        match TYPE_MAP.get(field.type_.as_str()).and_then(|scalar| scalar.empty) {
            Some(empty) => empty.to_string(),
            None => "None".to_string(),
        }
    }

    fn generate_message(&mut self, message: &Message, prefix: &str, stream: bool) {
        let name = type_name(prefix, &message.name);
        let nested_prefix = format!("{}_", name);
        debug!(message = %name, stream, fields = message.fields.len(), "generating message");

        self.generate_struct(message, &name, &nested_prefix, stream);
        self.generate_constructor(message, &name, stream);
        if stream {
            self.generate_stream_methods(message, &name);
        }
        self.generate_message_methods(&name);
        self.generate_assertion(&name, stream);

        for sub_message in &message.sub_messages {
            self.generate_message(sub_message, &nested_prefix, false);
        }
    }

    fn generate_struct(&mut self, message: &Message, name: &str, prefix: &str, stream: bool) {
        if name.contains('_') {
            self.push(0, "#[allow(non_camel_case_types)]");
        }
        let derives = self.profile.derives();
        if !derives.is_empty() {
            self.push(0, format!("#[derive({})]", derives.join(", ")));
        }
        self.push(0, format!("pub struct {} {{", name));

        for field in &message.fields {
            let tag = self.profile.field_tag(field);
            let member = format!(
                "pub {}: {},",
                member_name(field),
                self.member_type(field, prefix, stream)
            );
            self.push(1, tag);
            self.push(1, member);
        }

        if stream {
            let errors = self.profile.channel_type(&self.profile.error_type());
            let closed = self.profile.channel_type("()");
            self.push(1, format!("{}: {},", ERRORS_MEMBER, errors));
            self.push(1, format!("{}: {},", CLOSED_MEMBER, closed));
            if self.options.idempotent_close {
                self.push(1, format!("{}: ::std::sync::atomic::AtomicBool,", GUARD_MEMBER));
            }
        }

        self.push(0, "}");
        self.push(0, "");
    }

    fn generate_constructor(&mut self, message: &Message, name: &str, stream: bool) {
        self.push(0, format!("impl {} {{", name));
        self.push(1, "pub fn new() -> Self {");
        self.push(2, "Self {");
        for field in &message.fields {
            let init = format!("{}: {},", member_name(field), self.initializer(field, stream));
            self.push(3, init);
        }
        if stream {
            let errors = self.profile.new_channel(1);
            let closed = self.profile.new_channel(0);
            self.push(3, format!("{}: {},", ERRORS_MEMBER, errors));
            self.push(3, format!("{}: {},", CLOSED_MEMBER, closed));
            if self.options.idempotent_close {
                self.push(3, format!("{}: ::std::sync::atomic::AtomicBool::new(false),", GUARD_MEMBER));
            }
        }
        self.push(2, "}");
        self.push(1, "}");
        self.push(0, "}");
        self.push(0, "");

        self.push(0, format!("impl Default for {} {{", name));
        self.push(1, "fn default() -> Self {");
        self.push(2, "Self::new()");
        self.push(1, "}");
        self.push(0, "}");
        self.push(0, "");
    }

    /// Lifecycle operations: repeated channels close first, then errors, then the closed signal.
    fn generate_stream_methods(&mut self, message: &Message, name: &str) {
        let error_type = self.profile.error_type();
        let errors_channel = self.profile.channel_type(&error_type);
        let closed_receiver = self.profile.receiver_type("()");

        self.push(0, format!("impl {} for {} {{", self.profile.stream_capability(), name));

        self.push(1, format!("fn errors(&self) -> &{} {{", errors_channel));
        self.push(2, format!("&self.{}", ERRORS_MEMBER));
        self.push(1, "}");
        self.push(0, "");

        self.push(1, format!("fn closed(&self) -> {} {{", closed_receiver));
        let subscribe = self.profile.subscribe(&format!("self.{}", CLOSED_MEMBER));
        self.push(2, subscribe);
        self.push(1, "}");
        self.push(0, "");

        self.push(1, format!("fn close(&self) -> Result<(), {}> {{", error_type));
        if self.options.idempotent_close {
            self.push(
                2,
                format!(
                    "if self.{}.swap(true, ::std::sync::atomic::Ordering::AcqRel) {{",
                    GUARD_MEMBER
                ),
            );
            self.push(3, "return Ok(());");
            self.push(2, "}");
        }
        let mut channels: Vec<String> = message.repeated_fields().map(member_name).collect();
        channels.push(ERRORS_MEMBER.to_string());
        channels.push(CLOSED_MEMBER.to_string());
        for channel in channels {
            let close = self.profile.close_channel(&format!("self.{}", channel));
            self.push(2, format!("{};", close));
        }
        self.push(2, "Ok(())");
        self.push(1, "}");

        self.push(0, "}");
        self.push(0, "");
    }

    fn generate_message_methods(&mut self, name: &str) {
        self.push(0, format!("impl {} for {} {{", self.profile.message_capability(), name));
        for line in self.profile.message_impl_body() {
            self.push(1, line);
        }
        self.push(0, "}");
        self.push(0, "");

        self.push(0, format!("impl ::std::fmt::Display for {} {{", name));
        self.push(1, "fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {");
        let text = self.profile.compact_text("self");
        self.push(2, format!("f.write_str(&{})", text));
        self.push(1, "}");
        self.push(0, "}");
        self.push(0, "");
    }

    /// Compile-time check that `name` satisfies its capability.
    fn generate_assertion(&mut self, name: &str, stream: bool) {
        let capability = if stream {
            self.profile.stream_capability()
        } else {
            self.profile.message_capability()
        };
        self.push(0, "const _: fn() = || {");
        self.push(1, format!("fn assert_capability<T: ?Sized + {}>() {{}}", capability));
        self.push(1, format!("assert_capability::<{}>();", name));
        self.push(0, "};");
        self.push(0, "");
    }
}

/// Compiles the schema into Rust source with the default profile and options.
pub fn compile_schema_to_rust(schema: &Protobuf) -> String {
    generate_with(schema, &ProtobufProfile::default(), &GenOptions::default())
}

/// Compiles the schema into Rust source.
///
/// Top-level messages become streaming types, every nested message a plain type
/// named after its ancestors (`Outer_Inner`). When the schema declares a
/// package, everything is wrapped in a module of that name.
pub fn generate_with(
    schema: &Protobuf,
    profile: &dyn EmissionProfile,
    options: &GenOptions,
) -> String {
    let mut generator = Generator::new(profile, options);
    for message in &schema.messages {
        generator.generate_message(message, "", true);
    }
    let body = generator.finish();

    let mut rust_code: Vec<String> = Vec::new();
    match &schema.package {
        Some(package) => {
            rust_code.push(format!("pub mod {} {{", module_name(package)));
            for line in body {
                if line.is_empty() {
                    rust_code.push(line);
                } else {
                    rust_code.push(format!("{}{}", INDENT, line));
                }
            }
            rust_code.push("}".to_string());
        }
        None => rust_code.extend(body),
    }

    let mut out = rust_code.join("\n");
    out.push('\n');
    out
}
