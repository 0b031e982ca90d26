#![cfg(test)]

use std::path::Path;

use protostream_compiler::{
    compile_file, compile_reader, compile_schema,
    error::ProtoError,
    gen_rust::{compile_schema_to_rust, GenOptions},
    parser::parse_schema,
    profile::ProtobufProfile,
    types::Attribute,
};

const POINT: &str = "package demo; message Point { required int32 x = 1; required int32 y = 2; }";

const POINT_RUST: &str = r#"pub mod demo {
    #[derive(Debug, ::proto::Tags)]
    pub struct Point {
        #[proto(tag = "int32,1,req,name=x")]
        pub x: Option<i32>,
        #[proto(tag = "int32,2,req,name=y")]
        pub y: Option<i32>,
        errors_ch: ::pbs::Channel<::pbs::Error>,
        close_ch: ::pbs::Channel<()>,
        close_guard: ::std::sync::atomic::AtomicBool,
    }

    impl Point {
        pub fn new() -> Self {
            Self {
                x: None,
                y: None,
                errors_ch: ::pbs::Channel::new(1),
                close_ch: ::pbs::Channel::new(0),
                close_guard: ::std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    impl Default for Point {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ::pbs::StreamMessage for Point {
        fn errors(&self) -> &::pbs::Channel<::pbs::Error> {
            &self.errors_ch
        }

        fn closed(&self) -> ::pbs::Receiver<()> {
            self.close_ch.receiver()
        }

        fn close(&self) -> Result<(), ::pbs::Error> {
            if self.close_guard.swap(true, ::std::sync::atomic::Ordering::AcqRel) {
                return Ok(());
            }
            self.errors_ch.close();
            self.close_ch.close();
            Ok(())
        }
    }

    impl ::proto::Message for Point {
        fn proto_message(&self) {}

        fn reset(&mut self) {
            *self = Self::new();
        }
    }

    impl ::std::fmt::Display for Point {
        fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
            f.write_str(&::proto::compact_text_string(self))
        }
    }

    const _: fn() = || {
        fn assert_capability<T: ?Sized + ::pbs::StreamMessage>() {}
        assert_capability::<Point>();
    };
}
"#;

#[test]
fn test_point_schema_compiles_to_streaming_type() {
    let (schema, code) = compile_schema(POINT).expect("compile_schema failed");

    assert_eq!(schema.package.as_deref(), Some("demo"));
    assert_eq!(schema.messages.len(), 1);
    assert_eq!(schema.messages[0].name, "Point");

    assert_eq!(code, POINT_RUST);
}

#[test]
fn test_parse_and_generate_nested_schema() {
    let input = r#"
    package telemetry;

    message Report {
      required string host = 1;
      repeated Sample samples = 2;
      optional Meta meta = 3;

      message Sample {
        required uint64 at = 1;
        repeated int64 values = 2;
      }

      message Meta {
        optional bytes digest = 1;
        message Origin {
          optional string region = 1;
        }
      }
    }

    message Heartbeat {
      optional bool alive = 1;
    }
    "#;

    let schema = parse_schema(input).expect("parse_schema failed");

    assert_eq!(schema.package.as_deref(), Some("telemetry"));
    assert_eq!(schema.messages.len(), 2);

    let report = &schema.messages[0];
    assert_eq!(report.name, "Report");
    assert_eq!(report.fields.len(), 3);
    assert_eq!(report.fields[0].name, "host");
    assert_eq!(report.fields[0].type_, "string");
    assert_eq!(report.fields[0].number, 1);
    assert_eq!(report.fields[0].attribute, Attribute::Required);
    assert_eq!(report.fields[1].name, "samples");
    assert_eq!(report.fields[1].type_, "Sample");
    assert_eq!(report.fields[1].attribute, Attribute::Repeated);
    assert_eq!(report.fields[2].name, "meta");
    assert_eq!(report.fields[2].attribute, Attribute::Optional);

    assert_eq!(report.sub_messages.len(), 2);
    assert_eq!(report.sub_messages[0].name, "Sample");
    assert_eq!(report.sub_messages[1].name, "Meta");
    assert_eq!(report.sub_messages[1].sub_messages[0].name, "Origin");

    let code = compile_schema_to_rust(&schema);

    assert!(code.starts_with("pub mod telemetry {\n"));
    assert!(code.contains("pub samples: ::pbs::Channel<Report_Sample>,"));
    assert!(code.contains("pub meta: Option<Box<Report_Meta>>,"));
    assert!(code.contains("pub struct Report_Sample {"));
    assert!(code.contains("pub values: Vec<i64>,"));
    assert!(code.contains("pub digest: Vec<u8>,"));
    assert!(code.contains("pub struct Report_Meta_Origin {"));
    assert!(code.contains("impl ::pbs::StreamMessage for Heartbeat {"));
    assert_eq!(code.matches("impl ::pbs::StreamMessage for").count(), 2);
    assert_eq!(code.matches("impl ::proto::Message for").count(), 5);
    assert_eq!(code.matches("const _: fn() = || {").count(), 5);

    let report_close = code.find("self.samples.close();").unwrap();
    let report_errors = code.find("self.errors_ch.close();").unwrap();
    assert!(report_close < report_errors);
}

#[test]
fn test_glued_brace_is_rejected() {
    let err = compile_schema("message M{ }").unwrap_err();
    assert!(
        matches!(&err, ProtoError::ParseError { msg, .. } if msg.contains("expected opening bracket")),
        "expected a ParseError but got {:?}",
        err
    );
}

#[test]
fn test_failed_parse_produces_no_code() {
    let result = compile_schema("message Good { } message Bad { required int32 x = one; }");
    assert!(result.is_err());
}

#[test]
fn test_compile_reader_honours_options() {
    let options = GenOptions { idempotent_close: false };
    let (_, code) = compile_reader(POINT.as_bytes(), &ProtobufProfile::default(), &options)
        .expect("compile_reader failed");
    assert!(!code.contains("close_guard"));
    assert!(code.contains("self.errors_ch.close();"));
}

#[test]
fn test_compile_file_round_trip() {
    let path = std::env::temp_dir().join(format!("protostream-{}.proto", std::process::id()));
    std::fs::write(&path, POINT).expect("write temp schema");

    let result = compile_file(&path, &ProtobufProfile::default(), &GenOptions::default());
    std::fs::remove_file(&path).ok();

    let (_, code) = result.expect("compile_file failed");
    assert_eq!(code, POINT_RUST);
}

#[test]
fn test_compile_missing_file_is_io_error() {
    let err = compile_file(
        Path::new("/definitely/not/here.proto"),
        &ProtobufProfile::default(),
        &GenOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ProtoError::Io(_)), "expected Io but got {:?}", err);
}

#[test]
fn test_ast_serializes_to_json() {
    let schema = parse_schema(POINT).unwrap();
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(json["package"], "demo");
    assert_eq!(json["messages"][0]["name"], "Point");
    assert_eq!(json["messages"][0]["fields"][1]["attribute"], "required");
    assert_eq!(json["messages"][0]["fields"][1]["number"], 2);
}
