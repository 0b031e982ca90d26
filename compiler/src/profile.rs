//! Target-library conventions for generated code.
//!
//! The generator decides *what* each message turns into; an [`EmissionProfile`]
//! decides which library paths, channel types and metadata attributes that
//! output is spelled with.

use crate::types::Field;
use crate::utils::rust_string_literal;

pub trait EmissionProfile {
    /// Derives placed on every generated struct.
    fn derives(&self) -> Vec<String>;

    /// Attribute line carrying a member's serialization metadata.
    fn field_tag(&self, field: &Field) -> String;

    /// Trait implemented by top-level streaming types.
    fn stream_capability(&self) -> String;

    /// Trait implemented by every generated type.
    fn message_capability(&self) -> String;

    /// Error type posted on a streaming type's error channel.
    fn error_type(&self) -> String;

    fn channel_type(&self, element: &str) -> String;

    /// Receive-only handle type for a channel of `element`.
    fn receiver_type(&self, element: &str) -> String;

    /// Expression allocating a channel; a capacity of zero is a rendezvous.
    fn new_channel(&self, capacity: usize) -> String;

    /// Expression closing the channel held in `member`.
    fn close_channel(&self, member: &str) -> String;

    /// Expression turning the channel held in `member` into a receive-only handle.
    fn subscribe(&self, member: &str) -> String;

    /// Expression rendering `value` in compact text form.
    fn compact_text(&self, value: &str) -> String;

    /// Body of the message capability impl, one line per entry.
    fn message_impl_body(&self) -> Vec<String> {
        vec![
            "fn proto_message(&self) {}".to_string(),
            String::new(),
            "fn reset(&mut self) {".to_string(),
            "    *self = Self::new();".to_string(),
            "}".to_string(),
        ]
    }
}

/// Renders against a protobuf-style message runtime and a channel-based
/// stream runtime, `::proto` and `::pbs` unless told otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtobufProfile {
    pub message_runtime: String,
    pub stream_runtime:  String,
}

impl Default for ProtobufProfile {
    fn default() -> Self {
        ProtobufProfile {
            message_runtime: "::proto".to_string(),
            stream_runtime:  "::pbs".to_string(),
        }
    }
}

impl ProtobufProfile {
    /// Metadata tag in `type,number,code,name=original` form.
    pub fn tag(field: &Field) -> String {
        format!(
            "{},{},{},name={}",
            field.type_,
            field.number,
            field.attribute.code(),
            field.name
        )
    }
}

impl EmissionProfile for ProtobufProfile {
    fn derives(&self) -> Vec<String> {
        vec!["Debug".to_string(), format!("{}::Tags", self.message_runtime)]
    }

    fn field_tag(&self, field: &Field) -> String {
        format!("#[proto(tag = {})]", rust_string_literal(&Self::tag(field)))
    }

    fn stream_capability(&self) -> String {
        format!("{}::StreamMessage", self.stream_runtime)
    }

    fn message_capability(&self) -> String {
        format!("{}::Message", self.message_runtime)
    }

    fn error_type(&self) -> String {
        format!("{}::Error", self.stream_runtime)
    }

    fn channel_type(&self, element: &str) -> String {
        format!("{}::Channel<{}>", self.stream_runtime, element)
    }

    fn receiver_type(&self, element: &str) -> String {
        format!("{}::Receiver<{}>", self.stream_runtime, element)
    }

    fn new_channel(&self, capacity: usize) -> String {
        format!("{}::Channel::new({})", self.stream_runtime, capacity)
    }

    fn close_channel(&self, member: &str) -> String {
        format!("{}.close()", member)
    }

    fn subscribe(&self, member: &str) -> String {
        format!("{}.receiver()", member)
    }

    fn compact_text(&self, value: &str) -> String {
        format!("{}::compact_text_string({})", self.message_runtime, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;

    fn field(name: &str, type_: &str, number: u32, attribute: Attribute) -> Field {
        Field {
            name: name.to_string(),
            number,
            type_: type_.to_string(),
            attribute,
            line: 1,
            column: 1,
        }
    }

    #[test]
    fn test_tag_uses_type_number_code_and_name() {
        let f = field("userId", "uint64", 7, Attribute::Optional);
        assert_eq!(ProtobufProfile::tag(&f), "uint64,7,opt,name=userId");

        let f = field("items", "Item", 3, Attribute::Repeated);
        assert_eq!(
            ProtobufProfile::default().field_tag(&f),
            "#[proto(tag = \"Item,3,rep,name=items\")]"
        );
    }

    #[test]
    fn test_runtime_paths_are_configurable() {
        let profile = ProtobufProfile {
            message_runtime: "crate::rt".to_string(),
            stream_runtime:  "crate::rt::stream".to_string(),
        };
        assert_eq!(profile.message_capability(), "crate::rt::Message");
        assert_eq!(profile.stream_capability(), "crate::rt::stream::StreamMessage");
        assert_eq!(profile.channel_type("u32"), "crate::rt::stream::Channel<u32>");
        assert_eq!(profile.new_channel(1), "crate::rt::stream::Channel::new(1)");
        assert_eq!(profile.compact_text("self"), "crate::rt::compact_text_string(self)");
    }
}
