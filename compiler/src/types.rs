use serde::Serialize;

/// Root of the parsed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Protobuf {
    pub package:  Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Required,
    Optional,
    Repeated,
}

impl Attribute {
    /// Maps a field qualifier keyword onto its attribute, if it is one.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "required" => Some(Attribute::Required),
            "optional" => Some(Attribute::Optional),
            "repeated" => Some(Attribute::Repeated),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Attribute::Required => "required",
            Attribute::Optional => "optional",
            Attribute::Repeated => "repeated",
        }
    }

    /// Three-letter code used in field metadata tags.
    pub fn code(self) -> &'static str {
        &self.keyword()[..3]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name:      String,
    pub number:    u32,
    pub type_:     String,
    pub attribute: Attribute,
    pub line:      usize,
    pub column:    usize,
}

impl Field {
    pub fn is_repeated(&self) -> bool {
        self.attribute == Attribute::Repeated
    }
}

/// A message definition. Owns its fields and nested messages outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub name:         String,
    pub fields:       Vec<Field>,
    pub sub_messages: Vec<Message>,
    pub line:         usize,
    pub column:       usize,
}

impl Message {
    pub fn repeated_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_repeated())
    }
}
