use std::io::Read;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::{
    error::ProtoError,
    tokenizer::{Token, Tokenizer},
    types::{Attribute, Field, Message, Protobuf},
    utils::{error, quote},
};

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

const PACKAGE_KEYWORD: &str = "package";
const MESSAGE_KEYWORD: &str = "message";
const LEFT_BRACE:      &str = "{";
const RIGHT_BRACE:     &str = "}";
const EQUALS:          &str = "=";
const SEMICOLON:       &str = ";";

/// Recursive-descent parser over a token stream.
///
/// One token of lookahead is never needed: every decision is made on the token
/// just read. Any grammar violation inside a `package` or `message` aborts the
/// whole parse.
pub struct Parser<I> {
    tokens: I,
    end:    (usize, usize),
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token, ProtoError>>,
{
    pub fn new(tokens: I) -> Self {
        Parser { tokens, end: (1, 1) }
    }

    pub fn parse(mut self) -> Result<Protobuf, ProtoError> {
        let mut schema = Protobuf::default();

        while let Some(tok) = self.next()? {
            match tok.text.as_str() {
                PACKAGE_KEYWORD => {
                    let name = self.require("package name")?;
                    self.expect(SEMICOLON, "expected semicolon after package name")?;
                    if let Some(previous) = &schema.package {
                        debug!(previous = %previous, package = %name.text, "package redeclared");
                    }
                    schema.package = Some(name.text);
                }
                MESSAGE_KEYWORD => {
                    let message = self.parse_message()?;
                    schema.messages.push(message);
                }
                other => {
                    warn!(
                        token = %quote(other),
                        line = tok.line,
                        column = tok.column,
                        "skipping unrecognized top-level token"
                    );
                }
            }
        }

        debug!(
            package = ?schema.package,
            messages = schema.messages.len(),
            "parsed schema"
        );
        Ok(schema)
    }

    fn parse_message(&mut self) -> Result<Message, ProtoError> {
        let name_tok = self.require("message name")?;
        self.expect(LEFT_BRACE, "expected opening bracket after message name")?;

        let mut message = Message {
            name:         name_tok.text,
            fields:       Vec::new(),
            sub_messages: Vec::new(),
            line:         name_tok.line,
            column:       name_tok.column,
        };

        loop {
            let tok = self.require("field, nested message or \"}\"")?;

            if let Some(attribute) = Attribute::from_keyword(&tok.text) {
                let field = self.parse_field(attribute)?;
                message.fields.push(field);
                continue;
            }

            match tok.text.as_str() {
                RIGHT_BRACE => return Ok(message),
                MESSAGE_KEYWORD => {
                    let sub_message = self.parse_message()?;
                    message.sub_messages.push(sub_message);
                }
                other => {
                    return Err(error(
                        &format!("Unrecognized token {} in message {}", quote(other), quote(&message.name)),
                        tok.line,
                        tok.column,
                    ));
                }
            }
        }
    }

    fn parse_field(&mut self, attribute: Attribute) -> Result<Field, ProtoError> {
        let type_tok = self.require("field type")?;
        let name_tok = self.require("field name")?;
        self.expect(EQUALS, "expected equals sign after field name")?;

        let number_tok = self.require("field number")?;
        let number = if INTEGER.is_match(&number_tok.text) {
            number_tok.text.parse::<u32>().ok()
        } else {
            None
        };
        let number = number.ok_or_else(|| {
            error(
                &format!("Invalid field number {}", quote(&number_tok.text)),
                number_tok.line,
                number_tok.column,
            )
        })?;

        self.expect(SEMICOLON, "expected a semicolon after field number")?;

        Ok(Field {
            name:   name_tok.text,
            number,
            type_:  type_tok.text,
            attribute,
            line:   name_tok.line,
            column: name_tok.column,
        })
    }

    fn next(&mut self) -> Result<Option<Token>, ProtoError> {
        let tok = self.tokens.next().transpose()?;
        if let Some(tok) = &tok {
            self.end = (tok.line, tok.column + tok.text.chars().count());
        }
        Ok(tok)
    }

    /// Reads a token that must exist.
    fn require(&mut self, expected: &str) -> Result<Token, ProtoError> {
        match self.next()? {
            Some(tok) => Ok(tok),
            None => Err(ProtoError::UnexpectedEof {
                expected: expected.to_string(),
                line:     self.end.0,
                column:   self.end.1,
            }),
        }
    }

    fn expect(&mut self, literal: &str, msg: &str) -> Result<Token, ProtoError> {
        let tok = self.require(&quote(literal))?;
        if tok.text != literal {
            return Err(error(
                &format!("{}, found {}", msg, quote(&tok.text)),
                tok.line,
                tok.column,
            ));
        }
        Ok(tok)
    }
}

/// Parses a schema held in memory.
pub fn parse_schema(text: &str) -> Result<Protobuf, ProtoError> {
    parse_reader(text.as_bytes())
}

/// Parses a schema straight off a reader, tokenizing lazily.
pub fn parse_reader<R: Read>(reader: R) -> Result<Protobuf, ProtoError> {
    Parser::new(Tokenizer::new(reader)).parse()
}

/// Parses an already tokenized schema.
pub fn parse_tokens(tokens: &[Token]) -> Result<Protobuf, ProtoError> {
    Parser::new(tokens.iter().cloned().map(Ok)).parse()
}
