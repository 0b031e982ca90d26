use std::io::{BufReader, Bytes, Read};
use std::mem;

use crate::error::ProtoError;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text:   String,
    pub line:   usize,
    pub column: usize,
}

/// Splits a byte stream into tokens on demand.
///
/// A token is a maximal run of bytes outside the delimiter set
/// `{' ', ';', '\n', '\t', '='}`. `;` and `=` are tokens of their own, the other
/// delimiters only separate. Braces are ordinary bytes, so `M{` is one token.
pub struct Tokenizer<R: Read> {
    bytes:    Bytes<BufReader<R>>,
    buffer:   Vec<u8>,
    start:    (usize, usize),
    pending:  Option<Token>,
    line:     usize,
    column:   usize,
    finished: bool,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Tokenizer {
            bytes:    BufReader::new(reader).bytes(),
            buffer:   Vec::new(),
            start:    (1, 1),
            pending:  None,
            line:     1,
            column:   1,
            finished: false,
        }
    }

    /// Line and column of the next unread byte.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    /// Returns the next token, or `Ok(None)` once the stream is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, ProtoError> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }
        if self.finished {
            return Ok(None);
        }

        loop {
            let byte = match self.bytes.next() {
                Some(byte) => byte?,
                None => {
                    self.finished = true;
                    return self.flush();
                }
            };

            let (line, column) = (self.line, self.column);
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }

            match byte {
                b';' | b'=' => {
                    let delimiter = Token {
                        text: char::from(byte).to_string(),
                        line,
                        column,
                    };
                    if self.buffer.is_empty() {
                        return Ok(Some(delimiter));
                    }
                    self.pending = Some(delimiter);
                    return self.flush();
                }
                b' ' | b'\n' | b'\t' => {
                    if !self.buffer.is_empty() {
                        return self.flush();
                    }
                }
                _ => {
                    if self.buffer.is_empty() {
                        self.start = (line, column);
                    }
                    self.buffer.push(byte);
                }
            }
        }
    }

    fn flush(&mut self) -> Result<Option<Token>, ProtoError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let (line, column) = self.start;
        let text = String::from_utf8(mem::take(&mut self.buffer))
            .map_err(|_| ProtoError::InvalidUtf8 { line, column })?;
        Ok(Some(Token { text, line, column }))
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = Result<Token, ProtoError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

/// Tokenizes a whole schema held in memory.
pub fn tokenize_schema(text: &str) -> Result<Vec<Token>, ProtoError> {
    Tokenizer::new(text.as_bytes()).collect()
}
