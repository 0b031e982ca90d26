use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unexpected end of input at line {line}, column {column}: expected {expected}")]
    UnexpectedEof {
        expected: String,
        line:     usize,
        column:   usize,
    },

    #[error("Invalid UTF-8 in token at line {line}, column {column}")]
    InvalidUtf8 {
        line:   usize,
        column: usize,
    },
}
