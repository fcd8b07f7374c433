//! Lexical tokens produced by the tokenizer.

use std::fmt;

/// A JSON scalar: the payload of a string, number, boolean or null token.
///
/// Numbers are always decoded as `f64`, whatever their textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Scalar {
    /// Short name of the JSON kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Number(_) => "number",
            Scalar::Bool(_) => "boolean",
            Scalar::Null => "null",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{s:?}"),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Null => f.write_str("null"),
        }
    }
}

/// One lexical token of a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Comma,
    Colon,
    Scalar(Scalar),
    EndOfInput,
}

impl Token {
    /// How the token reads in an error message.
    pub fn describe(&self) -> String {
        match self {
            Token::BeginObject => "`{`".to_string(),
            Token::EndObject => "`}`".to_string(),
            Token::BeginArray => "`[`".to_string(),
            Token::EndArray => "`]`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Scalar(scalar) => format!("{} {scalar}", scalar.kind()),
            Token::EndOfInput => "end of input".to_string(),
        }
    }
}

/// A token together with the 1-based position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}
