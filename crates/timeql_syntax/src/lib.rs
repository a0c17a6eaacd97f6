//! Syntax layer for timeql.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization and string value decoding
//! - `ast`: Abstract syntax tree types for SDL and executable documents
//! - `parser`: Recursive descent parser

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use lexer::{block_string_value, unescape_string, EscapeError, Lexer};
pub use parser::{parse, ParseResult};
pub use token::{Token, TokenKind};
