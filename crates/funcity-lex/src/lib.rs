//! Tokenizer for the FunCity template language.
//!
//! Exposes two tokenize entry points matching the language's two modes:
//! [`tokenize_template`] and [`tokenize_code`]. See [`lexer`] for the
//! implementation and [`token`] for the token vocabulary.

pub mod cursor;
pub mod lexer;
pub mod token;

pub use lexer::{tokenize_code, tokenize_template, TokenizeResult};
pub use token::{Delimiter, EolSource, NumberLiteral, Token, TokenKind};
