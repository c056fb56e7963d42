//! Template/code tokenization.
//!
//! Two entry points mirror the two tokenizer modes the language defines:
//! [`tokenize_template`] alternates free text with `{{ ... }}` code
//! regions; [`tokenize_code`] treats its whole input as a single code
//! region (used when embedding FunCity as a pure expression language).

use crate::cursor::Cursor;
use crate::token::{Delimiter, EolSource, NumberLiteral, Token, TokenKind};
use funcity_util::{Location, LogEntry, Range, Symbol};
use num_bigint::BigInt;
use num_traits::Num;

/// Output of a tokenize pass: the token stream plus any diagnostics
/// recorded along the way. The tokenizer never fails outright — malformed
/// input becomes a warning/error entry and tokenization continues.
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub log: Vec<LogEntry>,
}

pub fn tokenize_template(source: &str) -> TokenizeResult {
    let mut lexer = Lexer::new(source);
    lexer.run_template();
    TokenizeResult { tokens: lexer.tokens, log: lexer.log }
}

pub fn tokenize_code(source: &str) -> TokenizeResult {
    let mut lexer = Lexer::new(source);
    lexer.run_code();
    TokenizeResult { tokens: lexer.tokens, log: lexer.log }
}

struct Lexer<'a> {
    cursor: Cursor<'a>,
    tokens: Vec<Token>,
    log: Vec<LogEntry>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), tokens: Vec::new(), log: Vec::new() }
    }

    fn loc(&self) -> Location {
        Location::new(self.cursor.line(), self.cursor.column())
    }

    fn run_template(&mut self) {
        loop {
            let text_start = self.cursor.position();
            let text_loc_start = self.loc();
            while !self.cursor.is_at_end() && !self.cursor.remaining().starts_with("{{") {
                if self.cursor.current_char() == '\\'
                    && matches!(self.cursor.peek_char(1), '{' | '}')
                {
                    self.cursor.advance();
                    self.cursor.advance();
                } else {
                    self.cursor.advance();
                }
            }
            if self.cursor.position() > text_start {
                let raw = self.cursor.slice_from(text_start);
                let text = unescape_template_text(raw);
                self.tokens.push(Token::new(
                    TokenKind::Text(text),
                    Range::new(text_loc_start, self.loc()),
                ));
            }

            if self.cursor.is_at_end() {
                return;
            }

            let open_start = self.loc();
            self.cursor.match_str("{{");
            self.tokens.push(Token::new(
                TokenKind::Open(Delimiter::Brace),
                Range::new(open_start, self.loc()),
            ));

            loop {
                if self.cursor.remaining().starts_with("}}") {
                    let close_start = self.loc();
                    self.cursor.match_str("}}");
                    self.tokens.push(Token::new(
                        TokenKind::Close(Delimiter::Brace),
                        Range::new(close_start, self.loc()),
                    ));
                    break;
                }
                if self.cursor.is_at_end() {
                    let here = self.loc();
                    self.log.push(LogEntry::error(
                        "unterminated code region: expected }}",
                        Range::point(here),
                    ));
                    return;
                }
                if let Some(token) = self.next_code_token() {
                    self.tokens.push(token);
                }
            }
        }
    }

    fn run_code(&mut self) {
        while !self.cursor.is_at_end() {
            if let Some(token) = self.next_code_token() {
                self.tokens.push(token);
            }
        }
    }

    /// Scans one token from a code region, or `None` at end of input.
    /// Whitespace, line continuations, comments and unknown runs are
    /// consumed internally without ending the scan.
    fn next_code_token(&mut self) -> Option<Token> {
        loop {
            self.cursor.skip_inline_whitespace();
            if self.cursor.is_at_end() {
                return None;
            }

            // Line continuation: backslash directly followed by a newline.
            if self.cursor.current_char() == '\\' && self.cursor.peek_char(1) == '\n' {
                self.cursor.advance();
                self.cursor.advance();
                continue;
            }

            if self.cursor.current_char() == '/' && self.cursor.peek_char(1) == '/' {
                while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
                    self.cursor.advance();
                }
                continue;
            }

            if !starts_recognized_token(&self.cursor) {
                let start = self.loc();
                self.scan_unknown_run(start);
                continue;
            }

            return Some(self.scan_one_token());
        }
    }

    fn scan_one_token(&mut self) -> Token {
        let start = self.loc();
        let c = self.cursor.current_char();

        if c == '\n' {
            self.cursor.advance();
            return Token::new(
                TokenKind::Eol { source: EolSource::Newline },
                Range::new(start, self.loc()),
            );
        }
        if c == ';' {
            self.cursor.advance();
            return Token::new(
                TokenKind::Eol { source: EolSource::Semicolon },
                Range::new(start, self.loc()),
            );
        }
        if c == '\'' {
            return self.scan_string(start);
        }
        if is_number_start(c, self.cursor.peek_char(1)) {
            return self.scan_number(start);
        }
        if c == '(' {
            self.cursor.advance();
            return Token::new(TokenKind::Open(Delimiter::Paren), Range::new(start, self.loc()));
        }
        if c == '[' {
            self.cursor.advance();
            return Token::new(TokenKind::Open(Delimiter::Bracket), Range::new(start, self.loc()));
        }
        if c == ')' {
            self.cursor.advance();
            return Token::new(TokenKind::Close(Delimiter::Paren), Range::new(start, self.loc()));
        }
        if c == ']' {
            self.cursor.advance();
            return Token::new(TokenKind::Close(Delimiter::Bracket), Range::new(start, self.loc()));
        }
        if c == '?' && self.cursor.peek_char(1) == '.' {
            self.cursor.advance();
            self.cursor.advance();
            return Token::new(TokenKind::Dot { optional: true }, Range::new(start, self.loc()));
        }
        if c == '.' {
            self.cursor.advance();
            return Token::new(TokenKind::Dot { optional: false }, Range::new(start, self.loc()));
        }
        debug_assert!(is_identifier_start(c), "starts_recognized_token admitted an unhandled char");
        self.scan_identifier(start)
    }

    fn scan_string(&mut self, start: Location) -> Token {
        self.cursor.advance(); // opening '
        let mut value = String::new();
        loop {
            if self.cursor.is_at_end() {
                self.log.push(LogEntry::error(
                    "unterminated string literal",
                    Range::new(start, self.loc()),
                ));
                break;
            }
            let c = self.cursor.current_char();
            if c == '\'' {
                self.cursor.advance();
                break;
            }
            if c == '\\' {
                let escape_start = self.loc();
                self.cursor.advance();
                let next = self.cursor.current_char();
                match next {
                    'f' => { value.push('\u{000C}'); self.cursor.advance(); }
                    'n' => { value.push('\n'); self.cursor.advance(); }
                    'r' => { value.push('\r'); self.cursor.advance(); }
                    't' => { value.push('\t'); self.cursor.advance(); }
                    'v' => { value.push('\u{000B}'); self.cursor.advance(); }
                    '0' => { value.push('\0'); self.cursor.advance(); }
                    '\'' => { value.push('\''); self.cursor.advance(); }
                    '\\' => { value.push('\\'); self.cursor.advance(); }
                    other => {
                        self.log.push(LogEntry::error(
                            format!("invalid escape sequence: \\{}", other),
                            Range::new(escape_start, self.loc()),
                        ));
                        value.push('\\');
                        if !self.cursor.is_at_end() {
                            value.push(other);
                            self.cursor.advance();
                        }
                    }
                }
                continue;
            }
            value.push(c);
            self.cursor.advance();
        }
        Token::new(TokenKind::Str(Symbol::intern(&value)), Range::new(start, self.loc()))
    }

    fn scan_number(&mut self, start: Location) -> Token {
        let mut negative = false;
        if self.cursor.current_char() == '+' {
            self.cursor.advance();
        } else if self.cursor.current_char() == '-' {
            negative = true;
            self.cursor.advance();
        }
        let digits_start = self.cursor.position();
        while self.cursor.current_char().is_ascii_digit() {
            self.cursor.advance();
        }
        let mut has_fraction = false;
        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            has_fraction = true;
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                self.cursor.advance();
            }
        }
        let digits = self.cursor.slice_from(digits_start);
        let value = if has_fraction {
            let magnitude: f64 = digits.parse().unwrap_or(0.0);
            NumberLiteral::Float(if negative { -magnitude } else { magnitude })
        } else {
            let magnitude = BigInt::from_str_radix(digits, 10).unwrap_or_default();
            NumberLiteral::Int(if negative { -magnitude } else { magnitude })
        };
        Token::new(TokenKind::Number(value), Range::new(start, self.loc()))
    }

    fn scan_identifier(&mut self, start: Location) -> Token {
        let text_start = self.cursor.position();
        while is_identifier_continue(self.cursor.current_char()) {
            self.cursor.advance();
        }
        let mut name = self.cursor.slice_from(text_start).to_string();
        if self.cursor.current_char() == '?' {
            name.push('?');
            self.cursor.advance();
        }
        Token::new(TokenKind::Identity(Symbol::intern(&name)), Range::new(start, self.loc()))
    }

    /// Consumes a run of unrecognized characters and logs one warning for
    /// it. Never emits a token: the caller's loop continues scanning.
    fn scan_unknown_run(&mut self, start: Location) {
        let text_start = self.cursor.position();
        while !self.cursor.is_at_end() && !starts_recognized_token(&self.cursor) {
            self.cursor.advance();
        }
        if self.cursor.position() == text_start {
            // Never consumed anything (shouldn't happen): force progress.
            self.cursor.advance();
        }
        let range = Range::new(start, self.loc());
        self.log.push(LogEntry::warning("unknown words", range));
    }
}

fn is_number_start(c: char, next: char) -> bool {
    c.is_ascii_digit() || ((c == '+' || c == '-') && next.is_ascii_digit())
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn starts_recognized_token(cursor: &Cursor<'_>) -> bool {
    let c = cursor.current_char();
    if c.is_whitespace() {
        return true;
    }
    match c {
        ';' | '\'' | '(' | '[' | ')' | ']' | '.' => return true,
        '/' if cursor.peek_char(1) == '/' => return true,
        '?' if cursor.peek_char(1) == '.' => return true,
        _ => {}
    }
    if is_number_start(c, cursor.peek_char(1)) {
        return true;
    }
    is_identifier_start(c)
}

/// Resolves the template-text escapes `\{` and `\}`; any other backslash
/// is kept verbatim.
fn unescape_template_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('{') => { out.push('{'); chars.next(); }
                Some('}') => { out.push('}'); chars.next(); }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
