//! Character cursor for traversing template source text.
//!
//! Maintains position state while iterating through source characters,
//! correctly handling UTF-8 and tracking line/column for diagnostics.

/// A cursor for traversing source text character by character.
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, position: 0, line: 1, column: 1 }
    }

    /// Returns the current character, or `'\0'` at end of source.
    pub fn current_char(&self) -> char {
        self.char_at(0)
    }

    /// Returns the character at the given byte offset from the current
    /// position. More efficient than `peek_char` for small offsets.
    #[inline]
    pub fn char_at(&self, offset: usize) -> char {
        let pos = self.position + offset;
        if pos >= self.source.len() {
            return '\0';
        }
        let b = self.source.as_bytes()[pos];
        if b < 128 {
            return b as char;
        }
        self.source[pos..].chars().next().unwrap_or('\0')
    }

    #[inline]
    pub fn peek_char(&self, offset: usize) -> char {
        self.char_at(offset)
    }

    /// Advances the cursor to the next character, updating line/column.
    /// Does nothing at end of source.
    #[inline]
    pub fn advance(&mut self) {
        if self.position >= self.source.len() {
            return;
        }
        let b = self.source.as_bytes()[self.position];
        if b < 128 {
            self.position += 1;
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b == b'\r' && self.source.as_bytes().get(self.position) != Some(&b'\n') {
                // A lone CR (not part of a CRLF pair) is its own line break.
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            return;
        }
        if let Some(c) = self.source[self.position..].chars().next() {
            self.position += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn advance_n(&mut self, count: usize) {
        for _ in 0..count {
            if self.is_at_end() {
                break;
            }
            self.advance();
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// Returns true and advances past `needle` if the remaining source
    /// starts with it. Used to recognize the `{{` / `}}` delimiters, which
    /// are multi-character.
    pub fn match_str(&mut self, needle: &str) -> bool {
        if self.remaining().starts_with(needle) {
            self.advance_n(needle.chars().count());
            true
        } else {
            false
        }
    }

    /// Skips ASCII space/tab/carriage-return (but not `\n`, which the
    /// tokenizer treats as a significant end-of-line token in code mode).
    pub fn skip_inline_whitespace(&mut self) {
        while matches!(self.current_char(), ' ' | '\t' | '\r') {
            self.advance();
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.position]
    }

    pub fn remaining(&self) -> &'a str {
        &self.source[self.position..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_line_and_column() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance_n(3);
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 1);
    }

    #[test]
    fn match_str_consumes_multi_char_delimiter() {
        let mut cursor = Cursor::new("{{ x }}");
        assert!(cursor.match_str("{{"));
        assert_eq!(cursor.current_char(), ' ');
    }

    #[test]
    fn match_str_does_not_consume_on_mismatch() {
        let mut cursor = Cursor::new("}}");
        assert!(!cursor.match_str("{{"));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn lone_cr_increments_line() {
        let mut cursor = Cursor::new("ab\rcd");
        cursor.advance_n(3);
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 1);
    }

    #[test]
    fn crlf_increments_line_only_once() {
        let mut cursor = Cursor::new("ab\r\ncd");
        cursor.advance_n(4);
        assert_eq!(cursor.line(), 2);
        assert_eq!(cursor.column(), 1);
    }
}
