//! Lexer (tokenizer) for the jsonmap language.
//!
//! Converts program text into a stream of [`token::Token`]s for the parser.

pub mod token;

use std::path::PathBuf;

use crate::errors::{JsonMapError, JsonMapResult};
use token::{SourceLocation, Token, TokenKind};

/// Lexer for jsonmap program source
pub struct Lexer<'a> {
    /// Source code being lexed
    source: &'a str,
    /// Characters with byte offsets for iteration
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    /// Current position in bytes
    position: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// Start position of current token
    token_start: usize,
    /// Start line of current token
    token_start_line: usize,
    /// Start column of current token
    token_start_column: usize,
    /// File path for error reporting
    file: Option<PathBuf>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given program source
    pub fn new(source: &'a str, file: Option<PathBuf>) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 1,
            column: 1,
            token_start: 0,
            token_start_line: 1,
            token_start_column: 1,
            file,
        }
    }

    /// Get the source code
    pub fn source(&self) -> &str {
        self.source
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> JsonMapResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> JsonMapResult<Token> {
        self.skip_whitespace_and_comments();

        self.token_start = self.position;
        self.token_start_line = self.line;
        self.token_start_column = self.column;

        match self.peek_char() {
            None => Ok(self.make_token(TokenKind::Eof)),
            Some(ch) => match ch {
                // Identifiers and keywords
                'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(),

                // Numbers (JSON grammar, including a leading minus)
                '0'..='9' | '-' => self.lex_number(),

                // Strings
                '"' => self.lex_string(),

                // Punctuation
                '{' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::LeftBrace))
                }
                '}' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::RightBrace))
                }
                '[' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::LeftBracket))
                }
                ']' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::RightBracket))
                }
                '=' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::Eq))
                }
                ':' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::Colon))
                }
                ';' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::Semicolon))
                }
                ',' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::Comma))
                }
                '.' => {
                    self.advance();
                    Ok(self.make_token(TokenKind::Dot))
                }

                // Reference sigils; `&?` and `&!` are single tokens
                '&' => {
                    self.advance();
                    match self.peek_char() {
                        Some('?') => {
                            self.advance();
                            Ok(self.make_token(TokenKind::AnonRef))
                        }
                        Some('!') => {
                            self.advance();
                            Ok(self.make_token(TokenKind::GlobalRef))
                        }
                        _ => Ok(self.make_token(TokenKind::Ref)),
                    }
                }

                _ => {
                    let ch = self.advance().unwrap();
                    Err(self.error_unexpected_char(ch))
                }
            },
        }
    }

    /// Peek at the current character without consuming
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Peek at a character at offset from current position
    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.source[self.position..].chars().nth(offset)
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        if let Some((pos, ch)) = self.chars.next() {
            self.position = pos + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            Some(ch)
        } else {
            None
        }
    }

    /// Skip whitespace and `// ...` line comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_ascii_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char_at(1) == Some('/') => {
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Lex an identifier or keyword
    fn lex_identifier(&mut self) -> JsonMapResult<Token> {
        let start = self.position;

        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.source[start..self.position];

        let kind =
            TokenKind::keyword_from_str(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()));

        Ok(self.make_token(kind))
    }

    /// Lex a number following the JSON grammar: optional minus, integer part,
    /// optional fraction, optional exponent.
    fn lex_number(&mut self) -> JsonMapResult<Token> {
        let start = self.position;

        if self.peek_char() == Some('-') {
            self.advance();
        }

        // Integer part: a lone zero, or a nonzero digit followed by more digits
        match self.peek_char() {
            Some('0') => {
                self.advance();
                if matches!(self.peek_char(), Some('0'..='9')) {
                    return Err(self.error_malformed_number(start, "leading zeros are not allowed"));
                }
            }
            Some('1'..='9') => {
                while matches!(self.peek_char(), Some('0'..='9')) {
                    self.advance();
                }
            }
            _ => {
                return Err(self.error_malformed_number(start, "expected a digit"));
            }
        }

        // Fraction: only consumed when a digit follows the dot, so that
        // `&items.0.name` still lexes the dots as path separators
        if self.peek_char() == Some('.') && matches!(self.peek_char_at(1), Some('0'..='9')) {
            self.advance(); // .
            while matches!(self.peek_char(), Some('0'..='9')) {
                self.advance();
            }
        }

        // Exponent
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let mut lookahead = 1;
            if matches!(self.peek_char_at(1), Some('+' | '-')) {
                lookahead = 2;
            }
            if matches!(self.peek_char_at(lookahead), Some('0'..='9')) {
                self.advance(); // e
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                while matches!(self.peek_char(), Some('0'..='9')) {
                    self.advance();
                }
            }
        }

        let text = &self.source[start..self.position];
        let value: f64 = text
            .parse()
            .map_err(|_| self.error_malformed_number(start, "not a valid JSON number"))?;

        Ok(self.make_token(TokenKind::Number(value)))
    }

    /// Lex a double-quoted string with JSON escapes
    fn lex_string(&mut self) -> JsonMapResult<Token> {
        self.advance(); // opening "

        let mut value = String::new();

        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(JsonMapError::unterminated_string(
                        self.source.to_string(),
                        &self.token_location(),
                    ));
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self.lex_escape_sequence()?;
                    value.push(escaped);
                }
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }

        Ok(self.make_token(TokenKind::String(value)))
    }

    /// Lex a JSON escape sequence (after the backslash)
    fn lex_escape_sequence(&mut self) -> JsonMapResult<char> {
        match self.peek_char() {
            Some('"') => {
                self.advance();
                Ok('"')
            }
            Some('\\') => {
                self.advance();
                Ok('\\')
            }
            Some('/') => {
                self.advance();
                Ok('/')
            }
            Some('n') => {
                self.advance();
                Ok('\n')
            }
            Some('r') => {
                self.advance();
                Ok('\r')
            }
            Some('t') => {
                self.advance();
                Ok('\t')
            }
            Some('b') => {
                self.advance();
                Ok('\u{0008}')
            }
            Some('f') => {
                self.advance();
                Ok('\u{000C}')
            }
            Some('u') => {
                self.advance();
                let code = self.lex_hex_escape()?;
                // Surrogate pairs arrive as two consecutive \uXXXX escapes
                if (0xD800..0xDC00).contains(&code) {
                    if self.peek_char() == Some('\\') && self.peek_char_at(1) == Some('u') {
                        self.advance(); // backslash
                        self.advance(); // u
                        let low = self.lex_hex_escape()?;
                        if (0xDC00..0xE000).contains(&low) {
                            let combined =
                                0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                            if let Some(ch) = char::from_u32(combined) {
                                return Ok(ch);
                            }
                        }
                    }
                    return Err(JsonMapError::invalid_escape_sequence(
                        self.source.to_string(),
                        &self.current_location(),
                        format!("\\u{:04X}", code),
                        "unpaired surrogate in unicode escape",
                    ));
                }
                char::from_u32(code).ok_or_else(|| {
                    JsonMapError::invalid_escape_sequence(
                        self.source.to_string(),
                        &self.current_location(),
                        format!("\\u{:04X}", code),
                        "invalid unicode code point",
                    )
                })
            }
            Some(ch) => {
                let seq = format!("\\{}", ch);
                Err(JsonMapError::invalid_escape_sequence(
                    self.source.to_string(),
                    &self.current_location(),
                    seq.clone(),
                    format!(
                        "'{}' is not a valid escape sequence. Use '\\\\' for a literal backslash",
                        seq
                    ),
                ))
            }
            None => Err(JsonMapError::invalid_escape_sequence(
                self.source.to_string(),
                &self.current_location(),
                "\\<eof>",
                "unexpected end of file in escape sequence",
            )),
        }
    }

    /// Lex exactly four hex digits of a \uXXXX escape
    fn lex_hex_escape(&mut self) -> JsonMapResult<u32> {
        let mut hex = String::new();
        for _ in 0..4 {
            match self.peek_char() {
                Some(ch) if ch.is_ascii_hexdigit() => {
                    hex.push(ch);
                    self.advance();
                }
                _ => {
                    return Err(JsonMapError::invalid_escape_sequence(
                        self.source.to_string(),
                        &self.current_location(),
                        format!("\\u{}", hex),
                        "expected four hex digits after \\u",
                    ));
                }
            }
        }
        // Four hex digits always parse
        Ok(u32::from_str_radix(&hex, 16).unwrap())
    }

    /// Create a token with the current token span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.token_location())
    }

    /// Get the location for the current token
    fn token_location(&self) -> SourceLocation {
        SourceLocation::new(
            self.file.clone(),
            self.token_start_line,
            self.token_start_column,
            self.token_start,
            self.position - self.token_start,
        )
    }

    /// Get the current location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.file.clone(), self.line, self.column, self.position, 1)
    }

    /// Create an unexpected character error
    fn error_unexpected_char(&self, ch: char) -> JsonMapError {
        JsonMapError::unexpected_character(self.source.to_string(), &self.token_location(), ch)
    }

    /// Create a malformed number error spanning from `start`
    fn error_malformed_number(&self, start: usize, help: &str) -> JsonMapError {
        let location = SourceLocation::new(
            self.file.clone(),
            self.token_start_line,
            self.token_start_column,
            start,
            (self.position - start).max(1),
        );
        JsonMapError::malformed_number(
            self.source.to_string(),
            &location,
            &self.source[start..self.position],
            help,
        )
    }
}
