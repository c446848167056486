//! Tokenizer for JSON text.
//!
//! The scanner turns UTF-8 text into a token stream with one-token
//! lookahead: [`Scanner::peek_token`] computes the next token without
//! consuming it, [`Scanner::next_token`] consumes it. Tokens carry their
//! decoded payloads, so string escapes (including UTF-16 surrogate pairs)
//! are resolved by the time a token is returned.
//!
//! Two grammars are supported. Strict mode is plain JSON. Non-strict mode
//! additionally recognizes `//` line comments, `/* ... */` block comments,
//! bare lowercase identifiers, the `var` keyword and the `=` / `;`
//! punctuation used by assignment wrapping.

use std::fmt;

use thiserror::Error;

/// Lexical error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanErrorKind {
    #[error("unexpected end of input inside a string")]
    UnterminatedString,
    #[error("unexpected end of input inside a comment")]
    UnterminatedComment,
    #[error("malformed \\u escape sequence")]
    MalformedUnicode,
    #[error("malformed UTF-16 surrogate pair")]
    MalformedSurrogatePair,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unescaped control character in string")]
    UnescapedControl,
    #[error("leading zeros are not allowed in numbers")]
    LeadingZero,
    #[error("expected a digit in numeric constant")]
    NonDigitInNumber,
    #[error("digit beyond radix in numeric constant")]
    DigitBeyondRadix,
    #[error("malformed floating point constant")]
    MalformedFloat,
}

/// A lexical error, with the 1-based line and column where it occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub line: u32,
    pub column: u32,
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    Comma,
    Colon,
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,
    /// The `var` keyword (meaningful in non-strict mode only).
    Var,
    /// A bare lowercase identifier.
    Ident(String),
    /// `=`
    Assign,
    /// `;`
    Semicolon,
    /// Any character with no token of its own.
    Unknown(char),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftBrace => f.write_str("'{'"),
            Token::RightBrace => f.write_str("'}'"),
            Token::LeftBracket => f.write_str("'['"),
            Token::RightBracket => f.write_str("']'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Int(_) | Token::Float(_) => f.write_str("number"),
            Token::Str(_) => f.write_str("string"),
            Token::True => f.write_str("'true'"),
            Token::False => f.write_str("'false'"),
            Token::Null => f.write_str("'null'"),
            Token::Var => f.write_str("'var'"),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Assign => f.write_str("'='"),
            Token::Semicolon => f.write_str("';'"),
            Token::Unknown(ch) => write!(f, "character '{}'", ch),
            Token::Eof => f.write_str("end of file"),
        }
    }
}

/// Tokenizer with one-token lookahead.
pub struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    strict: bool,
    peeked: Option<Result<Token, ScanError>>,
    token_line: u32,
    token_column: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a str, strict: bool) -> Scanner<'a> {
        Scanner {
            input,
            pos: 0,
            line: 1,
            column: 0,
            strict,
            peeked: None,
            token_line: 1,
            token_column: 1,
        }
    }

    /// Consume and return the next token, serving a cached peek if present.
    pub fn next_token(&mut self) -> Result<Token, ScanError> {
        match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token(),
        }
    }

    /// Return the next token without consuming it.
    pub fn peek_token(&mut self) -> Result<Token, ScanError> {
        if self.peeked.is_none() {
            let token = self.scan_token();
            self.peeked = Some(token);
        }
        self.peeked.clone().unwrap_or(Ok(Token::Eof))
    }

    /// Line of the most recently scanned token (1-based).
    pub fn line(&self) -> u32 {
        self.token_line
    }

    /// Column of the most recently scanned token (1-based).
    pub fn column(&self) -> u32 {
        self.token_column
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char2(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, kind: ScanErrorKind) -> ScanError {
        ScanError {
            kind,
            line: self.line,
            column: self.column,
        }
    }

    fn scan_token(&mut self) -> Result<Token, ScanError> {
        loop {
            while matches!(self.peek_char(), Some(' ' | '\t' | '\r' | '\n')) {
                self.bump();
            }

            self.token_line = self.line;
            self.token_column = self.column + 1;

            let ch = match self.peek_char() {
                Some(ch) => ch,
                None => return Ok(Token::Eof),
            };

            match ch {
                '{' => {
                    self.bump();
                    return Ok(Token::LeftBrace);
                }
                '}' => {
                    self.bump();
                    return Ok(Token::RightBrace);
                }
                '[' => {
                    self.bump();
                    return Ok(Token::LeftBracket);
                }
                ']' => {
                    self.bump();
                    return Ok(Token::RightBracket);
                }
                ',' => {
                    self.bump();
                    return Ok(Token::Comma);
                }
                ':' => {
                    self.bump();
                    return Ok(Token::Colon);
                }
                '=' => {
                    self.bump();
                    return Ok(Token::Assign);
                }
                ';' => {
                    self.bump();
                    return Ok(Token::Semicolon);
                }
                '"' => return self.scan_string(),
                '-' | '0'..='9' => return self.scan_number(),
                'a'..='z' => return Ok(self.scan_identifier()),
                '/' if !self.strict && self.peek_char2() == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '/' if !self.strict && self.peek_char2() == Some('*') => {
                    self.bump();
                    self.bump();
                    self.skip_block_comment()?;
                }
                other => {
                    self.bump();
                    return Ok(Token::Unknown(other));
                }
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ScanError> {
        loop {
            match self.bump() {
                None => return Err(self.error(ScanErrorKind::UnterminatedComment)),
                Some('*') if self.peek_char() == Some('/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek_char(), Some('a'..='z')) {
            self.bump();
        }
        match &self.input[start..self.pos] {
            "true" => Token::True,
            "false" => Token::False,
            "null" => Token::Null,
            "var" => Token::Var,
            ident => Token::Ident(ident.to_string()),
        }
    }

    fn scan_string(&mut self) -> Result<Token, ScanError> {
        self.bump();
        let mut buf = String::new();
        loop {
            let ch = match self.bump() {
                Some(ch) => ch,
                None => return Err(self.error(ScanErrorKind::UnterminatedString)),
            };
            match ch {
                '"' => return Ok(Token::Str(buf)),
                '\\' => {
                    let escape = match self.bump() {
                        Some(escape) => escape,
                        None => return Err(self.error(ScanErrorKind::UnterminatedString)),
                    };
                    match escape {
                        '"' => buf.push('"'),
                        '\\' => buf.push('\\'),
                        '/' => buf.push('/'),
                        'b' => buf.push('\u{0008}'),
                        'f' => buf.push('\u{000c}'),
                        'n' => buf.push('\n'),
                        'r' => buf.push('\r'),
                        't' => buf.push('\t'),
                        'u' => buf.push(self.scan_unicode_escape()?),
                        _ => return Err(self.error(ScanErrorKind::InvalidEscape)),
                    }
                }
                c if (c as u32) < 0x20 => {
                    return Err(self.error(ScanErrorKind::UnescapedControl))
                }
                c => buf.push(c),
            }
        }
    }

    fn scan_hex4(&mut self) -> Result<u32, ScanError> {
        let mut code = 0_u32;
        for _ in 0..4 {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error(ScanErrorKind::MalformedUnicode))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    /// Decode a `\uXXXX` escape, resolving UTF-16 surrogate pairs for
    /// characters outside the basic multilingual plane.
    fn scan_unicode_escape(&mut self) -> Result<char, ScanError> {
        let first = self.scan_hex4()?;
        if (0xD800..=0xDBFF).contains(&first) {
            // A high surrogate must be immediately followed by a low one.
            if self.peek_char() != Some('\\') {
                return Err(self.error(ScanErrorKind::MalformedSurrogatePair));
            }
            self.bump();
            if self.peek_char() != Some('u') {
                return Err(self.error(ScanErrorKind::MalformedSurrogatePair));
            }
            self.bump();
            let second = self.scan_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(self.error(ScanErrorKind::MalformedSurrogatePair));
            }
            let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
            char::from_u32(combined).ok_or_else(|| self.error(ScanErrorKind::MalformedUnicode))
        } else if (0xDC00..=0xDFFF).contains(&first) {
            Err(self.error(ScanErrorKind::MalformedSurrogatePair))
        } else {
            char::from_u32(first).ok_or_else(|| self.error(ScanErrorKind::MalformedUnicode))
        }
    }

    fn scan_number(&mut self) -> Result<Token, ScanError> {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
            if !matches!(self.peek_char(), Some('0'..='9')) {
                return Err(self.error(ScanErrorKind::NonDigitInNumber));
            }
        }
        let first = match self.bump() {
            Some(first) => first,
            None => return Err(self.error(ScanErrorKind::NonDigitInNumber)),
        };
        if first == '0' && matches!(self.peek_char(), Some('0'..='9')) {
            return Err(self.error(ScanErrorKind::LeadingZero));
        }
        while matches!(self.peek_char(), Some('0'..='9')) {
            self.bump();
        }

        let mut is_float = false;
        if self.peek_char() == Some('.') {
            self.bump();
            if !matches!(self.peek_char(), Some('0'..='9')) {
                return Err(self.error(ScanErrorKind::MalformedFloat));
            }
            is_float = true;
            while matches!(self.peek_char(), Some('0'..='9')) {
                self.bump();
            }
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.bump();
            }
            if !matches!(self.peek_char(), Some('0'..='9')) {
                return Err(self.error(ScanErrorKind::NonDigitInNumber));
            }
            is_float = true;
            while matches!(self.peek_char(), Some('0'..='9')) {
                self.bump();
            }
        }
        if matches!(self.peek_char(), Some(c) if c.is_ascii_alphanumeric()) {
            return Err(self.error(ScanErrorKind::DigitBeyondRadix));
        }

        let text = &self.input[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(ScanErrorKind::MalformedFloat))
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(Token::Int(value)),
                // Magnitude beyond i64: keep the value as a float.
                Err(_) => text
                    .parse::<f64>()
                    .map(Token::Float)
                    .map_err(|_| self.error(ScanErrorKind::NonDigitInNumber)),
            }
        }
    }
}
