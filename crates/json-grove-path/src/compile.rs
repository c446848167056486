//! Path expression compiler.
//!
//! Turns an expression like `$.store.book[0,2].title` into the step list
//! of a [`JsonPath`]. Compilation fails on the first structural problem
//! and never produces a partial path.

use thiserror::Error;

use crate::types::{JsonPath, Step};

/// Path compilation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,
    #[error("invalid first character '{0}', expected root '$'")]
    InvalidFirstCharacter(char),
    #[error("only one root node is allowed in a path expression")]
    MultipleRoots,
    #[error("root node followed by invalid character '{0}'")]
    InvalidAfterRoot(char),
    #[error("missing member name or wildcard after '.'")]
    MissingMemberName,
    #[error("unterminated quoted member name")]
    UnterminatedQuote,
    #[error("expected ']' after bracketed member name")]
    ExpectedCloseBracket,
    #[error("invalid array index definition")]
    InvalidIndex,
    #[error("invalid set definition")]
    InvalidSet,
    #[error("invalid slice definition")]
    InvalidSlice,
    #[error("unexpected character '{0}' in path expression")]
    UnexpectedCharacter(char),
}

impl JsonPath {
    /// Compile a path expression.
    ///
    /// The expression must open with the `$` root. The compiled path is
    /// independent of any tree and can be matched any number of times.
    pub fn compile(expression: &str) -> Result<JsonPath, PathError> {
        Compiler::new(expression).compile()
    }
}

struct Compiler<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Compiler<'a> {
    fn new(input: &'a str) -> Compiler<'a> {
        Compiler { input, pos: 0 }
    }

    fn compile(mut self) -> Result<JsonPath, PathError> {
        let first = match self.peek() {
            Some(first) => first,
            None => return Err(PathError::Empty),
        };
        if first != '$' {
            return Err(PathError::InvalidFirstCharacter(first));
        }

        let mut steps = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                '$' => {
                    if !steps.is_empty() {
                        return Err(PathError::MultipleRoots);
                    }
                    self.advance();
                    match self.peek() {
                        None | Some('.') | Some('[') => {}
                        Some(other) => return Err(PathError::InvalidAfterRoot(other)),
                    }
                    steps.push(Step::Root);
                }
                '.' => self.parse_dot(&mut steps)?,
                '[' => self.parse_bracket(&mut steps)?,
                other => return Err(PathError::UnexpectedCharacter(other)),
            }
        }

        Ok(JsonPath { steps })
    }

    fn parse_dot(&mut self, steps: &mut Vec<Step>) -> Result<(), PathError> {
        self.advance();
        if self.peek() == Some('.') {
            self.advance();
            steps.push(Step::RecursiveDescent);
            // The descended-to step follows immediately: a member name,
            // a wildcard, a bracket selector or another descent.
            match self.peek() {
                Some('*') => {
                    self.advance();
                    steps.push(Step::WildcardMember);
                }
                Some('[') | Some('.') => {}
                Some(_) => steps.push(Step::Member(self.member_name()?)),
                None => return Err(PathError::MissingMemberName),
            }
        } else if self.peek() == Some('*') {
            self.advance();
            steps.push(Step::WildcardMember);
        } else {
            steps.push(Step::Member(self.member_name()?));
        }
        Ok(())
    }

    /// A dot-notation member name runs until `.`, `[` or the end of the
    /// expression.
    fn member_name(&mut self) -> Result<String, PathError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '.' || ch == '[' {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            return Err(PathError::MissingMemberName);
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_bracket(&mut self, steps: &mut Vec<Step>) -> Result<(), PathError> {
        self.advance();
        match self.peek() {
            Some('\'') => {
                self.advance();
                let start = self.pos;
                while let Some(ch) = self.peek() {
                    if ch == '\'' {
                        break;
                    }
                    self.advance();
                }
                if self.peek().is_none() {
                    return Err(PathError::UnterminatedQuote);
                }
                let name = self.input[start..self.pos].to_string();
                self.advance();
                if self.peek() != Some(']') {
                    return Err(PathError::ExpectedCloseBracket);
                }
                self.advance();
                if name == "*" {
                    steps.push(Step::WildcardMember);
                } else {
                    steps.push(Step::Member(name));
                }
            }
            Some('*') => {
                self.advance();
                if self.peek() != Some(']') {
                    return Err(PathError::ExpectedCloseBracket);
                }
                self.advance();
                steps.push(Step::WildcardElement);
            }
            Some(':') => {
                self.advance();
                steps.push(self.parse_slice_rest(None)?);
            }
            _ => {
                let first = self.parse_signed().map_err(|_| PathError::InvalidIndex)?;
                match self.peek() {
                    Some(':') => {
                        self.advance();
                        steps.push(self.parse_slice_rest(Some(first))?);
                    }
                    Some(',') => steps.push(self.parse_set_rest(first)?),
                    Some(']') => {
                        self.advance();
                        steps.push(Step::Element(first));
                    }
                    _ => return Err(PathError::InvalidIndex),
                }
            }
        }
        Ok(())
    }

    /// The remainder of a slice, with the cursor just past the first `:`.
    fn parse_slice_rest(&mut self, start: Option<i64>) -> Result<Step, PathError> {
        let end = if self.at_number() {
            Some(self.parse_signed().map_err(|_| PathError::InvalidSlice)?)
        } else {
            None
        };
        let step = if self.peek() == Some(':') {
            self.advance();
            if self.at_number() {
                Some(self.parse_signed().map_err(|_| PathError::InvalidSlice)?)
            } else {
                None
            }
        } else {
            None
        };
        if self.peek() != Some(']') {
            return Err(PathError::InvalidSlice);
        }
        self.advance();
        Ok(Step::Slice { start, end, step })
    }

    /// The remainder of an index set, with the cursor at the first `,`.
    fn parse_set_rest(&mut self, first: i64) -> Result<Step, PathError> {
        let mut indices = vec![first];
        while self.peek() == Some(',') {
            self.advance();
            indices.push(self.parse_signed().map_err(|_| PathError::InvalidSet)?);
        }
        if self.peek() != Some(']') {
            return Err(PathError::InvalidSet);
        }
        self.advance();
        Ok(Step::Set(indices))
    }

    fn at_number(&self) -> bool {
        matches!(self.peek(), Some('-') | Some('0'..='9'))
    }

    fn parse_signed(&mut self) -> Result<i64, ()> {
        let negative = if self.peek() == Some('-') {
            self.advance();
            true
        } else {
            false
        };
        let start = self.pos;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        if self.pos == start {
            return Err(());
        }
        let magnitude: i64 = self.input[start..self.pos].parse().map_err(|_| ())?;
        Ok(if negative { -magnitude } else { magnitude })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }
}
