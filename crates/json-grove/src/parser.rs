//! Recursive descent parser.
//!
//! The parser consumes the scanner's token stream and produces one root
//! node per document. Nesting is counted explicitly and bounded, so a
//! hostile document fails with a nesting error instead of exhausting the
//! stack. Any structural violation aborts the parse immediately with a
//! single structured error; there is no partial tree and no recovery.
//!
//! Strict mode accepts exactly one top-level JSON value. Lenient mode also
//! accepts the `var NAME = value [;]` wrapper emitted by some web APIs and
//! records the bound name, alongside the relaxed lexical grammar (see
//! [`crate::scanner`]).

use thiserror::Error;
use tracing::trace;

use crate::array::Array;
use crate::node::Node;
use crate::object::Object;
use crate::scanner::{ScanError, ScanErrorKind, Scanner, Token};
use crate::sealed::SealedNode;
use crate::value::Value;

/// Default bound on container nesting.
pub const DEFAULT_MAX_NESTING: usize = 1024;

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Strict JSON when true; the lenient superset when false.
    pub strict: bool,
    /// Maximum number of nested containers before the parse is aborted
    /// with [`ParseErrorKind::NestingExceeded`].
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> ParseOptions {
        ParseOptions {
            strict: true,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// Syntactic error kinds. Lexical errors are wrapped unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error(transparent)]
    Lexical(ScanErrorKind),
    #[error("expected a comma")]
    MissingComma,
    #[error("expected a colon")]
    MissingColon,
    #[error("unexpected trailing comma")]
    TrailingComma,
    #[error("expected a string member name")]
    ExpectedMemberName,
    #[error("empty object member name")]
    EmptyMemberName,
    #[error("invalid bareword '{0}'")]
    InvalidBareword(String),
    #[error("maximum nesting depth exceeded")]
    NestingExceeded,
    #[error("only one top-level value is allowed")]
    InvalidStructure,
    #[error("assignments are not allowed in strict mode")]
    InvalidAssignment,
    #[error("input must not be empty")]
    EmptyInput,
    #[error("input must be UTF-8 encoded")]
    InvalidEncoding,
    #[error("unexpected {0}")]
    UnexpectedToken(String),
}

/// A parse failure: one structured error with its 1-based position.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{line}:{column}: parse error: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub column: u32,
}

impl From<ScanError> for ParseError {
    fn from(err: ScanError) -> ParseError {
        ParseError {
            kind: ParseErrorKind::Lexical(err.kind),
            line: err.line,
            column: err.column,
        }
    }
}

/// A successfully parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The root node. `None` only for empty input in lenient mode.
    pub root: Option<Node>,
    /// The name bound by a `var NAME = ...` wrapper, if one was present.
    pub variable_name: Option<String>,
}

impl Document {
    pub fn has_assignment(&self) -> bool {
        self.variable_name.is_some()
    }

    pub fn into_root(self) -> Option<Node> {
        self.root
    }
}

/// A parsed document whose tree was sealed as it completed: the root is
/// deeply immutable with every container hash precomputed.
#[derive(Debug, Clone)]
pub struct SealedDocument {
    pub root: Option<SealedNode>,
    pub variable_name: Option<String>,
}

/// Observer for parse progress.
///
/// All methods default to no-ops; implement the ones you care about. The
/// observer never affects the result tree.
pub trait ParseObserver {
    fn parse_start(&mut self) {}
    fn parse_end(&mut self) {}
    fn object_start(&mut self) {}
    /// A member of the current object has been completed.
    fn object_member(&mut self, _name: &str) {}
    fn object_end(&mut self) {}
    fn array_start(&mut self) {}
    /// An element of the current array has been completed.
    fn array_element(&mut self, _index: usize) {}
    fn array_end(&mut self) {}
}

impl ParseObserver for () {}

/// Recursive descent JSON parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    /// A strict parser with the default nesting bound.
    pub fn new() -> Parser {
        Parser::default()
    }

    /// A lenient parser with the default nesting bound.
    pub fn lenient() -> Parser {
        Parser::with_options(ParseOptions {
            strict: false,
            ..ParseOptions::default()
        })
    }

    pub fn with_options(options: ParseOptions) -> Parser {
        Parser { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse a document from text.
    pub fn parse(&self, input: &str) -> Result<Document, ParseError> {
        self.parse_with_observer(input, &mut ())
    }

    /// Parse a document from bytes. The input must be UTF-8; a UTF-8 BOM
    /// is skipped.
    pub fn parse_bytes(&self, input: &[u8]) -> Result<Document, ParseError> {
        self.parse_bytes_with_observer(input, &mut ())
    }

    /// Parse a document, reporting progress through `observer`.
    pub fn parse_with_observer(
        &self,
        input: &str,
        observer: &mut dyn ParseObserver,
    ) -> Result<Document, ParseError> {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        trace!(bytes = input.len(), strict = self.options.strict, "parsing document");

        let mut session = Session {
            scanner: Scanner::new(input, self.options.strict),
            options: &self.options,
            observer,
        };
        session.parse_document()
    }

    pub fn parse_bytes_with_observer(
        &self,
        input: &[u8],
        observer: &mut dyn ParseObserver,
    ) -> Result<Document, ParseError> {
        let text = std::str::from_utf8(input).map_err(|_| ParseError {
            kind: ParseErrorKind::InvalidEncoding,
            line: 1,
            column: 1,
        })?;
        self.parse_with_observer(text, observer)
    }

    /// Parse a document and seal the tree, so the returned root is deeply
    /// immutable with precomputed hashes.
    pub fn parse_sealed(&self, input: &str) -> Result<SealedDocument, ParseError> {
        let document = self.parse(input)?;
        Ok(SealedDocument {
            root: document.root.map(Node::seal),
            variable_name: document.variable_name,
        })
    }

    /// Byte-input variant of [`Parser::parse_sealed`].
    pub fn parse_bytes_sealed(&self, input: &[u8]) -> Result<SealedDocument, ParseError> {
        let document = self.parse_bytes(input)?;
        Ok(SealedDocument {
            root: document.root.map(Node::seal),
            variable_name: document.variable_name,
        })
    }
}

struct Session<'a, 'o> {
    scanner: Scanner<'a>,
    options: &'a ParseOptions,
    observer: &'o mut dyn ParseObserver,
}

impl Session<'_, '_> {
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            line: self.scanner.line(),
            column: self.scanner.column(),
        }
    }

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        self.observer.parse_start();

        if self.scanner.peek_token()? == Token::Eof {
            // Empty or whitespace-only input.
            if self.options.strict {
                return Err(self.error(ParseErrorKind::EmptyInput));
            }
            self.observer.parse_end();
            return Ok(Document {
                root: None,
                variable_name: None,
            });
        }

        let mut variable_name = None;
        if self.scanner.peek_token()? == Token::Var {
            if self.options.strict {
                return Err(self.error(ParseErrorKind::InvalidAssignment));
            }
            variable_name = Some(self.parse_assignment_prefix()?);
        }

        let root = self.parse_value(0)?;

        // Optional trailing semicolon after an assignment.
        if variable_name.is_some() && self.scanner.peek_token()? == Token::Semicolon {
            self.scanner.next_token()?;
        }

        match self.scanner.peek_token()? {
            Token::Eof => {}
            _ => return Err(self.error(ParseErrorKind::InvalidStructure)),
        }

        self.observer.parse_end();
        Ok(Document {
            root: Some(root),
            variable_name,
        })
    }

    /// Consume `var NAME =`, returning the bound name.
    fn parse_assignment_prefix(&mut self) -> Result<String, ParseError> {
        self.scanner.next_token()?;

        let name = match self.scanner.next_token()? {
            Token::Ident(name) => name,
            token => return Err(self.error(ParseErrorKind::UnexpectedToken(token.to_string()))),
        };
        match self.scanner.next_token()? {
            Token::Assign => {}
            token => return Err(self.error(ParseErrorKind::UnexpectedToken(token.to_string()))),
        }

        trace!(name = %name, "document is an assignment");
        Ok(name)
    }

    fn parse_value(&mut self, depth: usize) -> Result<Node, ParseError> {
        match self.scanner.peek_token()? {
            Token::LeftBrace => self.parse_object(depth),
            Token::LeftBracket => self.parse_array(depth),
            _ => match self.scanner.next_token()? {
                Token::Int(value) => Ok(Node::Value(Value::Int(value))),
                Token::Float(value) => Ok(Node::Value(Value::Float(value))),
                Token::Str(value) => Ok(Node::Value(Value::String(value))),
                Token::True => Ok(Node::Value(Value::Bool(true))),
                Token::False => Ok(Node::Value(Value::Bool(false))),
                Token::Null => Ok(Node::Null),
                Token::Ident(name) => Err(self.error(ParseErrorKind::InvalidBareword(name))),
                Token::Var => Err(self.error(ParseErrorKind::InvalidBareword("var".into()))),
                token => Err(self.error(ParseErrorKind::UnexpectedToken(token.to_string()))),
            },
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth >= self.options.max_nesting {
            return Err(self.error(ParseErrorKind::NestingExceeded));
        }

        self.scanner.next_token()?;
        self.observer.array_start();

        let mut array = Array::new();
        if self.scanner.peek_token()? == Token::RightBracket {
            self.scanner.next_token()?;
            self.observer.array_end();
            return Ok(Node::Array(array));
        }

        loop {
            let element = self.parse_value(depth + 1)?;
            let index = array.len();
            array.push(element);
            trace!(index, "array element completed");
            self.observer.array_element(index);

            match self.scanner.peek_token()? {
                Token::Comma => {
                    self.scanner.next_token()?;
                    if self.scanner.peek_token()? == Token::RightBracket {
                        return Err(self.error(ParseErrorKind::TrailingComma));
                    }
                }
                Token::RightBracket => {
                    self.scanner.next_token()?;
                    break;
                }
                _ => return Err(self.error(ParseErrorKind::MissingComma)),
            }
        }

        self.observer.array_end();
        Ok(Node::Array(array))
    }

    fn parse_object(&mut self, depth: usize) -> Result<Node, ParseError> {
        if depth >= self.options.max_nesting {
            return Err(self.error(ParseErrorKind::NestingExceeded));
        }

        self.scanner.next_token()?;
        self.observer.object_start();

        let mut object = Object::new();
        if self.scanner.peek_token()? == Token::RightBrace {
            self.scanner.next_token()?;
            self.observer.object_end();
            return Ok(Node::Object(object));
        }

        loop {
            let name = match self.scanner.next_token()? {
                Token::Str(name) => name,
                _ => return Err(self.error(ParseErrorKind::ExpectedMemberName)),
            };
            if name.is_empty() {
                return Err(self.error(ParseErrorKind::EmptyMemberName));
            }

            match self.scanner.next_token()? {
                Token::Colon => {}
                _ => return Err(self.error(ParseErrorKind::MissingColon)),
            }

            let value = self.parse_value(depth + 1)?;
            trace!(member = %name, "object member completed");
            object.insert(name.clone(), value);
            self.observer.object_member(&name);

            match self.scanner.peek_token()? {
                Token::Comma => {
                    self.scanner.next_token()?;
                    if self.scanner.peek_token()? == Token::RightBrace {
                        return Err(self.error(ParseErrorKind::TrailingComma));
                    }
                }
                Token::RightBrace => {
                    self.scanner.next_token()?;
                    break;
                }
                _ => return Err(self.error(ParseErrorKind::MissingComma)),
            }
        }

        self.observer.object_end();
        Ok(Node::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Document, ParseError> {
        Parser::new().parse(input)
    }

    fn parse_lenient(input: &str) -> Result<Document, ParseError> {
        Parser::lenient().parse(input)
    }

    fn root(input: &str) -> Node {
        parse(input).unwrap().root.unwrap()
    }

    fn error_kind(input: &str) -> ParseErrorKind {
        parse(input).unwrap_err().kind
    }

    #[test]
    fn scalar_documents() {
        assert_eq!(root("42").as_int(), Some(42));
        assert_eq!(root("4.5").as_float(), Some(4.5));
        assert_eq!(root("\"hi\"").as_str(), Some("hi"));
        assert_eq!(root("true").as_bool(), Some(true));
        assert_eq!(root("false").as_bool(), Some(false));
        assert!(root("null").is_null());
    }

    #[test]
    fn nested_document() {
        let node = root(r#"{"store": {"book": [{"price": 8.95}, {"price": 12.99}]}}"#);
        let book = node
            .as_object()
            .and_then(|o| o.get("store"))
            .and_then(Node::as_object)
            .and_then(|o| o.get("book"))
            .and_then(Node::as_array)
            .unwrap();
        assert_eq!(book.len(), 2);
        assert_eq!(
            book.get(1)
                .and_then(Node::as_object)
                .and_then(|o| o.get("price"))
                .and_then(Node::as_float),
            Some(12.99)
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(root("[]").as_array().map(Array::len), Some(0));
        assert_eq!(root("{}").as_object().map(Object::len), Some(0));
    }

    #[test]
    fn duplicate_members_replace_in_place() {
        let node = root(r#"{"a": 1, "b": 2, "a": 3}"#);
        let object = node.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object.get("a").and_then(Node::as_int), Some(3));
        let keys: Vec<&str> = object.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn parsed_tree_equals_constructed_tree() {
        let parsed = root(r#"{"a": [1, 2.0], "b": null}"#);

        let mut numbers = Array::new();
        numbers.push(1_i64);
        numbers.push(2.0);
        let mut object = Object::new();
        object.insert("a", numbers);
        object.insert("b", Node::null());

        assert_eq!(parsed, Node::Object(object));
    }

    #[test]
    fn trailing_commas_are_rejected() {
        assert_eq!(error_kind("[1,2,]"), ParseErrorKind::TrailingComma);
        assert_eq!(error_kind(r#"{"a":1,}"#), ParseErrorKind::TrailingComma);
        assert_eq!(
            parse_lenient("[1,2,]").unwrap_err().kind,
            ParseErrorKind::TrailingComma
        );
        assert_eq!(
            parse_lenient(r#"{"a":1,}"#).unwrap_err().kind,
            ParseErrorKind::TrailingComma
        );
    }

    #[test]
    fn missing_separators_are_rejected() {
        assert_eq!(error_kind("[1 2]"), ParseErrorKind::MissingComma);
        assert_eq!(error_kind(r#"{"a":1 "b":2}"#), ParseErrorKind::MissingComma);
        assert_eq!(error_kind(r#"{"a" 1}"#), ParseErrorKind::MissingColon);
    }

    #[test]
    fn member_name_errors() {
        assert_eq!(error_kind("{1: 2}"), ParseErrorKind::ExpectedMemberName);
        assert_eq!(error_kind(r#"{"": 1}"#), ParseErrorKind::EmptyMemberName);
    }

    #[test]
    fn unterminated_containers_are_rejected() {
        assert!(parse("[1, 2").is_err());
        assert!(parse(r#"{"a": 1"#).is_err());
    }

    #[test]
    fn barewords_are_rejected() {
        assert_eq!(
            error_kind("[truth]"),
            ParseErrorKind::InvalidBareword("truth".into())
        );
    }

    #[test]
    fn error_positions_point_at_the_problem() {
        let err = parse("{\"a\": 1,\n \"b\" 2}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn lexical_errors_propagate() {
        let err = parse("[01]").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Lexical(ScanErrorKind::LeadingZero));
    }

    #[test]
    fn only_one_top_level_value() {
        assert_eq!(error_kind("{} {}"), ParseErrorKind::InvalidStructure);
        assert_eq!(error_kind("1 2"), ParseErrorKind::InvalidStructure);
        assert_eq!(
            parse_lenient("[] []").unwrap_err().kind,
            ParseErrorKind::InvalidStructure
        );
    }

    #[test]
    fn empty_input_strict_vs_lenient() {
        assert_eq!(error_kind(""), ParseErrorKind::EmptyInput);
        assert_eq!(error_kind("   \n\t "), ParseErrorKind::EmptyInput);

        let document = parse_lenient("  ").unwrap();
        assert!(document.root.is_none());
        assert!(!document.has_assignment());
    }

    #[test]
    fn bom_is_skipped() {
        let input = b"\xef\xbb\xbf{\"a\": 1}";
        let document = Parser::new().parse_bytes(input).unwrap();
        assert!(document.root.is_some());
    }

    #[test]
    fn bom_only_input_is_empty() {
        assert_eq!(
            Parser::new().parse_bytes(b"\xef\xbb\xbf").unwrap_err().kind,
            ParseErrorKind::EmptyInput
        );
    }

    #[test]
    fn non_utf8_input_is_rejected() {
        assert_eq!(
            Parser::new().parse_bytes(b"[\xff]").unwrap_err().kind,
            ParseErrorKind::InvalidEncoding
        );
    }

    #[test]
    fn nesting_bound_is_enforced() {
        let options = ParseOptions {
            strict: true,
            max_nesting: 8,
        };
        let parser = Parser::with_options(options);

        let fits = "[".repeat(8) + &"]".repeat(8);
        assert!(parser.parse(&fits).is_ok());

        let too_deep = "[".repeat(9) + &"]".repeat(9);
        assert_eq!(
            parser.parse(&too_deep).unwrap_err().kind,
            ParseErrorKind::NestingExceeded
        );
    }

    #[test]
    fn deeply_nested_but_valid_documents_parse() {
        let depth = DEFAULT_MAX_NESTING / 2;
        let input = "[".repeat(depth) + &"]".repeat(depth);
        assert!(parse(&input).is_ok());
    }

    #[test]
    fn assignment_is_rejected_in_strict_mode() {
        assert_eq!(
            error_kind("var data = {};"),
            ParseErrorKind::InvalidAssignment
        );
    }

    #[test]
    fn assignment_is_recorded_in_lenient_mode() {
        let document = parse_lenient(r#"var data = {"a": 1};"#).unwrap();
        assert!(document.has_assignment());
        assert_eq!(document.variable_name.as_deref(), Some("data"));
        assert!(document.root.is_some());
    }

    #[test]
    fn assignment_semicolon_is_optional() {
        let document = parse_lenient("var x = [1]").unwrap();
        assert_eq!(document.variable_name.as_deref(), Some("x"));
    }

    #[test]
    fn malformed_assignment_is_rejected() {
        assert!(parse_lenient("var = 1").is_err());
        assert!(parse_lenient("var x 1").is_err());
    }

    #[test]
    fn comments_strict_vs_lenient() {
        assert!(parse("// note\n[1]").is_err());
        let document = parse_lenient("// note\n[1] // done").unwrap();
        assert_eq!(
            document.root.unwrap().as_array().map(Array::len),
            Some(1)
        );
    }

    #[test]
    fn sealed_parse_matches_mutable_parse() {
        let input = r#"{"a": [1, 2, {"b": true}]}"#;
        let mutable = parse(input).unwrap().root.unwrap();
        let sealed = Parser::new().parse_sealed(input).unwrap().root.unwrap();
        assert!(sealed.structural_eq(&mutable));
        assert_eq!(sealed.hash(), mutable.hash());
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ParseObserver for Recorder {
        fn parse_start(&mut self) {
            self.events.push("start".into());
        }
        fn parse_end(&mut self) {
            self.events.push("end".into());
        }
        fn object_start(&mut self) {
            self.events.push("{".into());
        }
        fn object_member(&mut self, name: &str) {
            self.events.push(format!("member {}", name));
        }
        fn object_end(&mut self) {
            self.events.push("}".into());
        }
        fn array_start(&mut self) {
            self.events.push("[".into());
        }
        fn array_element(&mut self, index: usize) {
            self.events.push(format!("element {}", index));
        }
        fn array_end(&mut self) {
            self.events.push("]".into());
        }
    }

    #[test]
    fn observer_sees_events_in_document_order() {
        let mut recorder = Recorder::default();
        Parser::new()
            .parse_with_observer(r#"{"a": [1, 2], "b": null}"#, &mut recorder)
            .unwrap();
        assert_eq!(
            recorder.events,
            vec![
                "start",
                "{",
                "[",
                "element 0",
                "element 1",
                "]",
                "member a",
                "member b",
                "}",
                "end",
            ]
        );
    }

    #[test]
    fn observer_is_not_called_after_errors() {
        let mut recorder = Recorder::default();
        let result = Parser::new().parse_with_observer("[1,]", &mut recorder);
        assert!(result.is_err());
        assert!(!recorder.events.contains(&"end".to_string()));
    }
}
