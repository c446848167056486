//! json-grove — an embeddable JSON document engine.
//!
//! The engine is built from a hand-written scanner, a recursive descent
//! parser with a bounded nesting depth, and a document tree with a one-way
//! mutable→immutable lifecycle: trees are built as plain owned [`Node`]s
//! and then [sealed](Node::seal) into [`SealedNode`]s — `Arc`-shared,
//! deeply immutable, with structural hashes cached per container, safe to
//! share read-only across threads.
//!
//! # Example
//!
//! ```
//! use json_grove::{Node, Parser};
//!
//! let document = Parser::new().parse(r#"{"store": {"open": true}}"#).unwrap();
//! let root = document.root.unwrap();
//! let open = root
//!     .as_object()
//!     .and_then(|o| o.get("store"))
//!     .and_then(Node::as_object)
//!     .and_then(|o| o.get("open"))
//!     .and_then(Node::as_bool);
//! assert_eq!(open, Some(true));
//!
//! // Seal for sharing: hashes are cached, mutation is a compile error.
//! let sealed = root.seal();
//! assert_eq!(sealed.member("store").unwrap().kind(), json_grove::NodeKind::Object);
//! ```
//!
//! Strict mode is plain JSON. Lenient mode additionally accepts `//` and
//! `/* */` comments and the `var NAME = value;` assignment wrapper some web
//! APIs emit:
//!
//! ```
//! use json_grove::Parser;
//!
//! let document = Parser::lenient().parse("var data = [1, 2]; // payload").unwrap();
//! assert_eq!(document.variable_name.as_deref(), Some("data"));
//! ```

pub mod array;
pub mod hash;
pub mod node;
pub mod object;
pub mod parser;
pub mod scanner;
pub mod sealed;
pub mod value;

pub use array::Array;
pub use hash::string_hash;
pub use node::{Node, NodeKind};
pub use object::Object;
pub use parser::{
    Document, ParseError, ParseErrorKind, ParseObserver, ParseOptions, Parser, SealedDocument,
    DEFAULT_MAX_NESTING,
};
pub use scanner::{ScanError, ScanErrorKind, Scanner, Token};
pub use sealed::SealedNode;
pub use value::Value;

/// Parse a strict JSON document with default options.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::new().parse(input)
}

/// Parse a document in lenient mode with default options.
pub fn parse_lenient(input: &str) -> Result<Document, ParseError> {
    Parser::lenient().parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_level_parse_helpers() {
        assert!(parse("[1, 2, 3]").is_ok());
        assert!(parse("var x = 1;").is_err());
        assert!(parse_lenient("var x = 1;").is_ok());
    }
}
