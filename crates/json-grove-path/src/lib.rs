//! JSONPath-style queries over [`json_grove`] trees.
//!
//! An expression is compiled once into a [`JsonPath`] and can then be
//! matched against any number of trees, mutable or sealed.
//!
//! # Example
//!
//! ```
//! use json_grove::Parser;
//! use json_grove_path::JsonPath;
//!
//! let document = Parser::new()
//!     .parse(r#"{"store": {"book": [{"author": "X"}, {"author": "Y"}]}}"#)
//!     .unwrap();
//! let root = document.root.unwrap();
//!
//! let path = JsonPath::compile("$.store..author").unwrap();
//! let matches = path.match_node(&root);
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches.get(0).and_then(|n| n.as_str()), Some("X"));
//! assert_eq!(matches.get(1).and_then(|n| n.as_str()), Some("Y"));
//! ```
//!
//! ## Expression syntax
//!
//! * `$` — the root node; must open the expression.
//! * `.name` / `['name']` — a child member.
//! * `[N]` — a child element by index.
//! * `..` — recursive descent: match the following step at every depth.
//! * `.*` / `['*']` — every member; `[*]` — every element.
//! * `[i,j,...]` — an element set; negative indices offset from the end.
//! * `[start:end:step]` — an element slice; each part optional, negative
//!   bounds offset from the end.

mod types;
pub use types::{JsonPath, Step};

mod compile;
pub use compile::PathError;

mod eval;

use json_grove::{Array, Node};

/// Compile `expression` and match it against `root` in one call.
pub fn query(expression: &str, root: &Node) -> Result<Array, PathError> {
    let path = JsonPath::compile(expression)?;
    Ok(path.match_node(root))
}
