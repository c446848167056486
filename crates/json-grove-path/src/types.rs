//! Compiled path representation.

/// One step of a compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// `$` — the root of the tree.
    Root,
    /// `.name` or `['name']` — a child member of an object.
    Member(String),
    /// `[N]` — a child element of an array. Negative indices never match
    /// here; negative offsets are a set/slice feature.
    Element(i64),
    /// `..` — match the following step at every depth.
    RecursiveDescent,
    /// `.*` or `['*']` — every member of an object.
    WildcardMember,
    /// `[*]` — every element of an array.
    WildcardElement,
    /// `[i,j,...]` — the listed elements; negative indices offset from the
    /// end at match time.
    Set(Vec<i64>),
    /// `[start:end:step]` — a slice of elements; omitted parts default to
    /// `0`, the array length and `1`. Negative bounds offset from the end
    /// at match time.
    Slice {
        start: Option<i64>,
        end: Option<i64>,
        step: Option<i64>,
    },
}

/// A compiled path expression: an ordered list of [`Step`]s.
///
/// Compiled once with [`JsonPath::compile`](crate::JsonPath::compile) and
/// reusable against any number of trees.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pub(crate) steps: Vec<Step>,
}

impl JsonPath {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}
