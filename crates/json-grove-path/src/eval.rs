//! Tree walker for compiled paths.
//!
//! One depth-first walk serves both tree forms: the [`PathTarget`] trait
//! abstracts the few read operations the walker needs, and is implemented
//! for mutable [`Node`]s and for [`SealedNode`]s. Matches are copies — deep
//! for mutable trees, reference-counted for sealed ones — collected in
//! visitation order.

use tracing::trace;

use json_grove::{Array, Node, NodeKind, SealedNode};

use crate::types::{JsonPath, Step};

/// Bound on walk recursion depth, matching the parser's default nesting
/// bound; descent below it is pruned.
const MAX_WALK_DEPTH: usize = 1024;

/// The read operations the walker needs from a tree.
trait PathTarget: Clone {
    fn kind(&self) -> NodeKind;
    fn member(&self, name: &str) -> Option<&Self>;
    fn element(&self, index: usize) -> Option<&Self>;
    fn element_count(&self) -> usize;
    fn each_member(&self, f: &mut dyn FnMut(&str, &Self));
    fn each_element(&self, f: &mut dyn FnMut(usize, &Self));
}

impl PathTarget for Node {
    fn kind(&self) -> NodeKind {
        Node::kind(self)
    }

    fn member(&self, name: &str) -> Option<&Node> {
        self.as_object().and_then(|object| object.get(name))
    }

    fn element(&self, index: usize) -> Option<&Node> {
        self.as_array().and_then(|array| array.get(index))
    }

    fn element_count(&self) -> usize {
        self.as_array().map_or(0, Array::len)
    }

    fn each_member(&self, f: &mut dyn FnMut(&str, &Node)) {
        if let Some(object) = self.as_object() {
            for (name, child) in object.iter() {
                f(name, child);
            }
        }
    }

    fn each_element(&self, f: &mut dyn FnMut(usize, &Node)) {
        if let Some(array) = self.as_array() {
            for (index, child) in array.iter().enumerate() {
                f(index, child);
            }
        }
    }
}

impl PathTarget for SealedNode {
    fn kind(&self) -> NodeKind {
        SealedNode::kind(self)
    }

    fn member(&self, name: &str) -> Option<&SealedNode> {
        SealedNode::member(self, name)
    }

    fn element(&self, index: usize) -> Option<&SealedNode> {
        SealedNode::element(self, index)
    }

    fn element_count(&self) -> usize {
        self.elements().map_or(0, <[SealedNode]>::len)
    }

    fn each_member(&self, f: &mut dyn FnMut(&str, &SealedNode)) {
        if let Some(members) = self.members() {
            for (name, child) in members {
                f(name, child);
            }
        }
    }

    fn each_element(&self, f: &mut dyn FnMut(usize, &SealedNode)) {
        if let Some(elements) = self.elements() {
            for (index, child) in elements.iter().enumerate() {
                f(index, child);
            }
        }
    }
}

impl JsonPath {
    /// Match against a mutable tree, returning an [`Array`] of deep copies
    /// of every matched node in visitation order.
    pub fn match_node(&self, root: &Node) -> Array {
        let mut results: Vec<Node> = Vec::new();
        walk(&self.steps, root, 0, &mut results);
        trace!(matches = results.len(), "path matched");
        Array::from(results)
    }

    /// Match against a sealed tree. The returned nodes are cheap
    /// reference-counted copies sharing structure with `root`.
    pub fn match_sealed(&self, root: &SealedNode) -> Vec<SealedNode> {
        let mut results: Vec<SealedNode> = Vec::new();
        walk(&self.steps, root, 0, &mut results);
        trace!(matches = results.len(), "path matched");
        results
    }
}

fn emit_or_continue<T: PathTarget>(rest: &[Step], node: &T, depth: usize, results: &mut Vec<T>) {
    if rest.is_empty() {
        results.push(node.clone());
    } else {
        walk(rest, node, depth, results);
    }
}

fn walk<T: PathTarget>(steps: &[Step], node: &T, depth: usize, results: &mut Vec<T>) {
    if depth > MAX_WALK_DEPTH {
        trace!("walk depth limit reached, pruning descent");
        return;
    }
    let (step, rest) = match steps.split_first() {
        Some(split) => split,
        None => return,
    };

    match step {
        Step::Root => emit_or_continue(rest, node, depth, results),

        Step::Member(name) => {
            if let Some(child) = node.member(name) {
                emit_or_continue(rest, child, depth + 1, results);
            }
        }

        Step::Element(index) => {
            // Negative plain indices never match; negative offsets are a
            // set/slice feature.
            if *index >= 0 {
                if let Some(child) = node.element(*index as usize) {
                    emit_or_continue(rest, child, depth + 1, results);
                }
            }
        }

        Step::RecursiveDescent => match node.kind() {
            NodeKind::Object => node.each_member(&mut |name, child| {
                if matches!(rest.first(), Some(Step::Member(wanted)) if wanted == name) {
                    trace!(member = name, "descent entering member");
                    walk(rest, node, depth, results);
                } else {
                    walk(steps, child, depth + 1, results);
                }
            }),
            NodeKind::Array => node.each_element(&mut |index, child| {
                let entered = matches!(
                    rest.first(),
                    Some(Step::Element(wanted)) if *wanted >= 0 && *wanted as usize == index
                );
                if entered {
                    trace!(index, "descent entering element");
                    walk(rest, node, depth, results);
                } else {
                    walk(steps, child, depth + 1, results);
                }
            }),
            _ => {}
        },

        Step::WildcardMember => {
            if node.kind() == NodeKind::Object {
                node.each_member(&mut |_, child| {
                    emit_or_continue(rest, child, depth + 1, results);
                });
            } else {
                // A member wildcard applied to anything else matches the
                // node itself.
                results.push(node.clone());
            }
        }

        Step::WildcardElement => {
            if node.kind() == NodeKind::Array {
                node.each_element(&mut |_, child| {
                    emit_or_continue(rest, child, depth + 1, results);
                });
            } else {
                results.push(node.clone());
            }
        }

        Step::Set(indices) => {
            if node.kind() == NodeKind::Array {
                let len = node.element_count();
                for &raw in indices {
                    if let Some(index) = resolve_index(raw, len) {
                        if let Some(child) = node.element(index) {
                            emit_or_continue(rest, child, depth + 1, results);
                        }
                    }
                }
            }
        }

        Step::Slice { start, end, step } => {
            if node.kind() == NodeKind::Array {
                let len = node.element_count() as i64;
                let step_by = step.unwrap_or(1);
                if step_by >= 1 {
                    let lo = clamp_bound(start.unwrap_or(0), len);
                    let hi = clamp_bound(end.unwrap_or(len), len);
                    let mut index = lo;
                    while index < hi {
                        if let Some(child) = node.element(index as usize) {
                            emit_or_continue(rest, child, depth + 1, results);
                        }
                        index += step_by;
                    }
                }
            }
        }
    }
}

/// Resolve a possibly-negative set index against the array length.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
    if raw < 0 {
        let adjusted = len as i64 + raw;
        if adjusted < 0 {
            None
        } else {
            Some(adjusted as usize)
        }
    } else {
        Some(raw as usize)
    }
}

/// Resolve a slice bound against the array length, clamping to `[0, len]`.
fn clamp_bound(raw: i64, len: i64) -> i64 {
    let resolved = if raw < 0 { len + raw } else { raw };
    resolved.clamp(0, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_index_offsets_from_the_end() {
        assert_eq!(resolve_index(0, 5), Some(0));
        assert_eq!(resolve_index(4, 5), Some(4));
        assert_eq!(resolve_index(-1, 5), Some(4));
        assert_eq!(resolve_index(-5, 5), Some(0));
        assert_eq!(resolve_index(-6, 5), None);
    }

    #[test]
    fn clamp_bound_clamps_to_length() {
        assert_eq!(clamp_bound(3, 5), 3);
        assert_eq!(clamp_bound(9, 5), 5);
        assert_eq!(clamp_bound(-2, 5), 3);
        assert_eq!(clamp_bound(-9, 5), 0);
    }
}
