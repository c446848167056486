//! Sealed (immutable) trees.
//!
//! Sealing consumes a mutable [`Node`] and produces a [`SealedNode`]: an
//! `Arc`-shared, deeply immutable tree whose container hashes were computed
//! innermost first and cached at seal time. Cloning a sealed node is a
//! shallow, reference-counted copy; the atomic strong count is the only
//! cross-thread primitive, which is what makes a sealed tree safe to share
//! read-only between threads.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::hash::{string_hash, ARRAY_TAG, OBJECT_TAG, VALUE_TAG};
use crate::node::{Node, NodeKind};
use crate::value::Value;

/// An immutable, shareable node.
///
/// There is no way back to the mutable form and no runtime mutability flag
/// to consult: the type itself is the seal.
#[derive(Debug, Clone)]
pub struct SealedNode {
    inner: Arc<Sealed>,
}

#[derive(Debug)]
enum Sealed {
    Null,
    Value(Value),
    Array {
        elements: Vec<SealedNode>,
        hash: u64,
    },
    Object {
        members: IndexMap<String, SealedNode>,
        hash: u64,
    },
}

impl SealedNode {
    /// Seal a mutable tree, consuming it.
    pub fn seal(node: Node) -> SealedNode {
        let inner = match node {
            Node::Null => Sealed::Null,
            Node::Value(v) => Sealed::Value(v),
            Node::Array(array) => {
                let elements: Vec<SealedNode> =
                    array.into_iter().map(SealedNode::seal).collect();
                let mut hash = 0_u64;
                for (index, element) in elements.iter().enumerate() {
                    hash ^= index as u64 ^ element.hash();
                }
                Sealed::Array { elements, hash }
            }
            Node::Object(object) => {
                let members: IndexMap<String, SealedNode> = object
                    .into_members()
                    .into_iter()
                    .map(|(name, node)| (name, SealedNode::seal(node)))
                    .collect();
                let mut hash = 0_u64;
                for (name, value) in &members {
                    hash ^= string_hash(name) ^ value.hash();
                }
                Sealed::Object { members, hash }
            }
        };
        SealedNode {
            inner: Arc::new(inner),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &*self.inner {
            Sealed::Null => NodeKind::Null,
            Sealed::Value(_) => NodeKind::Value,
            Sealed::Array { .. } => NodeKind::Array,
            Sealed::Object { .. } => NodeKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(&*self.inner, Sealed::Null)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match &*self.inner {
            Sealed::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_value().and_then(Value::as_int)
    }

    pub fn as_float(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_float)
    }

    pub fn as_number(&self) -> Option<f64> {
        self.as_value().and_then(Value::as_number)
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_value().and_then(Value::as_bool)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// The elements of an array node.
    pub fn elements(&self) -> Option<&[SealedNode]> {
        match &*self.inner {
            Sealed::Array { elements, .. } => Some(elements),
            _ => None,
        }
    }

    /// Bounds-checked element access on an array node.
    pub fn element(&self, index: usize) -> Option<&SealedNode> {
        self.elements().and_then(|elements| elements.get(index))
    }

    /// The members of an object node, in insertion order.
    pub fn members(&self) -> Option<impl Iterator<Item = (&str, &SealedNode)>> {
        match &*self.inner {
            Sealed::Object { members, .. } => {
                Some(members.iter().map(|(name, node)| (name.as_str(), node)))
            }
            _ => None,
        }
    }

    /// Member lookup on an object node.
    pub fn member(&self, name: &str) -> Option<&SealedNode> {
        match &*self.inner {
            Sealed::Object { members, .. } => members.get(name),
            _ => None,
        }
    }

    /// Structural hash. O(1) for containers: the payload hash was cached
    /// when the tree was sealed.
    pub fn hash(&self) -> u64 {
        match &*self.inner {
            Sealed::Null => 0,
            Sealed::Value(v) => VALUE_TAG ^ v.hash(),
            Sealed::Array { hash, .. } => ARRAY_TAG ^ hash,
            Sealed::Object { hash, .. } => OBJECT_TAG ^ hash,
        }
    }

    /// Structural equality against a mutable tree of the same shape.
    pub fn structural_eq(&self, node: &Node) -> bool {
        match (&*self.inner, node) {
            (Sealed::Null, Node::Null) => true,
            (Sealed::Value(a), Node::Value(b)) => a == b,
            (Sealed::Array { elements, .. }, Node::Array(array)) => {
                elements.len() == array.len()
                    && elements
                        .iter()
                        .zip(array.iter())
                        .all(|(a, b)| a.structural_eq(b))
            }
            (Sealed::Object { members, .. }, Node::Object(object)) => {
                members.len() == object.len()
                    && members
                        .iter()
                        .all(|(name, value)| {
                            object.get(name).is_some_and(|other| value.structural_eq(other))
                        })
            }
            _ => false,
        }
    }
}

impl PartialEq for SealedNode {
    fn eq(&self, other: &SealedNode) -> bool {
        // Identity first, then the cached hashes: differing hashes prove
        // the trees differ without walking them.
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        if self.hash() != other.hash() {
            return false;
        }
        match (&*self.inner, &*other.inner) {
            (Sealed::Null, Sealed::Null) => true,
            (Sealed::Value(a), Sealed::Value(b)) => a == b,
            (Sealed::Array { elements: a, .. }, Sealed::Array { elements: b, .. }) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Sealed::Object { members: a, .. }, Sealed::Object { members: b, .. }) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, value)| b.get(name).is_some_and(|other| value == other))
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::Array;
    use crate::object::Object;

    fn sample() -> Node {
        let mut inner = Array::new();
        inner.push(1_i64);
        inner.push(2_i64);
        let mut object = Object::new();
        object.insert("numbers", inner);
        object.insert("name", "sample");
        Node::Object(object)
    }

    #[test]
    fn sealing_preserves_structure() {
        let node = sample();
        let sealed = node.clone().seal();
        assert!(sealed.structural_eq(&node));
        assert_eq!(sealed.member("name").and_then(|n| n.as_str()), Some("sample"));
        assert_eq!(
            sealed
                .member("numbers")
                .and_then(|n| n.element(1))
                .and_then(|n| n.as_int()),
            Some(2)
        );
        assert!(sealed.element(0).is_none());
    }

    #[test]
    fn sealed_hash_matches_mutable_hash() {
        let node = sample();
        let hash = node.hash();
        let sealed = node.seal();
        assert_eq!(sealed.hash(), hash);
    }

    #[test]
    fn cached_hash_is_stable() {
        let sealed = sample().seal();
        let first = sealed.hash();
        assert_eq!(sealed.hash(), first);
        assert_eq!(sealed.clone().hash(), first);
    }

    #[test]
    fn equal_trees_seal_equal() {
        let a = sample().seal();
        let b = sample().seal();
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn clone_shares_children() {
        let sealed = sample().seal();
        let copy = sealed.clone();
        assert!(Arc::ptr_eq(&sealed.inner, &copy.inner));
    }

    #[test]
    fn member_order_does_not_affect_equality() {
        let mut a = Object::new();
        a.insert("x", 1_i64);
        a.insert("y", 2_i64);
        let mut b = Object::new();
        b.insert("y", 2_i64);
        b.insert("x", 1_i64);
        assert_eq!(a.seal(), b.seal());
    }

    #[test]
    fn sealed_trees_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SealedNode>();
    }
}
