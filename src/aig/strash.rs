//! Structural hashing of and gates.
//!
//! Two and gates are structurally equal when they have the same fanins (node and polarity),
//! in any order. The [`Aig`] keeps a table from [`StrashKey`] to gate so that
//! [`Aig::and`] never creates the same gate twice.

use std::ops::Deref;

use crate::{Aig, AigEdge, AigNode, AigNodeRef, NodeId};

/// Order-independent identity of an and gate: its two fanins as `(id, complement)`,
/// smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrashKey([(NodeId, bool); 2]);

impl StrashKey {
    pub fn new(fanin0: &AigEdge, fanin1: &AigEdge) -> Self {
        let a: (NodeId, bool) = fanin0.into();
        let b: (NodeId, bool) = fanin1.into();
        if a <= b {
            StrashKey([a, b])
        } else {
            StrashKey([b, a])
        }
    }

    /// Returns the key of the given node if it is an and gate.
    pub fn of_node(node: &AigNode) -> Option<Self> {
        match node {
            AigNode::And { fanin0, fanin1, .. } => Some(StrashKey::new(fanin0, fanin1)),
            _ => None,
        }
    }
}

impl Aig {
    /// Looks up a live gate with the given fanins.
    pub(crate) fn strash_lookup(&self, key: &StrashKey) -> Option<AigNodeRef> {
        self.strash.get(key)?.upgrade()
    }

    /// Registers `node` under its key, unless a live gate already owns that key.
    pub(crate) fn strash_insert(&mut self, node: &AigNodeRef) {
        let key = StrashKey::of_node(node.borrow().deref());
        if let Some(key) = key {
            if self.strash_lookup(&key).is_none() {
                self.strash.insert(key, std::rc::Rc::downgrade(node));
            }
        }
    }

    /// Removes the entry of `key` if it currently points at node `id`.
    pub(crate) fn strash_remove(&mut self, key: &StrashKey, id: NodeId) {
        let owned = self
            .strash
            .get(key)
            .and_then(|weak| weak.upgrade())
            .is_some_and(|node| {
                let owner = node.borrow().get_id();
                owner == id
            });
        if owned {
            self.strash.remove(key);
        }
    }
}
