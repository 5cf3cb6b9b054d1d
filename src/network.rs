//! The [`Network`] trait: what a rewriting algorithm needs to know about a logic network.
//!
//! Algorithms of this crate are written once against this trait (and [`crate::depth::Depth`])
//! instead of a concrete graph type. [`Aig`] implements it, with [`NodeId`] as node handle
//! and [`AigEdge`] as signal.

use std::{fmt::Debug, hash::Hash, ops::Deref, ops::Not};

use crate::{Aig, AigEdge, AigNode, NodeId, Result};

/// A network of two-input and gates with complemented edges.
pub trait Network {
    /// A cheap handle on a node, stable for the whole life of the node.
    type Node: Copy + Eq + Hash + Debug;
    /// A node together with a polarity.
    type Signal: Clone + PartialEq + Debug + Not<Output = Self::Signal>;

    /// The node a signal points at.
    fn signal_node(&self, signal: &Self::Signal) -> Self::Node;

    fn is_complemented(&self, signal: &Self::Signal) -> bool;

    /// True for the constant node and primary inputs, ie nodes without fanins.
    fn is_ci(&self, node: Self::Node) -> bool;

    /// True if the node has been released since it was handed out (eg. after a substitution).
    fn is_dead(&self, node: Self::Node) -> bool;

    /// The two fanins of an and gate, in a stable order.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not a live and gate: asking a primary input for its fanins is a bug.
    fn fanins(&self, node: Self::Node) -> (Self::Signal, Self::Signal);

    fn outputs(&self) -> Vec<Self::Signal>;

    /// Snapshot of the live and gates, fanins first.
    fn gates(&self) -> Result<Vec<Self::Node>>;

    /// A signal computing `a & b`, reusing an existing gate when possible.
    fn create_and(&mut self, a: Self::Signal, b: Self::Signal) -> Result<Self::Signal>;

    /// Makes every user of `old` use `new` instead.
    fn substitute_node(&mut self, old: Self::Node, new: Self::Signal) -> Result<()>;
}

impl Network for Aig {
    type Node = NodeId;
    type Signal = AigEdge;

    fn signal_node(&self, signal: &AigEdge) -> NodeId {
        signal.get_node_id()
    }

    fn is_complemented(&self, signal: &AigEdge) -> bool {
        signal.get_complement()
    }

    fn is_ci(&self, node: NodeId) -> bool {
        node == 0 || self.is_input(node)
    }

    fn is_dead(&self, node: NodeId) -> bool {
        self.get_node(node).is_none()
    }

    fn fanins(&self, node: NodeId) -> (AigEdge, AigEdge) {
        let noderef = self
            .get_node(node)
            .unwrap_or_else(|| panic!("fanins requested on node {} which does not exist", node));
        match noderef.borrow().deref() {
            AigNode::And { fanin0, fanin1, .. } => (fanin0.clone(), fanin1.clone()),
            _ => panic!(
                "fanins requested on node {} which is not an and gate",
                node
            ),
        }
    }

    fn outputs(&self) -> Vec<AigEdge> {
        self.get_outputs()
    }

    fn gates(&self) -> Result<Vec<NodeId>> {
        Ok(self
            .get_topological_sort()?
            .iter()
            .filter(|node| node.borrow().is_and())
            .map(|node| node.borrow().get_id())
            .collect())
    }

    fn create_and(&mut self, a: AigEdge, b: AigEdge) -> Result<AigEdge> {
        self.and(a, b)
    }

    fn substitute_node(&mut self, old: NodeId, new: AigEdge) -> Result<()> {
        Aig::substitute_node(self, old, new)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aig_as_network() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let ab = aig.create_and(!a.clone(), b.clone()).unwrap();
        let top = aig.create_and(ab.clone(), a.clone()).unwrap();
        aig.add_output_edge(!top.clone()).unwrap();

        let ab_id = aig.signal_node(&ab);
        assert!(aig.is_ci(0));
        assert!(aig.is_ci(aig.signal_node(&a)));
        assert!(!aig.is_ci(ab_id));
        assert!(aig.is_complemented(&aig.outputs()[0]));
        assert_eq!(aig.fanins(ab_id), (!a.clone(), b.clone()));
        assert_eq!(aig.gates().unwrap(), vec![ab_id, aig.signal_node(&top)]);

        drop((ab, top));
        let zero = aig.constant(false);
        Network::substitute_node(&mut aig, ab_id, zero).unwrap();
        assert!(aig.is_dead(ab_id));
        assert!(aig.gates().unwrap().is_empty());
        assert_eq!(aig.outputs()[0], aig.constant(true));
    }

    #[test]
    #[should_panic]
    fn fanins_of_input() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let _ = aig.fanins(a.get_node_id());
    }
}
