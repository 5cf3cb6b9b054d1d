//! Levels and critical path of a [`Network`].
//!
//! The [`Depth`] trait exposes, for the current state of a network, the level of each node
//! and whether it lies on a critical path. [`DepthView`] wraps any network and implements it.
//!
//! Levels are derived data: once the network is modified, they are stale until
//! [`Depth::update_levels`] is called.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::{Result, network::Network};

/// Depth information about a network.
pub trait Depth: Network {
    /// Length of the longest path from a primary input to `node`.
    fn level(&self, node: Self::Node) -> u32;

    /// True if `node` lies on a path from an input to an output of length [`Depth::depth`].
    fn is_on_critical_path(&self, node: Self::Node) -> bool;

    /// Maximum level among the outputs.
    fn depth(&self) -> u32;

    /// Recomputes levels and critical path for the whole network.
    fn update_levels(&mut self) -> Result<()>;
}

/// Adds levels and critical path information on top of a network.
///
/// ```rust
/// use algaig::{Aig, Depth, DepthView, Network};
/// let mut aig = Aig::new();
/// let a = aig.add_input();
/// let b = aig.add_input();
/// let c = aig.add_input();
/// let ab = aig.and(a.clone(), b).unwrap();
/// let abc = aig.and(ab.clone(), c.clone()).unwrap();
/// aig.add_output_edge(abc).unwrap();
///
/// let view = DepthView::new(&mut aig).unwrap();
/// assert_eq!(view.depth(), 2);
/// assert!(view.is_on_critical_path(ab.get_node_id()));
/// assert!(!view.is_on_critical_path(c.get_node_id()));
/// ```
#[derive(Debug)]
pub struct DepthView<'a, N: Network> {
    ntk: &'a mut N,
    levels: HashMap<N::Node, u32>,
    critical: HashSet<N::Node>,
    depth: u32,
}

impl<'a, N: Network> DepthView<'a, N> {
    /// Wraps the network and computes its levels.
    pub fn new(ntk: &'a mut N) -> Result<Self> {
        let mut view = DepthView {
            ntk,
            levels: HashMap::new(),
            critical: HashSet::new(),
            depth: 0,
        };
        view.update_levels()?;
        Ok(view)
    }

    /// The wrapped network.
    pub fn network(&self) -> &N {
        self.ntk
    }

    /// Level of a node, computed from its fanins if it was created after the last update.
    fn compute_level(&self, node: N::Node) -> u32 {
        if let Some(&level) = self.levels.get(&node) {
            return level;
        }
        if self.ntk.is_ci(node) {
            return 0;
        }
        let (fanin0, fanin1) = self.ntk.fanins(node);
        let level0 = self.compute_level(self.ntk.signal_node(&fanin0));
        let level1 = self.compute_level(self.ntk.signal_node(&fanin1));
        1 + level0.max(level1)
    }
}

impl<N: Network> Depth for DepthView<'_, N> {
    fn level(&self, node: N::Node) -> u32 {
        self.compute_level(node)
    }

    fn is_on_critical_path(&self, node: N::Node) -> bool {
        self.critical.contains(&node)
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    fn update_levels(&mut self) -> Result<()> {
        self.levels.clear();
        self.critical.clear();

        // Gates come fanins first, so fanin levels are always known here
        for gate in self.ntk.gates()? {
            let level = self.compute_level(gate);
            self.levels.insert(gate, level);
        }

        let outputs: Vec<N::Node> = self
            .ntk
            .outputs()
            .iter()
            .map(|output| self.ntk.signal_node(output))
            .collect();
        self.depth = outputs
            .iter()
            .map(|&node| self.compute_level(node))
            .max()
            .unwrap_or(0);

        // Walking back from the deepest outputs, through fanins exactly one level below
        let mut stack: Vec<N::Node> = outputs
            .into_iter()
            .filter(|&node| self.compute_level(node) == self.depth)
            .collect();
        while let Some(node) = stack.pop() {
            if !self.critical.insert(node) || self.ntk.is_ci(node) {
                continue;
            }
            let level = self.compute_level(node);
            let (fanin0, fanin1) = self.ntk.fanins(node);
            for fanin in [fanin0, fanin1] {
                let child = self.ntk.signal_node(&fanin);
                if self.compute_level(child) + 1 == level {
                    stack.push(child);
                }
            }
        }

        trace!(
            "levels updated: depth {}, {} nodes on the critical path",
            self.depth,
            self.critical.len()
        );
        Ok(())
    }
}

impl<N: Network> Network for DepthView<'_, N> {
    type Node = N::Node;
    type Signal = N::Signal;

    fn signal_node(&self, signal: &N::Signal) -> N::Node {
        self.ntk.signal_node(signal)
    }

    fn is_complemented(&self, signal: &N::Signal) -> bool {
        self.ntk.is_complemented(signal)
    }

    fn is_ci(&self, node: N::Node) -> bool {
        self.ntk.is_ci(node)
    }

    fn is_dead(&self, node: N::Node) -> bool {
        self.ntk.is_dead(node)
    }

    fn fanins(&self, node: N::Node) -> (N::Signal, N::Signal) {
        self.ntk.fanins(node)
    }

    fn outputs(&self) -> Vec<N::Signal> {
        self.ntk.outputs()
    }

    fn gates(&self) -> Result<Vec<N::Node>> {
        self.ntk.gates()
    }

    fn create_and(&mut self, a: N::Signal, b: N::Signal) -> Result<N::Signal> {
        self.ntk.create_and(a, b)
    }

    fn substitute_node(&mut self, old: N::Node, new: N::Signal) -> Result<()> {
        self.ntk.substitute_node(old, new)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Aig;

    #[test]
    fn levels_and_critical_path() {
        // out0 = (a & b) & (c & (d & e)), out1 = a & e
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let d = aig.add_input();
        let e = aig.add_input();
        let ab = aig.and(a.clone(), b.clone()).unwrap();
        let de = aig.and(d.clone(), e.clone()).unwrap();
        let cde = aig.and(c.clone(), !de.clone()).unwrap();
        let out0 = aig.and(ab.clone(), cde.clone()).unwrap();
        let out1 = aig.and(a.clone(), e.clone()).unwrap();
        aig.add_output_edge(!out0.clone()).unwrap();
        aig.add_output_edge(out1.clone()).unwrap();

        let view = DepthView::new(&mut aig).unwrap();
        let id = |s: &crate::AigEdge| s.get_node_id();
        assert_eq!(view.depth(), 3);
        assert_eq!(view.level(id(&a)), 0);
        assert_eq!(view.level(id(&ab)), 1);
        assert_eq!(view.level(id(&cde)), 2);
        assert_eq!(view.level(id(&out0)), 3);
        assert_eq!(view.level(id(&out1)), 1);

        for on in [&out0, &cde, &de, &d, &e] {
            assert!(view.is_on_critical_path(id(on)));
        }
        for off in [&ab, &a, &b, &c, &out1] {
            assert!(!view.is_on_critical_path(id(off)));
        }
    }

    #[test]
    fn levels_are_stale_until_updated() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let ab = aig.and(a.clone(), b.clone()).unwrap();
        let abc = aig.and(ab.clone(), c.clone()).unwrap();
        aig.add_output_edge(abc.clone()).unwrap();
        let (ab_id, abc_id) = (ab.get_node_id(), abc.get_node_id());
        drop((ab, abc));

        let mut view = DepthView::new(&mut aig).unwrap();
        assert_eq!(view.depth(), 2);

        // New nodes get a level right away
        let bc = view.create_and(b.clone(), c.clone()).unwrap();
        assert_eq!(view.level(bc.get_node_id()), 1);
        assert!(!view.is_on_critical_path(bc.get_node_id()));

        // a & (b & c) has the same depth, but ab is gone once updated
        let new = view.create_and(a.clone(), bc.clone()).unwrap();
        view.substitute_node(abc_id, new.clone()).unwrap();
        assert_eq!(view.level(abc_id), 2);
        view.update_levels().unwrap();
        assert!(view.is_dead(ab_id));
        assert!(view.is_dead(abc_id));
        assert_eq!(view.depth(), 2);
        assert!(view.is_on_critical_path(new.get_node_id()));
        assert!(view.is_on_critical_path(bc.get_node_id()));
        assert!(!view.is_on_critical_path(a.get_node_id()));
    }

    #[test]
    fn outputs_on_inputs() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        aig.add_output_edge(!a.clone()).unwrap();
        aig.add_output_edge(aig.constant(true)).unwrap();

        let view = DepthView::new(&mut aig).unwrap();
        assert_eq!(view.depth(), 0);
        assert!(view.is_on_critical_path(a.get_node_id()));
        assert!(view.is_on_critical_path(0));
        assert!(view.gates().unwrap().is_empty());
    }
}
