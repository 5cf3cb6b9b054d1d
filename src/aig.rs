//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To reduce the depth of an AIG, check [`crate::rewriting`] docs.

mod clone;
pub mod edge;
pub mod error;
mod integrity;
pub mod node;
pub mod simulate;
pub mod strash;

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    ops::Deref,
    rc::Rc,
};

use log::trace;

pub use edge::AigEdge;
pub use error::{AigError, Result};
pub(crate) use node::AigNodeWeak;
pub use node::{AigNode, AigNodeRef, NodeId};
pub use strash::StrashKey;

/// A whole AIG.
///
/// Nodes are kept alive artificially to allow rewrites of the structure.
/// Once you are done with rewriting (ie, your AIG should now be in a relevant state), you can
/// call the [`.update()`] method to remove all unused nodes.
///
/// For example, if you just created a node using [`.and(fanin0, fanin1)`], this node isn't used as a fanin to any
/// other node for now. It won't be deleted directly (fortunately!). But if after finishing your rewrite you
/// call [`.update()`] and the node still is not used by any other node, then, it will get deleted.
/// [`.substitute_node(id, edge)`] ends a rewrite and calls [`.update()`] itself.
///
/// [`.update()`]: Aig::update
/// [`.and(fanin0, fanin1)`]: Aig::and
/// [`.substitute_node(id, edge)`]: Aig::substitute_node
///
/// The use of [`Rc`] and [`AigNodeRef`] allows us not to worry about having to drop manually nodes
/// that are no longer used, eg. nodes that were used before by node `A` as their `fanin0`,
/// but `A` is rewritten to use another `fanin0`.
///
/// Note that [`Aig::clone`] will perform a shallow copy of the AIG (the nodes won't be copied).
/// If you want to recursively clone the data structure (ie not incrementing Rc
/// but creating new nodes), use [`Aig::deep_clone`] instead.
#[derive(Debug, Clone)]
pub struct Aig {
    nodes: HashMap<NodeId, AigNodeWeak>,
    /// Inputs must be kept artificially alive as
    /// we don't want to remove them even if the outputs do not depend on them.
    inputs: HashMap<NodeId, AigNodeRef>,
    outputs: Vec<AigEdge>,
    keep_nodes_alive: Vec<AigNodeRef>,
    /// Structural hashing table, see [`StrashKey`].
    strash: HashMap<StrashKey, AigNodeWeak>,
    /// Smallest id which is guaranteed to be free.
    next_id: NodeId,
    // Keep alive node false.
    node_false: AigNodeRef,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Create a brand new AIG (constant node [`AigNode::False`] included).
    pub fn new() -> Self {
        let node_false = Rc::new(RefCell::new(AigNode::False));
        let nodes = HashMap::from([(0, Rc::downgrade(&node_false))]);
        Aig {
            nodes,
            inputs: HashMap::new(),
            outputs: Vec::new(),
            keep_nodes_alive: Vec::new(),
            strash: HashMap::new(),
            next_id: 1,
            node_false,
        }
    }

    /// Retrieves a node from its id.
    pub fn get_node(&self, id: NodeId) -> Option<AigNodeRef> {
        self.nodes.get(&id)?.upgrade()
    }

    /// Call this function when you are done with your rewrite.
    /// All nodes that are not part of the AIG anymore (ie not reachable from an output) will be deleted.
    pub fn update(&mut self) {
        // Stop keeping nodes artificially alive
        self.keep_nodes_alive.clear();

        // Removing no longer valid entries from the nodes
        let before = self.nodes.len();
        self.nodes
            .retain(|_, weak_node| weak_node.upgrade().is_some());
        self.strash.retain(|_, weak_node| weak_node.upgrade().is_some());
        if self.nodes.len() < before {
            trace!("released {} dangling nodes", before - self.nodes.len());
        }
    }

    /// The constant signal.
    pub fn constant(&self, value: bool) -> AigEdge {
        AigEdge::new(self.node_false.clone(), value)
    }

    /// Retrieves inputs reference, sorted by id.
    pub fn get_inputs(&self) -> Vec<AigNodeRef> {
        let mut inputs: Vec<(NodeId, AigNodeRef)> = self
            .inputs
            .iter()
            .map(|(&id, node)| (id, node.clone()))
            .collect();
        inputs.sort_unstable_by_key(|(id, _)| *id);
        inputs.into_iter().map(|(_, node)| node).collect()
    }

    /// Returns true if `id` is a primary input.
    pub fn is_input(&self, id: NodeId) -> bool {
        self.inputs.contains_key(&id)
    }

    /// Retrieves outputs reference.
    pub fn get_outputs(&self) -> Vec<AigEdge> {
        self.outputs.clone()
    }

    fn topological_visit(
        &self,
        node: AigNodeRef,
        sort: &mut Vec<AigNodeRef>,
        seen: &mut HashSet<NodeId>,
        done: &mut HashSet<NodeId>,
    ) -> Result<()> {
        let mut stack: Vec<(AigNodeRef, bool)> = Vec::new();
        stack.push((node, false));

        while let Some((node, last_time)) = stack.pop() {
            let id = node.borrow().get_id();

            // Post order check
            if last_time {
                done.insert(id);
                sort.push(node);
                continue;
            }

            // A node can be pushed by several fanouts before being visited
            if done.contains(&id) {
                continue;
            } else if seen.contains(&id) {
                return Err(AigError::InvalidState("found a cycle".to_string()));
            }

            seen.insert(id);
            stack.push((node.clone(), true));

            for fanin in node.borrow().get_fanins() {
                if !done.contains(&fanin.get_node_id()) {
                    stack.push((fanin.get_node(), false));
                }
            }
        }

        Ok(())
    }

    /// Returns a topological sort of the nodes reachable from the outputs (fanins first),
    /// will error if a cycle is detected.
    pub fn get_topological_sort(&self) -> Result<Vec<AigNodeRef>> {
        let mut sort = Vec::new();
        let mut seen = HashSet::new();
        let mut done = HashSet::new();

        for output in &self.outputs {
            self.topological_visit(output.get_node(), &mut sort, &mut seen, &mut done)?;
        }
        Ok(sort)
    }

    /// Number of and gates reachable from the outputs.
    pub fn gate_count(&self) -> Result<usize> {
        Ok(self
            .get_topological_sort()?
            .iter()
            .filter(|node| node.borrow().is_and())
            .count())
    }

    fn check_valid_node_to_add(&self, node: &AigNode) -> Result<()> {
        match node {
            AigNode::False => Ok(()),
            AigNode::Input(id) => {
                if *id == 0 {
                    Err(AigError::IdZeroButNotFalse)
                } else {
                    Ok(())
                }
            }
            AigNode::And {
                id, fanin0, fanin1, ..
            } => {
                if *id == 0 {
                    Err(AigError::IdZeroButNotFalse)
                } else {
                    let fanin0_id = fanin0.get_node_id();
                    let fanin1_id = fanin1.get_node_id();
                    if self.get_node(fanin0_id).is_none() {
                        Err(AigError::NodeDoesNotExist(fanin0_id))
                    } else if self.get_node(fanin1_id).is_none() {
                        Err(AigError::NodeDoesNotExist(fanin1_id))
                    } else {
                        Ok(())
                    }
                }
            }
        }
    }

    /// Create a new (or retrieve existing) node within the AIG.
    /// This will fail if a different node with the same id already exists in the AIG,
    /// or if a node uses id 0 (reserved for constant node [`AigNode::False`]).
    ///
    /// Unlike [`Aig::and`], no structural hashing is done here: the caller picks the id
    /// and gets exactly the node it asked for.
    ///
    /// ```rust
    /// use algaig::{Aig, AigEdge, AigNode};
    /// let mut aig = Aig::new();
    /// let node_false = aig.add_node(AigNode::False).unwrap();
    /// let i1 = aig.add_node(AigNode::Input(1)).unwrap();
    /// let i1_ = aig.add_node(AigNode::Input(1)).unwrap(); // will simply retrieve the existing node
    /// assert_eq!(i1, i1_);
    ///
    /// let and_gate =
    ///     aig.add_node(AigNode::and(
    ///         2,
    ///         AigEdge::new(i1.clone(), false),
    ///         AigEdge::new(i1.clone(), true)
    ///     )).unwrap(); // represent i1 ^ !i1 so will be false all the time (just an example)
    ///
    /// // Some stuff we cannot do
    /// // Node with id 0
    /// assert!(aig.add_node(AigNode::Input(0)).is_err());
    /// // Id 1 is already taken by an input
    /// assert!(
    ///     aig.add_node(AigNode::and(
    ///         1,
    ///         AigEdge::new(i1.clone(), false),
    ///         AigEdge::new(i1.clone(), false)
    ///     ))
    ///     .is_err()
    /// );
    /// ```
    pub fn add_node(&mut self, node: AigNode) -> Result<AigNodeRef> {
        self.check_valid_node_to_add(&node)?;

        let id = node.get_id();
        match self.get_node(id) {
            // No node with this id, let's create a new one
            None => {
                let n: AigNodeRef = Rc::new(RefCell::new(node));
                self.nodes.insert(id, Rc::downgrade(&n));
                self.keep_nodes_alive.push(n.clone());
                self.next_id = self.next_id.max(id + 1);
                // If the node is an input, we must add it to the map
                // If the node is an and gate, we must register it as a fanout
                match n.borrow().deref() {
                    AigNode::Input(_) => {
                        self.inputs.insert(id, n.clone());
                    }
                    AigNode::And { fanin0, fanin1, .. } => {
                        fanin0
                            .get_node()
                            .borrow_mut()
                            .add_fanout(id, Rc::downgrade(&n));
                        fanin1
                            .get_node()
                            .borrow_mut()
                            .add_fanout(id, Rc::downgrade(&n));
                    }
                    AigNode::False => (),
                };
                self.strash_insert(&n);
                Ok(n)
            }
            // A node was found, maybe it is just the one we're trying to create
            Some(n) => {
                if *n.borrow() == node {
                    Ok(n)
                } else {
                    Err(AigError::DuplicateId(id))
                }
            }
        }
    }

    /// Create a new and node with the given id (or retrieve it if the exact same node already exists).
    pub fn new_and(&mut self, id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigNodeRef> {
        let candidate = AigNode::and(id, fanin0, fanin1);
        self.add_node(candidate)
    }

    /// Create a new primary input with a fresh id.
    pub fn add_input(&mut self) -> AigEdge {
        let node = Rc::new(RefCell::new(AigNode::Input(self.next_id)));
        self.nodes.insert(self.next_id, Rc::downgrade(&node));
        self.inputs.insert(self.next_id, node.clone());
        self.next_id += 1;
        AigEdge::new(node, false)
    }

    /// Returns the signal computing the trivial and of `a` and `b`, if any.
    fn trivial_and(&self, a: &AigEdge, b: &AigEdge) -> Option<AigEdge> {
        if a == b {
            Some(a.clone())
        } else if a.is_complement_of(b) || a.is_cst_false() || b.is_cst_false() {
            Some(self.constant(false))
        } else if a.is_cst_true() {
            Some(b.clone())
        } else if b.is_cst_true() {
            Some(a.clone())
        } else {
            None
        }
    }

    /// Returns a signal computing `fanin0 & fanin1`.
    ///
    /// Trivial cases (`x & x`, `x & !x`, constant fanin) do not create any gate, and
    /// an existing gate with the same fanins (in any order) is reused.
    /// Otherwise a new gate is created with a fresh id, smallest fanin first.
    ///
    /// ```rust
    /// use algaig::Aig;
    /// let mut aig = Aig::new();
    /// let a = aig.add_input();
    /// let b = aig.add_input();
    /// let ab = aig.and(a.clone(), b.clone()).unwrap();
    /// assert_eq!(aig.and(b.clone(), a.clone()).unwrap(), ab);
    /// assert_eq!(aig.and(a.clone(), !a.clone()).unwrap(), aig.constant(false));
    /// ```
    pub fn and(&mut self, fanin0: AigEdge, fanin1: AigEdge) -> Result<AigEdge> {
        if let Some(edge) = self.trivial_and(&fanin0, &fanin1) {
            return Ok(edge);
        }

        let key = StrashKey::new(&fanin0, &fanin1);
        if let Some(node) = self.strash_lookup(&key) {
            return Ok(AigEdge::new(node, false));
        }

        let key0: (NodeId, bool) = (&fanin0).into();
        let key1: (NodeId, bool) = (&fanin1).into();
        let (fanin0, fanin1) = if key0 <= key1 {
            (fanin0, fanin1)
        } else {
            (fanin1, fanin0)
        };
        let node = self.new_and(self.next_id, fanin0, fanin1)?;
        Ok(AigEdge::new(node, false))
    }

    /// Mark an existing node as an output.
    pub fn add_output(&mut self, id: NodeId, complement: bool) -> Result<()> {
        let node = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
        self.outputs.push(AigEdge::new(node, complement));
        Ok(())
    }

    /// Mark a signal as an output.
    pub fn add_output_edge(&mut self, edge: AigEdge) -> Result<()> {
        self.add_output(edge.get_node_id(), edge.get_complement())
    }

    /// Remove a fanin from the outputs. Do not error if node refered by fanin does not exist
    /// or if fanin was not an output, simply returns None instead of the node.
    pub fn remove_output(&mut self, id: NodeId, complement: bool) -> Option<AigNodeRef> {
        let node = self.get_node(id)?;
        let output = AigEdge::new(node.clone(), complement);
        let len_before = self.outputs.len();
        self.outputs.retain(|out| *out != output);
        if self.outputs.len() < len_before {
            Some(node)
        } else {
            None
        }
    }

    /// Replace every use of the and gate `old_id` (by gates and outputs) by the signal `new`.
    ///
    /// The function of the AIG is preserved as long as `new` computes the same function as `old_id`.
    /// A rewired gate may become trivial or structurally equal to an existing gate:
    /// it is then substituted too, so the structural hashing table stays consistent.
    ///
    /// This call ends the rewrite: [`Aig::update`] is called, so nodes that are no longer used
    /// (`old_id` itself included) are released.
    pub fn substitute_node(&mut self, old_id: NodeId, new: AigEdge) -> Result<()> {
        let old = self
            .get_node(old_id)
            .ok_or(AigError::NodeDoesNotExist(old_id))?;
        if !old.borrow().is_and() {
            return Err(AigError::NotAGate(old_id));
        }
        drop(old);

        let mut worklist = vec![(old_id, new)];
        while let Some((old_id, new)) = worklist.pop() {
            // Cascaded substitutions can release a node before its turn comes
            let Some(old) = self.get_node(old_id) else {
                trace!("node {} already released, skipping substitution", old_id);
                continue;
            };

            if new.get_node_id() == old_id {
                if new.get_complement() {
                    return Err(AigError::InvalidState(format!(
                        "trying to substitute node {} by its own complement",
                        old_id
                    )));
                }
                continue;
            }

            let old_key = StrashKey::of_node(old.borrow().deref());
            if let Some(key) = old_key {
                self.strash_remove(&key, old_id);
            }

            // This node might be an output node ie have no fanout but still have an edge going out.
            for output in &mut self.outputs {
                if output.get_node_id() == old_id {
                    *output = new.clone().complement_if(output.complement);
                }
            }

            let fanouts = old.borrow().get_live_fanouts();
            for parent in fanouts {
                let parent_id = parent.borrow().get_id();
                let parent_key = StrashKey::of_node(parent.borrow().deref());
                if let Some(key) = parent_key {
                    self.strash_remove(&key, parent_id);
                }

                parent
                    .borrow_mut()
                    .replace_fanin_node(old_id, &new, Rc::downgrade(&parent))?;

                let fanins = parent.borrow().get_fanins();
                if let Some(edge) = self.trivial_and(&fanins[0], &fanins[1]) {
                    worklist.push((parent_id, edge));
                    continue;
                }
                let key = StrashKey::new(&fanins[0], &fanins[1]);
                match self.strash_lookup(&key) {
                    Some(existing) if existing.borrow().get_id() != parent_id => {
                        worklist.push((parent_id, AigEdge::new(existing, false)));
                    }
                    _ => {
                        self.strash.insert(key, Rc::downgrade(&parent));
                    }
                }
            }
        }

        self.update();
        Ok(())
    }
}

impl PartialEq for Aig {
    /// Compares the two AIGs. They are equal iff:
    /// - their inputs are equal (in terms of set)
    /// - their outputs are equal
    /// - their valid nodes are equal.
    fn eq(&self, other: &Self) -> bool {
        self.outputs == other.outputs
            && self.inputs == other.inputs
            && self
                .nodes
                .iter()
                .filter_map(|(&id, weak)| Some((id, weak.upgrade()?)))
                .collect::<HashMap<NodeId, AigNodeRef>>()
                == other
                    .nodes
                    .iter()
                    .filter_map(|(&id, weak)| Some((id, weak.upgrade()?)))
                    .collect::<HashMap<NodeId, AigNodeRef>>()
    }
}
