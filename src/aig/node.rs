use std::{
    cell::RefCell,
    collections::HashMap,
    rc::{Rc, Weak},
};

use super::{AigEdge, AigError, Result};

/// A node id.
///
/// The constant node [`AigNode::False`] has id 0 by convention. Also, id must be unique.
pub type NodeId = u64;

/// An AIG node.
///
/// Each node has an id. By convention, id for constant node `False` is 0. The id must be unique.
///
/// Internal note: gates carry their fanouts with them. Make sure to update this correctly.
#[derive(Debug, Clone)]
pub enum AigNode {
    /// The constant low/false signal.
    False,
    /// A primary input.
    Input(NodeId),
    /// An AND gate with two fanins - also carry their fanouts (update that correctly).
    And {
        id: NodeId,
        fanin0: AigEdge,
        fanin1: AigEdge,
        fanouts: HashMap<NodeId, AigNodeWeak>,
    },
}

/// A wrapper for AIG nodes to allow multiple references to it.
pub type AigNodeRef = Rc<RefCell<AigNode>>;

/// A non-counting reference to an AIG node - used internally.
pub(crate) type AigNodeWeak = Weak<RefCell<AigNode>>;

impl PartialEq for AigNode {
    /// We just compare each field one by one, except [`AigNode::And::fanouts`].
    /// This is the equality which would have been derived if this field did not exist.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AigNode::False, AigNode::False) => true,
            (AigNode::Input(id1), AigNode::Input(id2)) => id1 == id2,
            (
                AigNode::And {
                    id: id1,
                    fanin0: fanin01,
                    fanin1: fanin11,
                    ..
                },
                AigNode::And {
                    id: id2,
                    fanin0: fanin02,
                    fanin1: fanin12,
                    ..
                },
            ) => id1 == id2 && fanin01 == fanin02 && fanin11 == fanin12,
            (_, _) => false,
        }
    }
}

impl Eq for AigNode {}

impl AigNode {
    /// Returns a new and gate (initialize empty fanouts).
    pub fn and(id: NodeId, fanin0: AigEdge, fanin1: AigEdge) -> Self {
        if id == 0 {
            panic!(
                "Hey, you are trying to create an AND gate with id=0. \
                Id=0 is reserved for the constant node AigNode::False."
            )
        }
        AigNode::And {
            id,
            fanin0,
            fanin1,
            fanouts: HashMap::new(),
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self, AigNode::False)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, AigNode::Input(_))
    }

    pub fn is_and(&self) -> bool {
        matches!(self, AigNode::And { .. })
    }

    pub fn get_id(&self) -> NodeId {
        match *self {
            AigNode::False => 0,
            AigNode::Input(id) => id,
            AigNode::And { id, .. } => id,
        }
    }

    /// Returns the fanouts which are still alive, sorted by id.
    /// Constant and inputs do not track their fanouts, so this is empty for them.
    pub fn get_live_fanouts(&self) -> Vec<AigNodeRef> {
        let mut live: Vec<(NodeId, AigNodeRef)> = match self {
            AigNode::And { fanouts, .. } => fanouts
                .iter()
                .filter_map(|(&id, weak)| Some((id, weak.upgrade()?)))
                .collect(),
            _ => Vec::new(),
        };
        live.sort_unstable_by_key(|(id, _)| *id);
        live.into_iter().map(|(_, node)| node).collect()
    }

    /// Okay, what is going on here is a bit subtle.
    /// The core problem is that in practice, the `fanout` is mutably owned by the caller.
    /// The first approach of taking an `AigNodeRef` as an argument, and computing the `NodeId`
    /// by borrowing doesn't work : we are not allowed to borrow!
    /// So we need to supply the id of the fanout to store and be able to identify the fanout,
    /// without borrowing the `AigNodeRef`.
    pub(super) fn add_fanout(&mut self, fanout_id: NodeId, fanout: AigNodeWeak) {
        if let AigNode::And { fanouts, .. } = self {
            fanouts.insert(fanout_id, fanout);
        }
    }

    /// What is going on with fanouts is a bit subtle, check [`AigNode::add_fanout`] for more information.
    fn remove_fanout(&mut self, fanout_id: NodeId) -> Result<()> {
        match self {
            AigNode::And { fanouts, .. } => {
                fanouts.retain(|_, weak| weak.upgrade().is_some());
                if fanouts.remove(&fanout_id).is_some() {
                    Ok(())
                } else {
                    Err(AigError::InvalidState(format!(
                        "failed to remove fanout {} (not found) from node {}",
                        fanout_id,
                        self.get_id()
                    )))
                }
            }
            _ => Ok(()),
        }
    }

    pub fn get_fanins(&self) -> Vec<AigEdge> {
        match self {
            AigNode::And { fanin0, fanin1, .. } => vec![fanin0.clone(), fanin1.clone()],
            _ => vec![],
        }
    }

    /// Makes every fanin pointing at node `old_id` point at `new` instead.
    /// The polarity of the replaced fanin is applied on top of the polarity of `new`.
    ///
    /// This function also updates fanouts of previous and new fanins.
    pub(super) fn replace_fanin_node(
        &mut self,
        old_id: NodeId,
        new: &AigEdge,
        self_weak: AigNodeWeak,
    ) -> Result<()> {
        let self_id = self.get_id();
        match self {
            AigNode::And { fanin0, fanin1, .. } => {
                let mut old_node = None;
                for fanin in [fanin0, fanin1] {
                    if fanin.get_node_id() == old_id {
                        old_node = Some(fanin.get_node());
                        *fanin = new.clone().complement_if(fanin.complement);
                    }
                }
                let old_node = old_node.ok_or(AigError::InvalidState(format!(
                    "node {} does not have fanin {}",
                    self_id, old_id
                )))?;

                old_node.borrow_mut().remove_fanout(self_id)?;
                new.get_node().borrow_mut().add_fanout(self_id, self_weak);
                Ok(())
            }
            _ => Err(AigError::NotAGate(self_id)),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use crate::{AigEdge, AigNode};

    #[test]
    #[should_panic]
    fn add_node_test_invalid_and_id0() {
        let nf = Rc::new(RefCell::new(AigNode::False));
        let _ = AigNode::and(0, AigEdge::new(nf.clone(), false), AigEdge::new(nf, false));
    }

    #[test]
    fn node_kinds() {
        let nf = Rc::new(RefCell::new(AigNode::False));
        let i1 = Rc::new(RefCell::new(AigNode::Input(1)));
        let a2 = AigNode::and(2, AigEdge::new(nf.clone(), true), AigEdge::new(i1.clone(), false));

        assert!(nf.borrow().is_false());
        assert!(i1.borrow().is_input());
        assert!(a2.is_and());
        assert_eq!(a2.get_id(), 2);
        assert_eq!(a2.get_fanins().len(), 2);
        assert!(i1.borrow().get_fanins().is_empty());
        assert!(i1.borrow().get_live_fanouts().is_empty());
        assert!(a2.get_live_fanouts().is_empty());
    }
}
