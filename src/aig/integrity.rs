use std::ops::Deref;

use crate::{Aig, AigEdge, AigError, AigNode, AigNodeRef, Result, StrashKey};

impl Aig {
    /// Checking if the AIG structure is correct.
    /// This function was written for debug purposes, as the library is supposed to maintain
    /// integrity of the AIG at any moment.
    pub fn check_integrity(&self) -> Result<()> {
        // Checking that all nodes have relevant id
        // and perform some individual integrity checks
        for (&id, weak_node) in &self.nodes {
            if let Some(node) = weak_node.upgrade() {
                if node.borrow().get_id() != id {
                    return Err(AigError::InvalidState("incoherent node id".to_string()));
                }

                self.check_node_integrity(node)?;
            }
        }

        // Checking that all outputs are registered as nodes
        for output in &self.outputs {
            let output_id = output.get_node_id();
            if self.get_node(output_id).is_none() {
                return Err(AigError::InvalidState(format!(
                    "output ({}, {}) refers to node {} which is not in the aig",
                    output_id,
                    output.get_complement(),
                    output_id
                )));
            }
        }

        // Checking that the structural hashing table points at gates with the right fanins
        for (key, weak_node) in &self.strash {
            if let Some(node) = weak_node.upgrade() {
                if StrashKey::of_node(node.borrow().deref()) != Some(*key) {
                    return Err(AigError::InvalidState(format!(
                        "strash entry {:?} points at node {} with different fanins",
                        key,
                        node.borrow().get_id()
                    )));
                }
            }
        }

        // Checks for acyclicity
        self.get_topological_sort()?;

        Ok(())
    }

    /// Check the integrity for an individual node, that is:
    /// - check that only `False` have id 0
    /// - check that fanins (`AigEdge`) for and gates are valid too
    ///   (ie they refer to a known node for this AIG)
    /// - check that fanouts are coherent
    fn check_node_integrity(&self, node: AigNodeRef) -> Result<()> {
        match node.borrow().deref() {
            AigNode::False => {
                if node.borrow().get_id() != 0 {
                    return Err(AigError::InvalidState("invalid false node".to_string()));
                }
            }
            AigNode::Input(id) => {
                if *id == 0 {
                    return Err(AigError::IdZeroButNotFalse);
                }
            }
            AigNode::And {
                id,
                fanin0,
                fanin1,
                fanouts,
            } => {
                if *id == 0 {
                    return Err(AigError::IdZeroButNotFalse);
                }
                for (fanout_id, fanout_weak) in fanouts {
                    if let Some(fanout) = fanout_weak.upgrade() {
                        let fanout_id_real = fanout.borrow().get_id();
                        if *fanout_id != fanout_id_real {
                            return Err(AigError::InvalidState(format!(
                                "incoherent fanout node id : {} in map vs {} in reality",
                                fanout_id, fanout_id_real
                            )));
                        }
                        if !self.nodes.contains_key(&fanout_id_real) {
                            return Err(AigError::InvalidState(format!(
                                "fanout {} is no longer in the AIG",
                                fanout_id_real
                            )));
                        }
                        let uses_node = fanout
                            .borrow()
                            .get_fanins()
                            .iter()
                            .any(|fanin| fanin.get_node_id() == *id);
                        if !uses_node {
                            return Err(AigError::InvalidState(format!(
                                "node {} lists {} as fanout but is not one of its fanins",
                                id, fanout_id_real
                            )));
                        }
                    }
                }
                self.check_edge_integrity(fanin0)?;
                self.check_edge_integrity(fanin1)?;
            }
        }
        Ok(())
    }

    fn check_edge_integrity(&self, fanin: &AigEdge) -> Result<()> {
        let id = fanin.get_node_id();
        self.get_node(id).ok_or(AigError::InvalidState(format!(
            "edge pointing at node {} which is not in the AIG anymore",
            id
        )))?;
        Ok(())
    }
}
