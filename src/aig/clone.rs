use std::ops::Deref;

use crate::{Aig, AigEdge, AigError, AigNode, Result};

impl Aig {
    /// Performs a real recursive clone of the AIG.
    ///
    /// We are not just incrementing reference counters, but instead creating
    /// brand new nodes, completely unrelated with the previous AIG. Ids are preserved,
    /// so the clone compares equal to `self`.
    ///
    /// The strategy is:
    /// - create inputs
    /// - create and gates in topological order
    /// - register outputs
    pub fn deep_clone(&self) -> Result<Self> {
        self.check_integrity()?;

        let mut aig = Aig::new();

        // Adding inputs
        for input in &self.get_inputs() {
            if let AigNode::Input(id) = input.borrow().deref() {
                aig.add_node(AigNode::Input(*id))?;
            } else {
                panic!("Expected input, got node {:?}", input);
            }
        }

        // Adding and gates in topological order
        for node in self.get_topological_sort()? {
            if let AigNode::And {
                id, fanin0, fanin1, ..
            } = node.borrow().deref()
            {
                // Beware, we also must recreate the corresponding fanins
                let i0 = fanin0.get_node_id();
                let new_fanin0 = AigEdge::new(
                    aig.get_node(i0).ok_or(AigError::NodeDoesNotExist(i0))?,
                    fanin0.get_complement(),
                );
                let i1 = fanin1.get_node_id();
                let new_fanin1 = AigEdge::new(
                    aig.get_node(i1).ok_or(AigError::NodeDoesNotExist(i1))?,
                    fanin1.get_complement(),
                );

                aig.add_node(AigNode::and(*id, new_fanin0, new_fanin1))?;
            }
        }

        // Mark outputs
        for output in self.get_outputs() {
            aig.add_output(output.get_node_id(), output.get_complement())?;
        }

        aig.next_id = aig.next_id.max(self.next_id);
        aig.update();
        aig.check_integrity()?;

        Ok(aig)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use crate::Aig;

    #[test]
    fn deep_clone_is_equal_but_unrelated() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let ab = aig.and(a.clone(), !b.clone()).unwrap();
        let abc = aig.and(ab.clone(), c.clone()).unwrap();
        aig.add_output_edge(!abc.clone()).unwrap();
        aig.add_output_edge(ab.clone()).unwrap();
        aig.update();

        let new = aig.deep_clone().unwrap();
        assert_eq!(aig, new);

        let node = aig.get_node(abc.get_node_id()).unwrap();
        let new_node = new.get_node(abc.get_node_id()).unwrap();
        assert!(!Rc::ptr_eq(&node, &new_node));
    }

    #[test]
    fn deep_clone_keeps_fresh_ids_free() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let ab = aig.and(a.clone(), b.clone()).unwrap();
        // Unused gate, released by update but its id was handed out
        let _ = aig.and(!a.clone(), b.clone()).unwrap();
        aig.add_output_edge(ab.clone()).unwrap();
        aig.update();

        let mut new = aig.deep_clone().unwrap();
        let x = new.add_input();
        assert!(x.get_node_id() > ab.get_node_id() + 1);
        // Strash table is rebuilt for the clone
        let a_ = new.get_node(a.get_node_id()).unwrap();
        let b_ = new.get_node(b.get_node_id()).unwrap();
        let ab_ = new
            .and(crate::AigEdge::new(b_, false), crate::AigEdge::new(a_, false))
            .unwrap();
        assert_eq!(ab_.get_node_id(), ab.get_node_id());
    }
}
