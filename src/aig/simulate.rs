//! Bit-parallel simulation of the combinational function of an [`Aig`].
//!
//! Each input receives a vector of 64-bit words, bit `k` of word `w` being the value of
//! the input for pattern `64 * w + k`. Simulating two AIGs on the same patterns is a cheap
//! way of checking that a rewrite preserved their function, and with [`Aig::truth_tables`]
//! it is a complete check for small AIGs.

use std::{collections::HashMap, ops::Deref};

use crate::{Aig, AigEdge, AigError, AigNode, NodeId, Result};

/// Largest number of inputs accepted by [`Aig::truth_tables`].
pub const MAX_EXHAUSTIVE_INPUTS: usize = 16;

/// Truth tables of the first 6 variables within a single word.
const VAR_MASKS: [u64; 6] = [
    0xaaaaaaaaaaaaaaaa,
    0xcccccccccccccccc,
    0xf0f0f0f0f0f0f0f0,
    0xff00ff00ff00ff00,
    0xffff0000ffff0000,
    0xffffffff00000000,
];

fn edge_words(values: &HashMap<NodeId, Vec<u64>>, edge: &AigEdge) -> Result<Vec<u64>> {
    let id = edge.get_node_id();
    let words = values.get(&id).ok_or(AigError::InvalidState(format!(
        "node {} was simulated before its fanin",
        id
    )))?;
    Ok(if edge.get_complement() {
        words.iter().map(|w| !w).collect()
    } else {
        words.clone()
    })
}

/// Pattern words enumerating every assignment of `num_vars` variables, for variable `var`.
fn exhaustive_pattern(var: usize, num_vars: usize) -> Vec<u64> {
    let words = if num_vars <= 6 {
        1
    } else {
        1 << (num_vars - 6)
    };
    (0..words)
        .map(|w: usize| {
            if var < 6 {
                VAR_MASKS[var]
            } else if (w >> (var - 6)) & 1 == 1 {
                u64::MAX
            } else {
                0
            }
        })
        .collect()
}

impl Aig {
    /// Simulates the AIG on the given patterns, one word vector per input (inputs sorted by id).
    /// Returns one word vector per output, in output order.
    pub fn simulate_words(&self, patterns: &[Vec<u64>]) -> Result<Vec<Vec<u64>>> {
        let inputs = self.get_inputs();
        if patterns.len() != inputs.len() {
            return Err(AigError::InvalidPatterns(format!(
                "got {} patterns for {} inputs",
                patterns.len(),
                inputs.len()
            )));
        }
        let num_words = patterns.first().map_or(1, Vec::len);
        if patterns.iter().any(|pattern| pattern.len() != num_words) {
            return Err(AigError::InvalidPatterns(
                "all patterns must have the same number of words".to_string(),
            ));
        }

        let mut values: HashMap<NodeId, Vec<u64>> = HashMap::from([(0, vec![0; num_words])]);
        for (input, pattern) in inputs.iter().zip(patterns) {
            values.insert(input.borrow().get_id(), pattern.clone());
        }

        for node in self.get_topological_sort()? {
            if let AigNode::And {
                id, fanin0, fanin1, ..
            } = node.borrow().deref()
            {
                let w0 = edge_words(&values, fanin0)?;
                let w1 = edge_words(&values, fanin1)?;
                values.insert(*id, w0.iter().zip(&w1).map(|(a, b)| a & b).collect());
            }
        }

        self.outputs
            .iter()
            .map(|output| edge_words(&values, output))
            .collect()
    }

    /// Exhaustively simulates the AIG: returns the truth table of every output,
    /// the variable `i` being the `i`-th input by increasing id.
    ///
    /// With less than 6 inputs, unused high bits of the single word are cleared.
    pub fn truth_tables(&self) -> Result<Vec<Vec<u64>>> {
        let num_vars = self.inputs.len();
        if num_vars > MAX_EXHAUSTIVE_INPUTS {
            return Err(AigError::TooManyInputs {
                got: num_vars,
                max: MAX_EXHAUSTIVE_INPUTS,
            });
        }

        let patterns: Vec<Vec<u64>> = (0..num_vars)
            .map(|var| exhaustive_pattern(var, num_vars))
            .collect();
        let mut tables = self.simulate_words(&patterns)?;
        if num_vars < 6 {
            let mask = (1u64 << (1 << num_vars)) - 1;
            for table in &mut tables {
                for word in table.iter_mut() {
                    *word &= mask;
                }
            }
        }
        Ok(tables)
    }
}
