//! Depth-oriented algebraic rewriting.
//!
//! [`AlgebraicRewriter`] scans every gate of a [`Depth`] network and applies the first
//! [`Rule`] matching it, refreshing levels after each rewrite. Scans are repeated until
//! one of them rewrites nothing. Every rule strictly lowers the level of the node it
//! replaces, so the critical depth never increases and the network keeps its function.
//!
//! ```rust
//! use algaig::{Aig, optimize_depth};
//!
//! // ((((a & b) & c) & d) & e) has depth 4
//! let mut aig = Aig::new();
//! let mut acc = aig.add_input();
//! for _ in 0..4 {
//!     let x = aig.add_input();
//!     acc = aig.and(acc, x).unwrap();
//! }
//! aig.add_output_edge(acc).unwrap();
//! let before = aig.truth_tables().unwrap();
//!
//! let stats = optimize_depth(&mut aig).unwrap();
//! assert!(stats.converged);
//! assert_eq!(stats.depth_before, 4);
//! assert_eq!(stats.depth_after, 3);
//! assert_eq!(aig.truth_tables().unwrap(), before);
//! ```

pub mod rules;

use std::fmt;

use log::{debug, info, trace, warn};

use crate::{
    Result,
    depth::{Depth, DepthView},
    network::Network,
};
pub use rules::{Rewrite, Rule, find_rewrite, match_rule};

/// Parameters of the rewriting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteParams {
    /// Maximum number of scans over the network. `None` runs until nothing changes.
    pub max_passes: Option<usize>,
}

/// What a rewriting pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewriteStats {
    /// Number of scans over the network, including the last one which rewrote nothing.
    pub passes: usize,
    /// Rewrites performed with [`Rule::Associativity`].
    pub associativity: usize,
    /// Rewrites performed with [`Rule::DistributivityOr`].
    pub distributivity_or: usize,
    /// Rewrites performed with [`Rule::DistributivityAnd`].
    pub distributivity_and: usize,
    /// Rewrites performed with [`Rule::ThreeLevelDistributivity`].
    pub three_level: usize,
    /// Critical depth when the pass started.
    pub depth_before: u32,
    /// Critical depth when the pass ended.
    pub depth_after: u32,
    /// Live gates reachable from the outputs when the pass started.
    pub gates_before: usize,
    /// Live gates reachable from the outputs when the pass ended.
    pub gates_after: usize,
    /// False if the pass stopped on `max_passes` while it was still rewriting.
    pub converged: bool,
}

impl RewriteStats {
    pub fn total_rewrites(&self) -> usize {
        self.associativity + self.distributivity_or + self.distributivity_and + self.three_level
    }

    pub fn depth_reduction(&self) -> u32 {
        self.depth_before.saturating_sub(self.depth_after)
    }

    /// Number of rewrites performed with `rule`.
    pub fn count(&self, rule: Rule) -> usize {
        match rule {
            Rule::Associativity => self.associativity,
            Rule::DistributivityOr => self.distributivity_or,
            Rule::DistributivityAnd => self.distributivity_and,
            Rule::ThreeLevelDistributivity => self.three_level,
        }
    }

    fn record(&mut self, rule: Rule) {
        match rule {
            Rule::Associativity => self.associativity += 1,
            Rule::DistributivityOr => self.distributivity_or += 1,
            Rule::DistributivityAnd => self.distributivity_and += 1,
            Rule::ThreeLevelDistributivity => self.three_level += 1,
        }
    }
}

impl fmt::Display for RewriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth {} -> {}, gates {} -> {}, {} rewrites (A {}, B {}, C {}, D {}) in {} passes",
            self.depth_before,
            self.depth_after,
            self.gates_before,
            self.gates_after,
            self.total_rewrites(),
            self.associativity,
            self.distributivity_or,
            self.distributivity_and,
            self.three_level,
            self.passes
        )?;
        if !self.converged {
            write!(f, " (not converged)")?;
        }
        Ok(())
    }
}

/// Runs the algebraic rules on a network until a fixpoint is reached.
#[derive(Debug)]
pub struct AlgebraicRewriter<'a, N: Depth> {
    ntk: &'a mut N,
    params: RewriteParams,
}

impl<'a, N: Depth> AlgebraicRewriter<'a, N> {
    pub fn new(ntk: &'a mut N, params: RewriteParams) -> Self {
        AlgebraicRewriter { ntk, params }
    }

    /// Tries every rule on `n`, applying the first one that matches.
    fn rewrite_node(&mut self, n: N::Node) -> Result<Option<Rule>> {
        let Some(rewrite) = find_rewrite(&*self.ntk, n) else {
            return Ok(None);
        };
        let rule = rewrite.rule();
        let level = self.ntk.level(n);
        let new = rewrite.build(&mut *self.ntk)?;
        debug!(
            "{} on node {:?} (level {}), replaced by {:?} (level {})",
            rule,
            n,
            level,
            self.ntk.signal_node(&new),
            self.ntk.level(self.ntk.signal_node(&new))
        );
        self.ntk.substitute_node(n, new)?;
        self.ntk.update_levels()?;
        Ok(Some(rule))
    }

    /// One scan over a snapshot of the gates. Returns whether anything was rewritten.
    fn scan(&mut self, stats: &mut RewriteStats) -> Result<bool> {
        let mut changed = false;
        for n in self.ntk.gates()? {
            // Released by an earlier rewrite of this scan
            if self.ntk.is_dead(n) {
                continue;
            }
            if let Some(rule) = self.rewrite_node(n)? {
                stats.record(rule);
                changed = true;
            }
        }
        Ok(changed)
    }

    pub fn run(&mut self) -> Result<RewriteStats> {
        self.ntk.update_levels()?;
        let mut stats = RewriteStats {
            depth_before: self.ntk.depth(),
            gates_before: self.ntk.gates()?.len(),
            ..Default::default()
        };

        loop {
            if self.params.max_passes.is_some_and(|max| stats.passes >= max) {
                warn!(
                    "stopping after {} passes, the network may still be rewritten",
                    stats.passes
                );
                break;
            }
            stats.passes += 1;
            let before = stats.total_rewrites();
            let changed = self.scan(&mut stats)?;
            trace!(
                "pass {}: {} rewrites, depth {}",
                stats.passes,
                stats.total_rewrites() - before,
                self.ntk.depth()
            );
            if !changed {
                stats.converged = true;
                break;
            }
        }

        stats.depth_after = self.ntk.depth();
        stats.gates_after = self.ntk.gates()?.len();
        info!("algebraic rewriting: {}", stats);
        Ok(stats)
    }
}

/// Reduces the depth of `ntk` in place, keeping its function.
pub fn optimize_depth<N: Network>(ntk: &mut N) -> Result<RewriteStats> {
    optimize_depth_with(ntk, RewriteParams::default())
}

pub fn optimize_depth_with<N: Network>(
    ntk: &mut N,
    params: RewriteParams,
) -> Result<RewriteStats> {
    let mut view = DepthView::new(ntk)?;
    AlgebraicRewriter::new(&mut view, params).run()
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{Aig, AigEdge};

    /// A random AIG built with `num_gates` calls to `and` on existing signals.
    fn random_aig(
        rng: &mut StdRng,
        num_inputs: usize,
        num_gates: usize,
        num_outputs: usize,
    ) -> Aig {
        let mut aig = Aig::new();
        let mut signals: Vec<AigEdge> = (0..num_inputs).map(|_| aig.add_input()).collect();
        for _ in 0..num_gates {
            // Picking among recent signals makes deeper graphs
            let lo = signals.len().saturating_sub(8);
            let a = signals[rng.gen_range(lo..signals.len())].clone();
            let b = signals[rng.gen_range(0..signals.len())].clone();
            let a = if rng.gen_bool(0.5) { !a } else { a };
            let b = if rng.gen_bool(0.5) { !b } else { b };
            signals.push(aig.and(a, b).unwrap());
        }
        for _ in 0..num_outputs {
            let lo = signals.len().saturating_sub(num_gates / 4 + 1);
            let output = signals[rng.gen_range(lo..signals.len())].clone();
            let output = if rng.gen_bool(0.5) { !output } else { output };
            aig.add_output_edge(output).unwrap();
        }
        aig.update();
        aig
    }

    /// Linear chain of ands over fresh inputs, complementing some of the intermediate signals.
    fn chain(aig: &mut Aig, len: usize, complement: impl Fn(usize) -> bool) -> AigEdge {
        let mut acc = aig.add_input();
        for i in 0..len {
            let x = aig.add_input();
            acc = aig.and(acc, x).unwrap();
            if complement(i) {
                acc = !acc;
            }
        }
        acc
    }

    fn bounded() -> RewriteParams {
        RewriteParams {
            max_passes: Some(1000),
        }
    }

    #[test_log::test]
    fn end_to_end_associativity() {
        // a & (b & c), level(a) = 0 < level(b) = 1 < level(c) = 2
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = chain(&mut aig, 1, |_| false);
        let c = chain(&mut aig, 2, |_| false);
        let bc = aig.and(b.clone(), c.clone()).unwrap();
        let n = aig.and(a.clone(), bc).unwrap();
        aig.add_output_edge(n).unwrap();

        let stats = optimize_depth(&mut aig).unwrap();
        assert_eq!(stats.depth_before, 4);
        assert_eq!(stats.depth_after, 3);
        assert_eq!(stats.associativity, 1);
        assert_eq!(stats.total_rewrites(), 1);
        assert_eq!(stats.passes, 2);
        assert!(stats.converged);

        let ba = aig.and(b, a).unwrap();
        let expected = aig.and(ba, c).unwrap();
        assert_eq!(aig.get_outputs(), vec![expected]);
        aig.check_integrity().unwrap();
    }

    #[test_log::test]
    fn balances_long_chain() {
        let mut aig = Aig::new();
        let out = chain(&mut aig, 15, |_| false);
        aig.add_output_edge(out).unwrap();
        let before = aig.truth_tables().unwrap();

        let stats = optimize_depth_with(&mut aig, bounded()).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.depth_before, 15);
        assert!(stats.depth_after < 15);
        assert!(stats.depth_reduction() > 0);
        assert!(stats.associativity > 0);
        assert_eq!(aig.truth_tables().unwrap(), before);
        aig.check_integrity().unwrap();
    }

    #[test_log::test]
    fn nand_chain_uses_three_level_rule() {
        // x10 & !(x9 & !(x8 & ...))
        let mut aig = Aig::new();
        let out = chain(&mut aig, 10, |_| true);
        aig.add_output_edge(out).unwrap();
        let before = aig.truth_tables().unwrap();

        let stats = optimize_depth_with(&mut aig, bounded()).unwrap();
        assert!(stats.converged);
        assert!(stats.depth_after < stats.depth_before);
        assert!(stats.three_level > 0);
        assert_eq!(aig.truth_tables().unwrap(), before);
        aig.check_integrity().unwrap();
    }

    #[test_log::test]
    fn already_balanced() {
        let mut aig = Aig::new();
        let inputs: Vec<AigEdge> = (0..4).map(|_| aig.add_input()).collect();
        let ab = aig.and(inputs[0].clone(), inputs[1].clone()).unwrap();
        let cd = aig.and(inputs[2].clone(), inputs[3].clone()).unwrap();
        let out = aig.and(ab, cd).unwrap();
        aig.add_output_edge(out).unwrap();
        aig.add_output_edge(inputs[0].clone()).unwrap();
        let before = aig.deep_clone().unwrap();

        let stats = optimize_depth(&mut aig).unwrap();
        assert_eq!(stats.total_rewrites(), 0);
        assert_eq!(stats.passes, 1);
        assert!(stats.converged);
        assert_eq!(aig, before);
    }

    #[test_log::test]
    fn empty_network() {
        let mut aig = Aig::new();
        let stats = optimize_depth(&mut aig).unwrap();
        assert_eq!(stats, RewriteStats {
            passes: 1,
            converged: true,
            ..Default::default()
        });
    }

    #[test_log::test]
    fn random_aigs_keep_function_exhaustive() {
        let mut rng = StdRng::seed_from_u64(0xa16);
        for _ in 0..50 {
            let num_inputs = rng.gen_range(3..=10);
            let num_gates = rng.gen_range(10..=80);
            let num_outputs = rng.gen_range(1..=4);
            let mut aig = random_aig(&mut rng, num_inputs, num_gates, num_outputs);
            let before = aig.truth_tables().unwrap();

            let stats = optimize_depth_with(&mut aig, bounded()).unwrap();
            assert!(stats.converged, "{}", stats);
            assert!(stats.depth_after <= stats.depth_before, "{}", stats);
            assert_eq!(aig.truth_tables().unwrap(), before, "{}", stats);
            aig.check_integrity().unwrap();
        }
    }

    #[test_log::test]
    fn random_aigs_keep_function_simulation() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            let mut aig = random_aig(&mut rng, 32, 400, 8);
            let patterns: Vec<Vec<u64>> = (0..32)
                .map(|_| (0..16).map(|_| rng.gen_range(0..=u64::MAX)).collect())
                .collect();
            let before = aig.simulate_words(&patterns).unwrap();

            let stats = optimize_depth_with(&mut aig, bounded()).unwrap();
            assert!(stats.converged, "{}", stats);
            assert!(stats.depth_after <= stats.depth_before, "{}", stats);
            assert_eq!(aig.simulate_words(&patterns).unwrap(), before, "{}", stats);
            aig.check_integrity().unwrap();
        }
    }

    #[test_log::test]
    fn second_run_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut aig = random_aig(&mut rng, 8, 60, 3);
            let first = optimize_depth_with(&mut aig, bounded()).unwrap();
            assert!(first.converged);
            let after_first = aig.deep_clone().unwrap();

            let second = optimize_depth(&mut aig).unwrap();
            assert_eq!(second.total_rewrites(), 0);
            assert_eq!(second.depth_before, first.depth_after);
            assert_eq!(second.depth_after, first.depth_after);
            assert_eq!(aig, after_first);
        }
    }

    #[test_log::test]
    fn max_passes_stops_early() {
        let mut aig = Aig::new();
        let out = chain(&mut aig, 15, |_| false);
        aig.add_output_edge(out).unwrap();
        let before = aig.truth_tables().unwrap();

        let stats = optimize_depth_with(&mut aig, RewriteParams {
            max_passes: Some(1),
        })
        .unwrap();
        assert_eq!(stats.passes, 1);
        assert!(stats.total_rewrites() > 0);
        assert!(!stats.converged);
        assert!(stats.to_string().ends_with("(not converged)"));
        assert_eq!(aig.truth_tables().unwrap(), before);
    }

    #[test]
    fn stats_accessors() {
        let stats = RewriteStats {
            passes: 3,
            associativity: 4,
            distributivity_or: 1,
            distributivity_and: 0,
            three_level: 2,
            depth_before: 12,
            depth_after: 7,
            gates_before: 30,
            gates_after: 34,
            converged: true,
        };
        assert_eq!(stats.total_rewrites(), 7);
        assert_eq!(stats.depth_reduction(), 5);
        assert_eq!(stats.count(Rule::ThreeLevelDistributivity), 2);
        assert_eq!(
            stats.to_string(),
            "depth 12 -> 7, gates 30 -> 34, 7 rewrites (A 4, B 1, C 0, D 2) in 3 passes"
        );
    }
}
