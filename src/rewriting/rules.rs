//! Algebraic rewrite rules.
//!
//! Each rule looks at a node `n` on the critical path and at its two or three levels of
//! fanins. When the neighborhood matches a Boolean identity that can move the deepest
//! signal closer to `n`, the matcher returns a [`Rewrite`]: the signals needed to build
//! the replacement of `n`. Matchers only read the network, building and substituting is
//! left to the caller.
//!
//! Notations below: `level(s)` is the level of the node of signal `s`, and a signal is said
//! to be critical when its node is on the critical path.

use std::{fmt, ops::Not};

use crate::{Result, depth::Depth, network::Network};

/// The rewrite rules, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// `(g0 & g1) & s0` into `(g0 & s0) & g1`.
    Associativity,
    /// `!(x & o0) & !(x & o1)` into `!(x & (o0 | o1))`.
    DistributivityOr,
    /// `(x & o0) & (x & o1)` into `(o0 & o1) & x`.
    DistributivityAnd,
    /// Moves the deepest signal of a three-level and/or structure two levels up.
    ThreeLevelDistributivity,
}

impl Rule {
    pub const ALL: [Rule; 4] = [
        Rule::Associativity,
        Rule::DistributivityOr,
        Rule::DistributivityAnd,
        Rule::ThreeLevelDistributivity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Associativity => "associativity",
            Rule::DistributivityOr => "or-distributivity",
            Rule::DistributivityAnd => "and-distributivity",
            Rule::ThreeLevelDistributivity => "three-level distributivity",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A matched rewrite, holding the signals its replacement is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<S> {
    Associativity { g0: S, s0: S, g1: S },
    DistributivityOr { shared: S, other0: S, other1: S },
    DistributivityAnd { shared: S, other0: S, other1: S },
    ThreeLevelDistributivity { e0: S, e1: S, c0: S, d0: S },
}

impl<S: Clone + Not<Output = S>> Rewrite<S> {
    pub fn rule(&self) -> Rule {
        match self {
            Rewrite::Associativity { .. } => Rule::Associativity,
            Rewrite::DistributivityOr { .. } => Rule::DistributivityOr,
            Rewrite::DistributivityAnd { .. } => Rule::DistributivityAnd,
            Rewrite::ThreeLevelDistributivity { .. } => Rule::ThreeLevelDistributivity,
        }
    }

    /// Creates the replacement in the network and returns its signal.
    ///
    /// The matched node itself is left untouched, see [`Network::substitute_node`].
    pub fn build<N>(self, ntk: &mut N) -> Result<S>
    where
        N: Network<Signal = S>,
    {
        match self {
            Rewrite::Associativity { g0, s0, g1 } => {
                let low = ntk.create_and(g0, s0)?;
                ntk.create_and(low, g1)
            }
            Rewrite::DistributivityOr {
                shared,
                other0,
                other1,
            } => {
                let low = !ntk.create_and(!other0, !other1)?;
                let high = ntk.create_and(low, shared)?;
                Ok(!high)
            }
            Rewrite::DistributivityAnd {
                shared,
                other0,
                other1,
            } => {
                let low = ntk.create_and(other0, other1)?;
                ntk.create_and(low, shared)
            }
            Rewrite::ThreeLevelDistributivity { e0, e1, c0, d0 } => {
                let left = ntk.create_and(e0, c0.clone())?;
                let right = !ntk.create_and(!d0, c0)?;
                let middle = !ntk.create_and(left, e1)?;
                Ok(!ntk.create_and(middle, right)?)
            }
        }
    }
}

fn signal_level<N: Depth>(ntk: &N, signal: &N::Signal) -> u32 {
    ntk.level(ntk.signal_node(signal))
}

fn is_critical<N: Depth>(ntk: &N, signal: &N::Signal) -> bool {
    ntk.is_on_critical_path(ntk.signal_node(signal))
}

/// Orders two signals by increasing level. `None` if both have the same level.
fn order_by_level<N: Depth>(
    ntk: &N,
    (a, b): (N::Signal, N::Signal),
) -> Option<(N::Signal, N::Signal)> {
    let level_a = signal_level(ntk, &a);
    let level_b = signal_level(ntk, &b);
    if level_a < level_b {
        Some((a, b))
    } else if level_a > level_b {
        Some((b, a))
    } else {
        None
    }
}

/// Finds a critical signal feeding both `p` and `q`, along with the remaining fanin of each.
/// When several signals qualify, the last one in fanin order wins.
///
/// Returns `(shared, other_p, other_q)`, or `None` if a remaining fanin is critical.
fn split_shared<N: Depth>(
    ntk: &N,
    p: N::Node,
    q: N::Node,
) -> Option<(N::Signal, N::Signal, N::Signal)> {
    let (p0, p1) = ntk.fanins(p);
    let (q0, q1) = ntk.fanins(q);

    let mut shared = None;
    for (i, p_fanin) in [&p0, &p1].into_iter().enumerate() {
        for (j, q_fanin) in [&q0, &q1].into_iter().enumerate() {
            if p_fanin == q_fanin && is_critical(ntk, p_fanin) {
                shared = Some((i, j));
            }
        }
    }

    let (i, j) = shared?;
    let (shared, other_p) = if i == 0 { (p0, p1) } else { (p1, p0) };
    let other_q = if j == 0 { q1 } else { q0 };
    if is_critical(ntk, &other_p) || is_critical(ntk, &other_q) {
        return None;
    }
    Some((shared, other_p, other_q))
}

/// Rule A. With `n = s0 & s1`, `level(s0) < level(s1)`, `s1 = g0 & g1` uncomplemented
/// and `level(g0) < level(g1)`: if `level(s0) < level(g1)`, `n = (g0 & s0) & g1`.
pub fn match_associativity<N: Depth>(ntk: &N, n: N::Node) -> Option<Rewrite<N::Signal>> {
    if !ntk.is_on_critical_path(n) {
        return None;
    }
    let (s0, s1) = order_by_level(ntk, ntk.fanins(n))?;
    if ntk.is_complemented(&s1) {
        return None;
    }
    let (g0, g1) = order_by_level(ntk, ntk.fanins(ntk.signal_node(&s1)))?;
    if signal_level(ntk, &s0) >= signal_level(ntk, &g1) {
        return None;
    }
    Some(Rewrite::Associativity { g0, s0, g1 })
}

/// The fanin nodes of `n` if both fanins have the given polarity and are critical gates.
fn critical_gate_fanins<N: Depth>(
    ntk: &N,
    n: N::Node,
    complemented: bool,
) -> Option<(N::Node, N::Node)> {
    if !ntk.is_on_critical_path(n) {
        return None;
    }
    let (f0, f1) = ntk.fanins(n);
    let nodes = [ntk.signal_node(&f0), ntk.signal_node(&f1)];
    for (fanin, node) in [&f0, &f1].into_iter().zip(nodes) {
        if ntk.is_complemented(fanin) != complemented
            || !ntk.is_on_critical_path(node)
            || ntk.is_ci(node)
        {
            return None;
        }
    }
    let [p, q] = nodes;
    if p == q {
        return None;
    }
    Some((p, q))
}

/// Rule B. With `n = !(x & o0) & !(x & o1)`, `x` critical and both `o0`, `o1` off the
/// critical path: `n = !((o0 | o1) & x)`.
pub fn match_distributivity_or<N: Depth>(ntk: &N, n: N::Node) -> Option<Rewrite<N::Signal>> {
    let (p, q) = critical_gate_fanins(ntk, n, true)?;
    let (shared, other0, other1) = split_shared(ntk, p, q)?;
    Some(Rewrite::DistributivityOr {
        shared,
        other0,
        other1,
    })
}

/// Rule C. With `n = (x & o0) & (x & o1)`, `x` critical and both `o0`, `o1` off the
/// critical path: `n = (o0 & o1) & x`.
pub fn match_distributivity_and<N: Depth>(ntk: &N, n: N::Node) -> Option<Rewrite<N::Signal>> {
    let (p, q) = critical_gate_fanins(ntk, n, false)?;
    let (shared, other0, other1) = split_shared(ntk, p, q)?;
    Some(Rewrite::DistributivityAnd {
        shared,
        other0,
        other1,
    })
}

/// Rule D. With `n = c0 & !(d0 & !(e0 & e1))`, each named signal being the shallower fanin
/// of its gate except `e1`, and `c0`, `d0`, `e0` off the critical path:
/// `n = ((e0 & c0) & e1) | (!d0 & c0)` which brings `e1` two levels up when
/// `level(e1) > level(c0)`.
pub fn match_three_level<N: Depth>(ntk: &N, n: N::Node) -> Option<Rewrite<N::Signal>> {
    if !ntk.is_on_critical_path(n) {
        return None;
    }
    let (c0, c1) = order_by_level(ntk, ntk.fanins(n))?;
    if !ntk.is_complemented(&c1) || is_critical(ntk, &c0) {
        return None;
    }
    let (d0, d1) = order_by_level(ntk, ntk.fanins(ntk.signal_node(&c1)))?;
    if !ntk.is_complemented(&d1) || is_critical(ntk, &d0) {
        return None;
    }
    let (e0, e1) = order_by_level(ntk, ntk.fanins(ntk.signal_node(&d1)))?;
    if is_critical(ntk, &e0) || signal_level(ntk, &e1) <= signal_level(ntk, &c0) {
        return None;
    }
    Some(Rewrite::ThreeLevelDistributivity { e0, e1, c0, d0 })
}

/// Tries a single rule on `n`.
pub fn match_rule<N: Depth>(ntk: &N, rule: Rule, n: N::Node) -> Option<Rewrite<N::Signal>> {
    match rule {
        Rule::Associativity => match_associativity(ntk, n),
        Rule::DistributivityOr => match_distributivity_or(ntk, n),
        Rule::DistributivityAnd => match_distributivity_and(ntk, n),
        Rule::ThreeLevelDistributivity => match_three_level(ntk, n),
    }
}

/// The first rule matching `n`, in the order of [`Rule::ALL`].
pub fn find_rewrite<N: Depth>(ntk: &N, n: N::Node) -> Option<Rewrite<N::Signal>> {
    Rule::ALL
        .into_iter()
        .find_map(|rule| match_rule(ntk, rule, n))
}
