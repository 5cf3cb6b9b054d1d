pub mod aig;
pub mod depth;
pub mod network;
pub mod rewriting;

// Re-exporting symbols and modules.
pub use aig::simulate;
pub use aig::{Aig, AigEdge, AigError, AigNode, AigNodeRef, NodeId, Result, StrashKey};
pub use depth::{Depth, DepthView};
pub use network::Network;
pub use rewriting::{
    AlgebraicRewriter, RewriteParams, RewriteStats, Rule, optimize_depth, optimize_depth_with,
};
