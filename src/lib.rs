//! Multi-dimensional aggregate counts over hierarchically structured
//! observations, via a hash-consed ZDD store (component B), a ZDD-number
//! arithmetic layer (component C), a tree algebra compiler (component D),
//! and an aggregator exposed as [`Cube`](aggregator::Cube) (component E).

pub mod aggregator;
pub mod common;
pub mod interner;
pub mod tree;
pub mod zdd;
pub mod zdd_number;

pub use aggregator::{AggregatorError, Cube};
pub use tree::TreeExpr;
pub use zdd::{Zdd, ZddStore};
pub use zdd_number::ZddNumber;
