use std::hash::BuildHasherDefault;
use wyhash::WyHash;

/// A position in the label universe: the node reached from the root by one
/// specific labeled path.
///
/// Ordered first by `depth` (distance from the root) and only then by
/// `hash` (the interner's hash of the path to this position). This is
/// deliberate: `wyhash` gives no guarantee that a parent's hash is smaller
/// than its children's, so a single hash value cannot double as both the
/// node's identity and its position in the ZDD's global variable order
/// (spec.md §3's ordering invariant — every internal node's variable must
/// be smaller than its descendants'). Depth-first ordering makes that
/// invariant hold by construction: every variable derived from a parent via
/// [`crate::interner::intern`] has `depth = parent.depth + 1`, so it always
/// compares greater than its parent, regardless of how the hashes fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable {
    pub(crate) depth: u64,
    pub(crate) hash: u64,
}

impl Variable {
    /// The reserved "no parent" placeholder (the root context, depth 0).
    /// Never returned by the interner for a real label: every interned
    /// variable has `depth >= 1`, so it can never equal `ROOT`.
    pub const ROOT: Variable = Variable { depth: 0, hash: 0 };

    /// A synthetic variable at a given depth, for tests that want to build
    /// a ZDD chain directly without going through the interner. Two
    /// different depths always compare in depth order; two calls with the
    /// same depth collide by design (there's only one "slot" at that
    /// depth with no label to distinguish them), so tests needing several
    /// distinct variables at the same depth should route through
    /// [`crate::interner::intern`] instead.
    #[cfg(test)]
    pub(crate) fn at_depth(depth: u64) -> Self {
        Variable { depth, hash: 0 }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:x}", self.depth, self.hash)
    }
}

/// A signed weight attached to an observation, or the coefficient recovered
/// from a query against an accumulated [`crate::zdd_number::ZddNumber`].
pub type Weight = i64;

/// The process-wide monotonic id stamped on every internal ZDD node at
/// construction, used as the `Copy` cache key in place of raw pointers.
pub type NodeId = u64;

/// Hasher-parameterized hash map/set, reused from the teacher's `wyhash`
/// convention for anything that is not one of the concurrent node/cache
/// tables (those use [`dashmap::DashMap`] instead; see `zdd.rs`).
pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<WyHash>>;
pub type HashSet<K> = std::collections::HashSet<K, BuildHasherDefault<WyHash>>;
