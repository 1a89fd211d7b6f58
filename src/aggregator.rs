/// Aggregator and public surface API (component E).
///
/// `Cube` is the crate's external interface: a cheap-to-clone handle around
/// a shared [`ZddStore`] exposing the operation table a caller (e.g. a
/// script-facing binding, out of scope for this crate) drives an
/// aggregation through. It has no mutable state of its own — every method
/// returns a new handle sharing structure with its inputs through the
/// store, which is itself the one piece of shared mutable state (see
/// `zdd.rs`'s concurrency documentation).
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::tree::{self, TreeExpr};
use crate::zdd::ZddStore;
use crate::zdd_number::{self, ZddNumber};

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum AggregatorError {
    #[error("count_trees query does not denote a single tree")]
    NonSingletonQuery,
}

/// A shared aggregation context: one `ZddStore` plus the operations over it.
/// `Clone` is shallow (an `Arc` bump), so the same cube can be handed to
/// multiple threads that fold independent slices of an input and `merge`
/// their partial accumulators.
#[derive(Clone)]
pub struct Cube {
    store: Arc<ZddStore>,
}

impl Default for Cube {
    fn default() -> Self {
        Self::new()
    }
}

impl Cube {
    pub fn new() -> Self {
        debug!("constructing cube store");
        Self {
            store: Arc::new(ZddStore::new()),
        }
    }

    /// Share this cube's store with other collaborators (the tree compiler
    /// and arithmetic layer both take a bare `&ZddStore`).
    pub fn store(&self) -> &Arc<ZddStore> {
        &self.store
    }

    /// `subtrees(weight, t) -> z`: the ZDD-number giving `weight` to every
    /// subtree (including the empty one) denoted by `t`.
    pub fn subtrees(&self, weight: i64, expr: &TreeExpr) -> ZddNumber {
        let s = tree::subtrees(&self.store, expr);
        ZddNumber::promote_negabinary(&s, weight)
    }

    /// `add(z1, z2) -> z`, a.k.a. `merge`: associative, commutative, with
    /// [`ZddNumber::nil`] as identity.
    pub fn add(&self, a: &ZddNumber, b: &ZddNumber) -> ZddNumber {
        zdd_number::negabinary_add(&self.store, a, b)
    }

    /// `merge(acc1, acc2) -> acc`, the intended reduce step for an
    /// embarrassingly parallel fold over an input sequence (spec.md §5).
    pub fn merge(&self, acc1: &ZddNumber, acc2: &ZddNumber) -> ZddNumber {
        debug!("merging two accumulators");
        self.add(acc1, acc2)
    }

    /// `sub(z1, z2) -> z`.
    pub fn sub(&self, a: &ZddNumber, b: &ZddNumber) -> ZddNumber {
        zdd_number::negabinary_sub(&self.store, a, b)
    }

    /// `accumulate(acc, weight, expr) -> acc'`: compile `expr`'s subtrees,
    /// weight them, and fold the result into `acc`.
    pub fn accumulate(&self, acc: &ZddNumber, weight: i64, expr: &TreeExpr) -> ZddNumber {
        debug!(weight, "accumulating one observation");
        let z = self.subtrees(weight, expr);
        self.add(acc, &z)
    }

    /// `count_trees(query)(z) -> integer`: the coefficient of `query` (which
    /// must denote exactly one tree) within `acc`.
    pub fn count_trees(
        &self,
        query: &TreeExpr,
        acc: &ZddNumber,
    ) -> Result<i64, AggregatorError> {
        let q = tree::trees(&self.store, query);
        if !q.is_singleton() {
            return Err(AggregatorError::NonSingletonQuery);
        }
        Ok(zdd_number::coefficient_negabinary(&self.store, acc, &q))
    }

    /// `sum_subtrees([(w, t)…]) -> z`: fold `subtrees(w, t)` over the list
    /// under `add`, starting from [`ZddNumber::nil`].
    pub fn sum_subtrees(&self, weighted: &[(i64, TreeExpr)]) -> ZddNumber {
        let mut acc = ZddNumber::nil();
        for (weight, expr) in weighted {
            acc = self.accumulate(&acc, *weight, expr);
        }
        acc
    }
}
