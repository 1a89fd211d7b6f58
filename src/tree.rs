/// Tree algebra compiler (component D).
///
/// A [`TreeExpr`] is a symbolic term over the constants `TOP_T`/`BOT_T` and
/// the constructors `Prefix`/`Cross`/`Sum` (`Path` desugars to nested
/// `Prefix` at construction time), denoting a set of labeled unordered
/// rooted trees. Compiling one produces two ZDDs:
///
/// - `trees(t)`: the variable-sets naming the *full* trees denoted by `t`.
/// - `subtrees(t)`: the variable-sets naming every subtree (including the
///   empty tree) of every tree denoted by `t`.
///
/// A tree's variable-set is built by walking it root-down: the edge from a
/// node under parent variable `vp` labeled `ℓ` is named `intern(vp, ℓ)`, so
/// two equal labeled trees always compile to equal variable-sets regardless
/// of where in a larger expression they occur.
///
/// Every `Prefix` wraps its inner ZDD one level deeper (`mk(v, Bot,
/// inner)`), which requires `v` to compare smaller than everything `inner`
/// uses — exactly the ordering [`Variable`]'s depth-first `Ord` guarantees,
/// since `intern` always returns a variable one depth deeper than its
/// parent (see `interner.rs`).
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::Variable;
use crate::interner::intern;
use crate::zdd::{Zdd, ZddStore};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
enum Kind {
    Top,
    Bot,
    Prefix(Vec<u8>, TreeExpr),
    Cross(Vec<TreeExpr>),
    Sum(Vec<TreeExpr>),
}

#[derive(Debug)]
struct Node {
    id: u64,
    kind: Kind,
}

/// A symbolic tree expression. Cheap to clone (`Rc`); the compiler memoizes
/// on object identity rather than structure, so a sub-expression shared
/// across a larger term (e.g. reused in two branches of a `Cross`) compiles
/// once per parent-variable context instead of once per occurrence.
#[derive(Debug, Clone)]
pub struct TreeExpr(Rc<Node>);

impl PartialEq for TreeExpr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for TreeExpr {}

impl TreeExpr {
    fn new(kind: Kind) -> Self {
        TreeExpr(Rc::new(Node {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            kind,
        }))
    }

    /// `TOP_T = {∅-tree}`: the set containing only the empty tree.
    pub fn top() -> Self {
        Self::new(Kind::Top)
    }

    /// `BOT_T = ∅`: the empty set of trees.
    pub fn bot() -> Self {
        Self::new(Kind::Bot)
    }

    /// Every tree in `t`, rooted one level deeper under edge `label`.
    pub fn prefix(label: impl AsRef<[u8]>, t: TreeExpr) -> Self {
        Self::new(Kind::Prefix(label.as_ref().to_vec(), t))
    }

    /// Unordered union of trees: the cross product of the operands' tree
    /// sets under tree union (every combination of one tree from each
    /// operand, merged into a single tree).
    pub fn cross(ts: Vec<TreeExpr>) -> Self {
        Self::new(Kind::Cross(ts))
    }

    /// Disjoint union: every tree denoted by any operand.
    pub fn sum(ts: Vec<TreeExpr>) -> Self {
        Self::new(Kind::Sum(ts))
    }

    /// `Path(a, b, c) = Prefix(a, Prefix(b, Prefix(c, TOP_T)))`.
    pub fn path<L: AsRef<[u8]>>(labels: &[L]) -> Self {
        labels
            .iter()
            .rev()
            .fold(Self::top(), |acc, label| Self::prefix(label, acc))
    }
}

type Memo = HashMap<(u64, Variable), (Zdd, Zdd)>;

/// Compile `expr` under parent-variable context `vp`, returning
/// `(trees(expr), subtrees(expr))`.
fn compile(store: &ZddStore, expr: &TreeExpr, vp: Variable, memo: &mut Memo) -> (Zdd, Zdd) {
    let key = (expr.0.id, vp);
    if let Some(cached) = memo.get(&key) {
        return cached.clone();
    }
    let result = match &expr.0.kind {
        Kind::Top => (Zdd::Top, Zdd::Top),
        Kind::Bot => (Zdd::Bot, Zdd::Top),
        Kind::Prefix(label, inner) => {
            let v = intern(vp, label);
            let (inner_trees, inner_subtrees) = compile(store, inner, v, memo);
            let trees = store.mk(v, Zdd::Bot, inner_trees);
            let prefixed_subtrees = store.mk(v, Zdd::Bot, inner_subtrees);
            let subtrees = store.union(&Zdd::Top, &prefixed_subtrees);
            (trees, subtrees)
        }
        Kind::Cross(parts) => {
            let mut trees = Zdd::Top;
            let mut subtrees = Zdd::Top;
            for part in parts {
                let (t, s) = compile(store, part, vp, memo);
                trees = store.cross_union(&trees, &t);
                subtrees = store.cross_union(&subtrees, &s);
            }
            (trees, subtrees)
        }
        Kind::Sum(parts) => {
            let mut trees = Zdd::Bot;
            let mut subtrees = Zdd::Bot;
            for part in parts {
                let (t, s) = compile(store, part, vp, memo);
                trees = store.union(&trees, &t);
                subtrees = store.union(&subtrees, &s);
            }
            subtrees = store.union(&subtrees, &Zdd::Top);
            (trees, subtrees)
        }
    };
    memo.insert(key, result.clone());
    result
}

/// The variable-sets naming the full trees denoted by `expr`.
pub fn trees(store: &ZddStore, expr: &TreeExpr) -> Zdd {
    let mut memo = Memo::default();
    compile(store, expr, Variable::ROOT, &mut memo).0
}

/// The variable-sets naming every subtree (including the empty tree) of
/// every tree denoted by `expr`.
pub fn subtrees(store: &ZddStore, expr: &TreeExpr) -> Zdd {
    let mut memo = Memo::default();
    compile(store, expr, Variable::ROOT, &mut memo).1
}
