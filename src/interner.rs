/// Label interner (component A).
///
/// Maps a user label (an opaque byte sequence) and a parent
/// [`Variable`](crate::common::Variable) to the variable naming that
/// position.
///
/// This is a pure function, not a table: two calls with identical inputs
/// anywhere in the process return identical output, so labeled paths that
/// recur in independently built tree expressions share the same variable
/// without any cross-call bookkeeping. Collisions within a depth are only
/// as likely as a 64-bit hash collision, which the spec treats as
/// negligible. The returned variable's `depth` is always `parent.depth +
/// 1`, which is what gives the ZDD store's variable order (`depth` first,
/// `hash` only to break ties) the property that a parent always precedes
/// its children — `wyhash` itself gives no such guarantee over the raw hash
/// value, so depth carries that invariant instead.
use crate::common::Variable;
use std::hash::Hasher;
use wyhash::WyHash;

/// Intern `label` under `parent`, returning the variable naming that
/// position. `parent` is [`Variable::ROOT`] for a label attached directly
/// to the root.
pub fn intern(parent: Variable, label: &[u8]) -> Variable {
    let mut hasher = WyHash::default();
    hasher.write_u64(parent.depth);
    hasher.write_u64(parent.hash);
    hasher.write(label);
    let h = hasher.finish();
    let hash = if h == 0 { u64::MAX } else { h };
    Variable {
        depth: parent.depth + 1,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: Variable = Variable::ROOT;

    #[test]
    fn pure_and_deterministic() {
        assert_eq!(intern(ROOT, b"a"), intern(ROOT, b"a"));
        assert_eq!(
            intern(intern(ROOT, b"a"), b"b"),
            intern(intern(ROOT, b"a"), b"b")
        );
    }

    #[test]
    fn distinguishes_parent_and_label() {
        let a = intern(ROOT, b"a");
        let b = intern(ROOT, b"b");
        assert_ne!(a, b);
        let a_then_b = intern(a, b"x");
        let b_then_b = intern(b, b"x");
        assert_ne!(a_then_b, b_then_b);
    }

    #[test]
    fn never_returns_root() {
        for label in [&b""[..], b"a", b"ab", b"a very long label indeed"] {
            for parent in [ROOT, intern(ROOT, b"p"), intern(intern(ROOT, b"p"), b"q")] {
                assert_ne!(intern(parent, label), Variable::ROOT);
            }
        }
    }

    #[test]
    fn shared_prefixes_share_variables() {
        // Two independently constructed paths "a/b" and "a/c" must name the
        // same variable for the shared "a" position.
        let a1 = intern(ROOT, b"a");
        let a2 = intern(ROOT, b"a");
        assert_eq!(a1, a2);
        let b = intern(a1, b"b");
        let c = intern(a2, b"c");
        assert_ne!(b, c);
    }

    #[test]
    fn depth_always_increases_by_one() {
        let a = intern(ROOT, b"a");
        assert_eq!(a.depth, 1);
        let b = intern(a, b"b");
        assert_eq!(b.depth, 2);
        let c = intern(b, b"c");
        assert_eq!(c.depth, 3);
    }
}
