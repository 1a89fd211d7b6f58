/// ZDD-number arithmetic (component C).
///
/// A `ZddNumber` is a little-endian vector of ZDDs, digit `i` carrying
/// weight `2^i` (binary) or `(-2)^i` (negabinary). Position `i` of a set `S`
/// contributes its digit's membership test: `S` is "in" digit `i` iff `S` is
/// one of the sets denoted by that digit's ZDD. Reading a `ZddNumber` back
/// for a fixed `S` therefore recovers an ordinary base-2 or base-(-2)
/// integer — the accumulated weight of every observation whose labeled path
/// produced `S`.
///
/// Addition is ripple-carry, built entirely out of ordinary ZDD set
/// operations (`union`/`intersection`/`difference`) rather than a bespoke
/// per-digit representation, so two `ZddNumber`s built from unrelated label
/// trees still share structure wherever their digit ZDDs happen to coincide.
use crate::zdd::{Zdd, ZddStore};

/// A canonical (no trailing `BOT` digit) little-endian ZDD digit vector.
#[derive(Debug, Clone)]
pub struct ZddNumber {
    digits: Vec<Zdd>,
}

impl PartialEq for ZddNumber {
    fn eq(&self, other: &Self) -> bool {
        self.digits.len() == other.digits.len()
            && self.digits.iter().zip(other.digits.iter()).all(|(a, b)| a == b)
    }
}
impl Eq for ZddNumber {}

impl ZddNumber {
    /// The number zero: no digits at all.
    pub fn nil() -> Self {
        Self { digits: Vec::new() }
    }

    pub fn is_nil(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn digits(&self) -> &[Zdd] {
        &self.digits
    }

    fn from_digits(digits: Vec<Zdd>) -> Self {
        Self { digits: trim(digits) }
    }

    /// The ZDD-number representation of the single weight `weight` attached
    /// uniformly to every set in `z`, in binary (`weight` must be
    /// non-negative).
    pub fn promote_binary(z: &Zdd, weight: u64) -> Self {
        let mut digits = Vec::new();
        let mut w = weight;
        while w > 0 {
            digits.push(if w & 1 == 1 { z.clone() } else { Zdd::Bot });
            w >>= 1;
        }
        Self::from_digits(digits)
    }

    /// The ZDD-number representation of `weight` (any sign) attached to
    /// every set in `z`, in negabinary.
    pub fn promote_negabinary(z: &Zdd, weight: i64) -> Self {
        let mut digits = Vec::new();
        let mut w = weight as i128;
        while w != 0 {
            let mut rem = w % -2;
            let mut q = w / -2;
            if rem < 0 {
                rem += 2;
                q += 1;
            }
            digits.push(if rem == 1 { z.clone() } else { Zdd::Bot });
            w = q;
        }
        Self::from_digits(digits)
    }
}

fn trim(mut digits: Vec<Zdd>) -> Vec<Zdd> {
    while matches!(digits.last(), Some(d) if d.is_bot()) {
        digits.pop();
    }
    digits
}

fn digit_at(digits: &[Zdd], i: usize) -> Zdd {
    digits.get(i).cloned().unwrap_or(Zdd::Bot)
}

fn sym_diff(store: &ZddStore, a: &Zdd, b: &Zdd) -> Zdd {
    store.difference(&store.union(a, b), &store.intersection(a, b))
}

/// Binary ripple-carry addition: `digit = x xor y xor carry_in`,
/// `carry_out = majority(x, y, carry_in)`, the ordinary full-adder relations
/// applied bitwise to ZDDs instead of booleans.
pub fn binary_add(store: &ZddStore, a: &ZddNumber, b: &ZddNumber) -> ZddNumber {
    let n = a.digits.len().max(b.digits.len());
    let mut digits = Vec::with_capacity(n + 1);
    let mut carry = Zdd::Bot;
    for i in 0..n {
        let x = digit_at(&a.digits, i);
        let y = digit_at(&b.digits, i);
        let xy_and = store.intersection(&x, &y);
        let sum2 = sym_diff(store, &x, &y);
        let d = sym_diff(store, &sum2, &carry);
        let carry_out = store.union(&xy_and, &store.intersection(&sum2, &carry));
        digits.push(d);
        carry = carry_out;
    }
    if !carry.is_bot() {
        digits.push(carry);
    }
    ZddNumber::from_digits(digits)
}

/// Negabinary ripple addition. At each position the raw sum `x_i + y_i +
/// c_i` lands in `{0,1,2,3}`; the digit is that sum mod 2 (same formula as
/// binary), but an overflow (`sum >= 2`, i.e. a majority of the three
/// inputs) cannot be resolved by a single `(-2)`-weighted carry bit — a
/// carry of `-1` into position `i+1` is equal in value to a carry of `+1`
/// into position `i+1` *and* a carry of `+1` into position `i+2`, since
/// `(-2)^(i+1) + (-2)^(i+2) = (-2)^(i+1)(1 - 2) = -(-2)^(i+1)`. So every
/// overflow is delivered to the next two positions instead of one, tracked
/// here as a two-slot carry window (`carry_next`, `carry_next2`).
pub fn negabinary_add(store: &ZddStore, a: &ZddNumber, b: &ZddNumber) -> ZddNumber {
    let mut digits = Vec::new();
    let mut carry_next = Zdd::Bot;
    let mut carry_next2 = Zdd::Bot;
    let mut i = 0;
    while i < a.digits.len() || i < b.digits.len() || !carry_next.is_bot() || !carry_next2.is_bot()
    {
        let x = digit_at(&a.digits, i);
        let y = digit_at(&b.digits, i);
        let c = carry_next;
        let xy_and = store.intersection(&x, &y);
        let sum2 = sym_diff(store, &x, &y);
        let d = sym_diff(store, &sum2, &c);
        let majority = store.union(&xy_and, &store.intersection(&sum2, &c));
        let new_carry_next = store.union(&carry_next2, &majority);
        digits.push(d);
        carry_next = new_carry_next;
        carry_next2 = majority;
        i += 1;
    }
    ZddNumber::from_digits(digits)
}

/// Negate a negabinary number: `-y = y + (y shifted up by one position)`,
/// since `-1` in negabinary is the two-digit pattern `[1, 1]`
/// (`1*(-2)^0 + 1*(-2)^1 = -1`) and scaling `y` by that pattern is exactly
/// `y*(-2)^0 + y*(-2)^1`, the second term being `y` shifted one place.
fn negate_negabinary(store: &ZddStore, y: &ZddNumber) -> ZddNumber {
    let mut shifted = Vec::with_capacity(y.digits.len() + 1);
    shifted.push(Zdd::Bot);
    shifted.extend(y.digits.iter().cloned());
    negabinary_add(store, y, &ZddNumber::from_digits(shifted))
}

/// `a - b` in negabinary, via negation and addition.
pub fn negabinary_sub(store: &ZddStore, a: &ZddNumber, b: &ZddNumber) -> ZddNumber {
    negabinary_add(store, a, &negate_negabinary(store, b))
}

/// The coefficient of `q` in `n`, read as binary. `q` should denote a single
/// set for the textbook "coefficient of this observation" reading; if `q`
/// denotes several sets the result is their coefficients' sum (`q`'s
/// membership in digit `d` is tested via `|q ∩ d|`, which collapses to 0/1
/// for a singleton `q`).
pub fn coefficient_binary(store: &ZddStore, n: &ZddNumber, q: &Zdd) -> u64 {
    let mut total: u64 = 0;
    for (i, d) in n.digits.iter().enumerate() {
        let hits = store.count_sets(&store.intersection(q, d));
        total += hits << i;
    }
    total
}

/// The coefficient of `q` in `n`, read as negabinary. See
/// [`coefficient_binary`] for the multi-set-`q` generalization.
///
/// `base` is only advanced when another digit remains to consume it —
/// advancing it unconditionally after the last digit would compute one
/// power of `-2` more than the number ever needs, overflowing `i64` on a
/// ~64-digit accumulator even when the true (in-range) coefficient doesn't
/// need that last digit at all.
pub fn coefficient_negabinary(store: &ZddStore, n: &ZddNumber, q: &Zdd) -> i64 {
    let mut total: i64 = 0;
    let mut base: i64 = 1;
    let last = n.digits.len().saturating_sub(1);
    for (i, d) in n.digits.iter().enumerate() {
        let hits = store.count_sets(&store.intersection(q, d)) as i64;
        total += base * hits;
        if i < last {
            base = base.checked_mul(-2).expect("negabinary digit position overflowed i64");
        }
    }
    total
}
