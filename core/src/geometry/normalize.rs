//! Statement canonicalization
//!
//! Each predicate has a symmetry group of argument permutations that leave
//! its meaning unchanged. The canonical form is the smallest variant in that
//! group, so two statements are equal iff they say the same thing.

use crate::ir::{EntityId, Predicate};
use num_rational::Rational64;
use num_traits::{One, Zero};

/// Reduce an angle constant into `[0, 1)` half-turns
pub fn reduce_angle(value: Rational64) -> Rational64 {
    value - value.floor()
}

fn sorted_pair(a: EntityId, b: EntityId) -> [EntityId; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

fn segments(args: &[EntityId]) -> Vec<[EntityId; 2]> {
    args.chunks(2).map(|c| sorted_pair(c[0], c[1])).collect()
}

fn flatten(segs: &[[EntityId; 2]]) -> Vec<EntityId> {
    segs.iter().flat_map(|s| s.iter().copied()).collect()
}

/// Orders of four quantities `q0..q3` preserving `q1 - q0 = q3 - q2`
const QUAD_SYMMETRIES: [[usize; 4]; 8] = [
    [0, 1, 2, 3],
    [2, 3, 0, 1],
    [1, 0, 3, 2],
    [3, 2, 1, 0],
    [0, 2, 1, 3],
    [1, 3, 0, 2],
    [2, 0, 3, 1],
    [3, 1, 2, 0],
];

const TRIANGLE_PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// Canonical argument order (and value) for a predicate application
///
/// Arity is assumed to be checked by the caller.
pub fn canonical_form(
    predicate: Predicate,
    args: &[EntityId],
    value: Option<Rational64>,
) -> (Vec<EntityId>, Option<Rational64>) {
    match predicate {
        Predicate::Coll | Predicate::Cyclic | Predicate::NColl | Predicate::Diff => {
            let mut sorted = args.to_vec();
            sorted.sort();
            (sorted, None)
        }
        Predicate::Para | Predicate::Perp | Predicate::Cong | Predicate::NPara => {
            let mut segs = segments(args);
            segs.sort();
            (flatten(&segs), None)
        }
        Predicate::Midp => {
            let [a, b] = sorted_pair(args[1], args[2]);
            (vec![args[0], a, b], None)
        }
        Predicate::Circle => {
            let mut rest = args[1..].to_vec();
            rest.sort();
            let mut out = vec![args[0]];
            out.extend(rest);
            (out, None)
        }
        Predicate::EqAngle | Predicate::EqRatio => {
            let segs = segments(args);
            let best = QUAD_SYMMETRIES
                .iter()
                .map(|order| flatten(&order.map(|i| segs[i])))
                .min()
                .unwrap_or_else(|| flatten(&segs));
            (best, None)
        }
        Predicate::AConst => {
            let segs = segments(args);
            let r = reduce_angle(value.unwrap_or_else(Rational64::zero));
            let forward = (flatten(&[segs[0], segs[1]]), r);
            let backward = (flatten(&[segs[1], segs[0]]), reduce_angle(-r));
            let (out, v) = forward.min(backward);
            (out, Some(v))
        }
        Predicate::RConst => {
            let segs = segments(args);
            let r = value.unwrap_or_else(Rational64::one);
            let forward = (flatten(&[segs[0], segs[1]]), r);
            let backward = (flatten(&[segs[1], segs[0]]), r.recip());
            let (out, v) = forward.min(backward);
            (out, Some(v))
        }
        Predicate::SimTri | Predicate::ConTri => {
            let (t1, t2) = args.split_at(3);
            let best = TRIANGLE_PERMUTATIONS
                .iter()
                .flat_map(|perm| {
                    let a: Vec<EntityId> = perm.iter().map(|i| t1[*i]).collect();
                    let b: Vec<EntityId> = perm.iter().map(|i| t2[*i]).collect();
                    [[a.clone(), b.clone()].concat(), [b, a].concat()]
                })
                .min()
                .unwrap_or_else(|| args.to_vec());
            (best, None)
        }
        Predicate::SameSide => {
            // the two angles may be swapped; each angle's arms may be swapped
            let arms = |v: &[EntityId]| {
                let [b, c] = sorted_pair(v[1], v[2]);
                vec![v[0], b, c]
            };
            let (a1, a2) = (arms(&args[..3]), arms(&args[3..]));
            let best = [a1.clone(), a2.clone()]
                .concat()
                .min([a2, a1].concat());
            (best, None)
        }
    }
}
