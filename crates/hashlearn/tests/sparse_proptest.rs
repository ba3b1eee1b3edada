//! Property-based tests for the sparse vector algebra.

use approx::assert_relative_eq;
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;

use hashlearn::SparseVector;

const MAX_INDEX: u32 = 64;

fn arb_entries() -> impl Strategy<Value = Vec<(u32, f64)>> {
    prop_vec((0..MAX_INDEX, -100.0..100.0f64), 0..32)
}

fn dense(v: &SparseVector) -> Vec<f64> {
    let mut out = vec![0.0; MAX_INDEX as usize];
    for (i, x) in v.iter() {
        out[i as usize] = x;
    }
    out
}

proptest! {
    #[test]
    fn dot_is_symmetric(a in arb_entries(), b in arb_entries()) {
        let a: SparseVector = a.into_iter().collect();
        let b: SparseVector = b.into_iter().collect();
        assert_relative_eq!(a.dot(&b), b.dot(&a), max_relative = 1e-12, epsilon = 1e-9);
    }

    #[test]
    fn sparse_dot_matches_dense(a in arb_entries(), b in arb_entries()) {
        let a: SparseVector = a.into_iter().collect();
        let b: SparseVector = b.into_iter().collect();
        let expected: f64 = dense(&a).iter().zip(dense(&b)).map(|(x, y)| x * y).sum();
        assert_relative_eq!(a.dot(&b), expected, max_relative = 1e-9, epsilon = 1e-6);
        assert_relative_eq!(a.dot_dense(&dense(&b)), expected, max_relative = 1e-9, epsilon = 1e-6);
    }

    #[test]
    fn squared_norm_is_self_dot(a in arb_entries()) {
        let a: SparseVector = a.into_iter().collect();
        assert_relative_eq!(a.squared_l2_norm(), a.dot(&a), max_relative = 1e-12, epsilon = 1e-9);
        prop_assert!(a.squared_l2_norm() >= 0.0);
    }

    #[test]
    fn add_scaled_matches_dense(a in arb_entries(), b in arb_entries(), s in -10.0..10.0f64) {
        let mut a: SparseVector = a.into_iter().collect();
        let b: SparseVector = b.into_iter().collect();
        let mut expected = dense(&a);
        for (x, y) in expected.iter_mut().zip(dense(&b)) {
            *x += s * y;
        }
        a.add_scaled(&b, s);
        for (got, want) in dense(&a).iter().zip(&expected) {
            assert_relative_eq!(*got, *want, max_relative = 1e-12, epsilon = 1e-9);
        }
    }

    #[test]
    fn last_write_wins(entries in arb_entries()) {
        let v: SparseVector = entries.iter().copied().collect();
        for &(i, _) in &entries {
            let last = entries.iter().rev().find(|&&(j, _)| j == i).map(|&(_, x)| x);
            prop_assert_eq!(Some(v.get(i)), last);
        }
    }
}
