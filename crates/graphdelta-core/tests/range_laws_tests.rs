use graphdelta_core::errors::ExErrorKind;
use graphdelta_core::model::{DeltaState, Range};
use graphdelta_core::ExError;
use proptest::prelude::*;

#[test]
fn test_half_open_contains() {
    let r = Range::new(2, 5).unwrap();
    assert!(r.contains(2));
    assert!(r.contains(4));
    assert!(!r.contains(5));
    assert!(!r.contains(1));
}

#[test]
fn test_touching_ranges_do_not_overlap() {
    let a = Range::new(2, 5).unwrap();
    assert!(!a.overlaps(&Range::new(5, 8).unwrap()));
    assert!(Range::new(2, 6).unwrap().overlaps(&Range::new(5, 8).unwrap()));
}

#[test]
fn test_inverted_range_is_rejected() {
    let err: ExError = Range::new(5, 2).unwrap_err().into();
    assert_eq!(err.kind(), ExErrorKind::InvalidRange);
}

#[test]
fn test_compact_merges_adjacent_and_overlapping() {
    let merged = Range::compact_ranges(&[
        Range::new(5, 8).unwrap(),
        Range::new(1, 3).unwrap(),
        Range::new(3, 4).unwrap(),
        Range::new(7, 9).unwrap(),
        Range::new(6, 6).unwrap(),
    ]);
    assert_eq!(
        merged,
        vec![Range::new(1, 4).unwrap(), Range::new(5, 9).unwrap()]
    );
}

fn range() -> impl Strategy<Value = Range> {
    (0i64..50, 0i64..50).prop_map(|(a, b)| Range::new(a.min(b), a.max(b)).unwrap())
}

fn state() -> impl Strategy<Value = DeltaState> {
    prop_oneof![
        Just(DeltaState::ExactMatch),
        Just(DeltaState::Modification),
        Just(DeltaState::Addition),
        Just(DeltaState::Deletion),
    ]
}

proptest! {
    #[test]
    fn prop_overlap_is_symmetric(a in range(), b in range()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn prop_overlap_iff_shared_version(a in range(), b in range()) {
        let shared = (0..50).any(|v| a.contains(v) && b.contains(v));
        prop_assert_eq!(a.overlaps(&b), shared);
    }

    #[test]
    fn prop_intersection_contains_exactly_shared_versions(a in range(), b in range()) {
        for v in 0..50 {
            let in_both = a.contains(v) && b.contains(v);
            let in_intersection = a.intersect(&b).map(|r| r.contains(v)).unwrap_or(false);
            prop_assert_eq!(in_both, in_intersection);
        }
    }

    #[test]
    fn prop_union_covers_both(a in range(), b in range()) {
        let u = a.union(&b);
        for v in 0..50 {
            if a.contains(v) || b.contains(v) {
                prop_assert!(u.contains(v));
            }
        }
    }

    #[test]
    fn prop_merge_never_downgrades_a_change(first in state(), second in state()) {
        let merged = DeltaState::merge(Some(first), second);
        if first != DeltaState::ExactMatch {
            prop_assert_eq!(merged, first);
        } else {
            prop_assert_eq!(merged, second);
        }
    }

    #[test]
    fn prop_merge_is_idempotent(s in state()) {
        prop_assert_eq!(DeltaState::merge(Some(s), s), s);
    }
}
