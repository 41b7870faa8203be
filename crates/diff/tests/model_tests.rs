use diff_model::{
    ChangeRegistry, ChangeSet, DiffType, Fragment, FragmentError, LineRange, MergeConflictType,
    Side, ThreeSide, Validity,
};
use pretty_assertions::assert_eq;

fn two_way(left: (usize, usize), right: (usize, usize)) -> Fragment<Side> {
    Fragment::two_way(
        LineRange::new(left.0, left.1),
        LineRange::new(right.0, right.1),
    )
}

#[test]
fn test_line_range_basics() {
    let range = LineRange::new(5, 8);

    assert_eq!(range.len(), 3);
    assert!(!range.is_empty());
    assert!(range.contains(5));
    assert!(range.contains(7));
    assert!(!range.contains(8));
    assert_eq!(range.to_range(), 5..8);
    assert_eq!(LineRange::from(5..8), range);
    assert_eq!(LineRange::with_len(5, 3), range);
    assert_eq!(range.to_string(), "[5, 8)");

    let empty = LineRange::empty(3);
    assert!(empty.is_empty());
    assert!(empty.is_well_formed());
    assert_eq!(empty.len(), 0);
    assert!(!LineRange::new(4, 2).is_well_formed());
}

#[test]
fn test_line_range_shift_clamps_at_zero() {
    assert_eq!(LineRange::new(5, 8).shifted(-1), LineRange::new(4, 7));
    assert_eq!(LineRange::new(5, 8).shifted(3), LineRange::new(8, 11));
    assert_eq!(LineRange::new(2, 3).shifted(-10), LineRange::new(0, 0));
}

#[test]
fn test_diff_type_inversion_is_a_swap() {
    assert_eq!(DiffType::Inserted.inverted(), DiffType::Deleted);
    assert_eq!(DiffType::Deleted.inverted(), DiffType::Inserted);
    assert_eq!(DiffType::Modified.inverted(), DiffType::Modified);

    for diff_type in [DiffType::Inserted, DiffType::Deleted, DiffType::Modified] {
        assert_eq!(diff_type.inverted().inverted(), diff_type);
    }
}

#[test]
fn test_two_way_diff_types() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry
        .set_changes(ChangeSet::two_way(vec![
            two_way((1, 2), (1, 3)),
            two_way((4, 4), (5, 6)),
            two_way((6, 8), (8, 8)),
        ]))
        .unwrap();

    let types: Vec<DiffType> = registry.changes().map(|change| change.diff_type()).collect();
    assert_eq!(
        types,
        vec![DiffType::Modified, DiffType::Inserted, DiffType::Deleted]
    );
}

#[test]
fn test_change_accessors() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry
        .set_changes(ChangeSet::two_way(vec![two_way((5, 8), (5, 6))]))
        .unwrap();

    let change = registry.first_change().unwrap();
    assert_eq!(change.index(), 0);
    assert_eq!(change.start(Side::Left), 5);
    assert_eq!(change.end(Side::Left), 8);
    assert_eq!(change.range(Side::Right), LineRange::new(5, 6));
    assert_eq!(change.ranges(), &[LineRange::new(5, 8), LineRange::new(5, 6)]);
    assert_eq!(change.validity(), Validity::Valid);
    assert!(change.is_valid());
    assert!(!change.is_excluded());
    assert!(!change.is_skipped());
    assert!(!change.is_empty_on(Side::Right));
    assert!(change.inner_fragments().is_none());
}

#[test]
fn test_fragment_cardinality_is_checked() {
    let err = Fragment::<Side>::from_ranges(vec![LineRange::new(0, 1)]).unwrap_err();
    assert_eq!(
        err,
        FragmentError::Cardinality {
            expected: 2,
            actual: 1
        }
    );

    let fragment = Fragment::<ThreeSide>::from_ranges(vec![
        LineRange::new(0, 1),
        LineRange::new(0, 0),
        LineRange::new(0, 1),
    ])
    .unwrap();
    assert_eq!(fragment.range(ThreeSide::Base), LineRange::empty(0));
}

#[test]
fn test_inverted_range_is_rejected() {
    let mut registry = ChangeRegistry::<Side>::new();
    let result = registry.set_changes(ChangeSet::two_way(vec![two_way((3, 2), (0, 1))]));

    assert_eq!(
        result,
        Err(FragmentError::InvertedRange {
            index: 0,
            side: "Left".to_string(),
            start: 3,
            end: 2,
        })
    );
}

#[test]
fn test_unordered_fragments_are_rejected() {
    let set = ChangeSet::two_way(vec![two_way((5, 6), (5, 6)), two_way((1, 2), (1, 2))]);

    assert_eq!(
        set.validate(),
        Err(FragmentError::Unordered {
            index: 1,
            side: "Left".to_string(),
        })
    );
}

#[test]
fn test_overlapping_fragments_are_rejected() {
    let set = ChangeSet::two_way(vec![two_way((1, 3), (1, 3)), two_way((3, 4), (2, 4))]);

    assert_eq!(
        set.validate(),
        Err(FragmentError::Overlapping {
            index: 1,
            side: "Right".to_string(),
        })
    );
}

#[test]
fn test_fragment_empty_on_every_side_is_rejected() {
    let set = ChangeSet::two_way(vec![two_way((2, 2), (3, 3))]);
    assert_eq!(set.validate(), Err(FragmentError::Empty { index: 0 }));
}

#[test]
fn test_merge_set_needs_one_conflict_per_fragment() {
    let fragment = Fragment::merge(
        LineRange::new(1, 2),
        LineRange::new(1, 2),
        LineRange::new(1, 2),
    );
    let err = ChangeSet::merge(vec![fragment], Vec::<MergeConflictType>::new()).unwrap_err();

    assert_eq!(
        err,
        FragmentError::DetailsMismatch {
            fragments: 1,
            details: 0
        }
    );
}

#[test]
fn test_rejected_set_keeps_previous_generation() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry
        .set_changes(ChangeSet::two_way(vec![two_way((1, 2), (1, 2))]))
        .unwrap();
    let id = registry.first_change().unwrap().id();

    let result = registry.set_changes(ChangeSet::two_way(vec![two_way((3, 1), (1, 2))]));

    assert!(result.is_err());
    assert_eq!(registry.generation(), 1);
    assert_eq!(registry.len(), 1);
    assert!(registry.change(id).unwrap().is_valid());
}

#[test]
fn test_error_messages() {
    insta::assert_snapshot!(
        FragmentError::Overlapping { index: 2, side: "Base".to_string() },
        @"fragment 2 overlaps the previous fragment on Base"
    );
    insta::assert_snapshot!(
        FragmentError::Empty { index: 0 },
        @"fragment 0 is empty on every side"
    );
}
