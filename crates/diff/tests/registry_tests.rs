use diff_model::{
    ChangeEvent, ChangeId, ChangeRegistry, ChangeSet, ComparisonError, ContentsEqual, DiffSide,
    DiffType, Fragment, FragmentError, LineRange, MergeConflictType, RediffStatus, Side,
    ThreeSide, Validity,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn two_way_set(fragments: &[((usize, usize), (usize, usize))]) -> ChangeSet<Side> {
    ChangeSet::two_way(
        fragments
            .iter()
            .map(|&(l, r)| Fragment::two_way(LineRange::new(l.0, l.1), LineRange::new(r.0, r.1)))
            .collect(),
    )
}

/// Modified at 1, inserted at 4, deleted at 7 (left coordinates)
fn sample_set() -> ChangeSet<Side> {
    two_way_set(&[((1, 2), (1, 2)), ((4, 4), (4, 6)), ((7, 9), (9, 9))])
}

fn events(rx: &flume::Receiver<ChangeEvent>) -> String {
    rx.try_iter()
        .map(|event| event.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[test]
fn test_new_registry_is_empty_and_unknown() {
    let registry = ChangeRegistry::<Side>::new();

    assert!(registry.is_empty());
    assert_eq!(registry.generation(), 0);
    assert_eq!(registry.contents_equal(), ContentsEqual::Unknown);
    assert!(registry.first_change().is_none());
}

#[test]
fn test_set_changes_builds_ordered_generation() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();

    assert_eq!(registry.generation(), 1);
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.contents_equal(), ContentsEqual::NotEqual);

    let ids: Vec<ChangeId> = registry.changes().map(|change| change.id()).collect();
    assert_eq!(
        ids,
        (0..3)
            .map(|index| ChangeId {
                generation: 1,
                index
            })
            .collect::<Vec<_>>()
    );

    let starts: Vec<usize> = registry
        .changes()
        .map(|change| change.start(Side::PRIMARY))
        .collect();
    assert_eq!(starts, vec![1, 4, 7]);
}

#[test]
fn test_empty_set_means_equal_contents() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(ChangeSet::empty()).unwrap();

    assert!(registry.is_empty());
    assert_eq!(registry.contents_equal(), ContentsEqual::Equal);
}

#[test]
fn test_destroy_change_is_idempotent() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();
    let id = registry.first_change().unwrap().id();

    assert!(registry.destroy_change(id));
    assert!(!registry.destroy_change(id));

    // the tombstone stays addressable, active iteration skips it
    assert_eq!(registry.change(id).unwrap().validity(), Validity::Destroyed);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.all_changes().len(), 3);
    assert_eq!(registry.first_change().unwrap().index(), 1);
}

#[test]
fn test_ids_from_older_generations_resolve_to_nothing() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();
    let old = registry.first_change().unwrap().id();

    registry.set_changes(sample_set()).unwrap();

    assert!(registry.change(old).is_none());
    assert!(!registry.destroy_change(old));
    assert!(!registry.set_excluded(old, true));
    assert!(!registry.skip_change(old));
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_events_follow_the_lifecycle() {
    let mut registry = ChangeRegistry::<Side>::new();
    let rx = registry.subscribe();

    registry
        .set_changes(two_way_set(&[((1, 2), (1, 2)), ((4, 5), (4, 5))]))
        .unwrap();
    insta::assert_snapshot!(events(&rx), @"added #0@1, added #1@1");

    let first = registry.first_change().unwrap().id();
    registry.destroy_change(first);
    registry.destroy_change(first);
    insta::assert_snapshot!(events(&rx), @"destroyed #0@1");

    registry.handle_before_document_change(Side::Left, LineRange::new(4, 5), 0);
    insta::assert_snapshot!(events(&rx), @"invalidated #1@1");

    registry
        .set_changes(two_way_set(&[((2, 3), (2, 3))]))
        .unwrap();
    insta::assert_snapshot!(events(&rx), @"destroyed #1@1, added #0@2");
}

#[test]
fn test_dropped_subscribers_are_pruned() {
    let mut registry = ChangeRegistry::<Side>::new();
    let dropped = registry.subscribe();
    let kept = registry.subscribe();
    drop(dropped);

    registry.set_changes(sample_set()).unwrap();

    let received: Vec<ChangeEvent> = kept.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(received
        .iter()
        .all(|event| matches!(event, ChangeEvent::Added(_))));
}

#[test]
fn test_navigation() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();

    let index = |change: Option<&diff_model::Change<Side>>| change.map(|change| change.index());

    assert_eq!(index(registry.first_change()), Some(0));
    assert_eq!(index(registry.last_change()), Some(2));

    assert_eq!(index(registry.next_change(Side::Left, 0)), Some(0));
    assert_eq!(index(registry.next_change(Side::Left, 1)), Some(1));
    assert_eq!(index(registry.next_change(Side::Left, 7)), None);
    assert_eq!(index(registry.next_change(Side::Right, 4)), Some(2));

    assert_eq!(index(registry.prev_change(Side::Left, 1)), None);
    assert_eq!(index(registry.prev_change(Side::Left, 3)), Some(0));
    assert_eq!(index(registry.prev_change(Side::Left, 8)), Some(1));
    assert_eq!(index(registry.prev_change(Side::Left, 20)), Some(2));
}

#[test]
fn test_skipped_and_invalid_changes_are_not_navigable() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();

    let second = registry.all_changes()[1].id();
    assert!(registry.skip_change(second));
    assert!(registry.change(second).unwrap().is_skipped());
    assert_eq!(
        registry.next_change(Side::Left, 1).map(|change| change.index()),
        Some(2)
    );

    // damage the last change
    registry.handle_before_document_change(Side::Left, LineRange::new(7, 8), 0);
    assert_eq!(
        registry.last_change().map(|change| change.index()),
        Some(0)
    );
    assert_eq!(registry.valid_changes().count(), 2);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_exclusion_flag() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();
    let id = registry.first_change().unwrap().id();

    assert!(registry.set_excluded(id, true));
    assert!(registry.change(id).unwrap().is_excluded());
    assert!(registry.set_excluded(id, false));
    assert!(!registry.change(id).unwrap().is_excluded());

    registry.destroy_change(id);
    assert!(!registry.set_excluded(id, true));
}

fn merge_fragment(left: (usize, usize), base: (usize, usize), right: (usize, usize)) -> Fragment<ThreeSide> {
    Fragment::merge(
        LineRange::new(left.0, left.1),
        LineRange::new(base.0, base.1),
        LineRange::new(right.0, right.1),
    )
}

fn merge_set() -> ChangeSet<ThreeSide> {
    ChangeSet::merge(
        vec![
            merge_fragment((1, 2), (1, 1), (1, 1)),
            merge_fragment((3, 4), (2, 3), (2, 3)),
            merge_fragment((5, 6), (4, 5), (4, 5)),
        ],
        vec![
            MergeConflictType::new(DiffType::Inserted, true, false, false).unwrap(),
            MergeConflictType::new(DiffType::Modified, true, true, false).unwrap(),
            MergeConflictType::new(DiffType::Modified, true, true, true).unwrap(),
        ],
    )
    .unwrap()
}

#[test]
fn test_three_way_counts() {
    let mut registry = ChangeRegistry::<ThreeSide>::new();
    registry.set_changes(merge_set()).unwrap();

    assert_eq!(registry.changes_count(), 2);
    assert_eq!(registry.conflicts_count(), 1);

    let conflict = registry.all_changes()[1].id();
    registry.destroy_change(conflict);
    assert_eq!(registry.conflicts_count(), 0);
    assert_eq!(registry.changes_count(), 2);
}

#[test]
fn test_result_relative_view_inverts_once_per_toggle() {
    let mut registry = ChangeRegistry::<ThreeSide>::new();
    registry.set_changes(merge_set()).unwrap();
    let first = registry.all_changes()[0].id();
    assert_eq!(registry.change(first).unwrap().diff_type(), DiffType::Inserted);

    registry.set_result_relative(true);
    registry.set_result_relative(true);
    let change = registry.change(first).unwrap();
    assert_eq!(change.diff_type(), DiffType::Deleted);
    assert_eq!(change.conflict_type().diff_type(), DiffType::Deleted);
    assert!(change.is_change(ThreeSide::Left));
    assert!(!change.is_change(ThreeSide::Right));

    registry.set_result_relative(false);
    assert_eq!(registry.change(first).unwrap().diff_type(), DiffType::Inserted);
}

#[test]
fn test_new_generation_honours_result_relative_view() {
    let mut registry = ChangeRegistry::<ThreeSide>::new();
    registry.set_result_relative(true);
    registry.set_changes(merge_set()).unwrap();

    assert!(registry.is_result_relative());
    assert_eq!(
        registry.first_change().map(|change| change.diff_type()),
        Some(DiffType::Deleted)
    );
}

#[test]
fn test_stale_rediff_is_discarded() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();

    let ticket = registry.begin_rediff();
    registry.handle_before_document_change(Side::Right, LineRange::new(0, 0), 1);
    assert!(!registry.is_current(ticket));

    let status = registry.apply_rediff(ticket, Ok(ChangeSet::empty())).unwrap();
    assert_eq!(status, RediffStatus::Stale);
    assert_eq!(registry.generation(), 1);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_newer_rediff_request_wins() {
    let mut registry = ChangeRegistry::<Side>::new();

    let older = registry.begin_rediff();
    let newer = registry.begin_rediff();

    assert_eq!(
        registry.apply_rediff(older, Ok(sample_set())).unwrap(),
        RediffStatus::Stale
    );
    assert_eq!(
        registry.apply_rediff(newer, Ok(sample_set())).unwrap(),
        RediffStatus::Applied { changes: 3 }
    );
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_too_large_clears_to_a_flag() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();

    let ticket = registry.begin_rediff();
    let status = registry
        .apply_rediff(
            ticket,
            Err(ComparisonError::TooLarge {
                lines: 10,
                limit: 5,
                equal: false,
            }),
        )
        .unwrap();

    assert_eq!(status, RediffStatus::TooLarge);
    assert!(registry.is_empty());
    assert_eq!(registry.contents_equal(), ContentsEqual::NotEqual);

    let ticket = registry.begin_rediff();
    registry
        .apply_rediff(
            ticket,
            Err(ComparisonError::TooLarge {
                lines: 10,
                limit: 5,
                equal: true,
            }),
        )
        .unwrap();
    assert_eq!(registry.contents_equal(), ContentsEqual::Equal);
}

#[test]
fn test_cancelled_rediff_keeps_previous_state() {
    let mut registry = ChangeRegistry::<Side>::new();
    registry.set_changes(sample_set()).unwrap();
    let id = registry.first_change().unwrap().id();

    let ticket = registry.begin_rediff();
    let status = registry
        .apply_rediff(ticket, Err(ComparisonError::Cancelled))
        .unwrap();

    assert_eq!(status, RediffStatus::Cancelled);
    assert_eq!(registry.generation(), 1);
    assert!(registry.change(id).unwrap().is_valid());
}

#[test]
fn test_malformed_rediff_is_an_error() {
    let mut registry = ChangeRegistry::<Side>::new();
    let ticket = registry.begin_rediff();

    let result = registry.apply_rediff(ticket, Ok(two_way_set(&[((2, 1), (0, 0))])));
    assert!(matches!(result, Err(FragmentError::InvertedRange { .. })));
    assert_eq!(registry.generation(), 0);
}

/// Ordered, non-overlapping two-way fragments built from gaps and lengths
fn arbitrary_set() -> impl Strategy<Value = ChangeSet<Side>> {
    prop::collection::vec((1usize..4, 0usize..4, 1usize..4, 0usize..4), 0..12).prop_map(
        |parts| {
            let (mut left, mut right) = (0, 0);
            let fragments = parts
                .into_iter()
                .map(|(left_gap, left_len, right_gap, right_len)| {
                    let right_len = if left_len == 0 && right_len == 0 { 1 } else { right_len };
                    left += left_gap;
                    right += right_gap;
                    let fragment = Fragment::two_way(
                        LineRange::with_len(left, left_len),
                        LineRange::with_len(right, right_len),
                    );
                    left += left_len;
                    right += right_len;
                    fragment
                })
                .collect();
            ChangeSet::two_way(fragments)
        },
    )
}

fn assert_ordered(registry: &ChangeRegistry<Side>) -> Result<(), TestCaseError> {
    let valid: Vec<_> = registry.valid_changes().collect();
    for pair in valid.windows(2) {
        for &side in Side::ALL {
            prop_assert!(pair[0].end(side) <= pair[1].start(side));
        }
    }
    for change in registry.changes() {
        for &side in Side::ALL {
            prop_assert!(change.start(side) <= change.end(side));
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_fresh_registry_is_ordered(set in arbitrary_set()) {
        let mut registry = ChangeRegistry::<Side>::new();
        prop_assert!(registry.set_changes(set).is_ok());
        assert_ordered(&registry)?;
    }

    #[test]
    fn prop_edits_keep_valid_changes_ordered(
        set in arbitrary_set(),
        edits in prop::collection::vec((any::<bool>(), 0usize..60, 0usize..5, 0usize..5), 0..20),
    ) {
        let mut registry = ChangeRegistry::<Side>::new();
        registry.set_changes(set).unwrap();

        for (left, start, len, new_len) in edits {
            let side = if left { Side::Left } else { Side::Right };
            let shift = new_len as isize - len as isize;
            registry.handle_before_document_change(side, LineRange::with_len(start, len), shift);
            assert_ordered(&registry)?;
        }
    }
}
