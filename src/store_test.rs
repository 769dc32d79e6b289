use super::*;
use crate::test_helpers::{committed_stroke, stroke_ids};

fn permutations(items: &[StrokeId]) -> Vec<Vec<StrokeId>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for (idx, head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(idx);
        for mut tail in permutations(&rest) {
            tail.insert(0, *head);
            out.push(tail);
        }
    }
    out
}

#[test]
fn insert_if_absent_reports_first_insert_only() {
    let mut store = StrokeStore::new();
    assert!(store.insert_if_absent(committed_stroke(4)));
    assert!(!store.insert_if_absent(committed_stroke(4)));
    assert_eq!(store.len(), 1);
}

#[test]
fn inserting_twice_matches_inserting_once() {
    let mut once = StrokeStore::new();
    once.insert_if_absent(committed_stroke(9));

    let mut twice = StrokeStore::new();
    twice.insert_if_absent(committed_stroke(9));
    twice.insert_if_absent(committed_stroke(9));

    assert_eq!(once.snapshot(), twice.snapshot());
}

#[test]
fn duplicate_id_keeps_first_copy() {
    let mut store = StrokeStore::new();
    let first = committed_stroke(2);
    let mut second = committed_stroke(2);
    second.width = 49;

    store.insert_if_absent(first.clone());
    store.insert_if_absent(second);

    assert_eq!(store.get(2), Some(&first));
}

#[test]
fn snapshot_order_is_independent_of_arrival_order() {
    let ids = [5, 1, 8, 3];
    let expected = vec![1, 3, 5, 8];
    for order in permutations(&ids) {
        let mut store = StrokeStore::new();
        for id in &order {
            store.insert_if_absent(committed_stroke(*id));
        }
        assert_eq!(stroke_ids(store.iter()), expected, "arrival order {order:?}");
    }
}

#[test]
fn own_stroke_converges_regardless_of_which_copy_arrives_first() {
    let from_commit = committed_stroke(7);
    let from_feed = committed_stroke(7);

    let mut commit_first = StrokeStore::new();
    assert!(commit_first.insert_if_absent(from_commit.clone()));
    assert!(!commit_first.insert_if_absent(from_feed.clone()));

    let mut feed_first = StrokeStore::new();
    assert!(feed_first.insert_if_absent(from_feed));
    assert!(!feed_first.insert_if_absent(from_commit));

    assert_eq!(commit_first.snapshot(), feed_first.snapshot());
    assert_eq!(stroke_ids(commit_first.iter()), vec![7]);
}

#[test]
fn provisional_stroke_is_never_stored() {
    let mut store = StrokeStore::new();
    assert!(!store.insert_if_absent(committed_stroke(0)));
    assert!(store.is_empty());
}

#[test]
fn initialize_sorts_bootstrap_set_ascending() {
    let mut store = StrokeStore::new();
    let inserted = store.initialize(vec![committed_stroke(3), committed_stroke(1)]);
    assert_eq!(inserted, 2);
    assert_eq!(stroke_ids(store.iter()), vec![1, 3]);
    assert_eq!(store.last_id(), Some(3));
}

#[test]
fn initialize_drops_invalid_and_duplicate_strokes() {
    let mut empty_points = committed_stroke(6);
    empty_points.points.clear();

    let mut store = StrokeStore::new();
    let inserted = store.initialize(vec![
        committed_stroke(2),
        empty_points,
        committed_stroke(2),
        committed_stroke(0),
    ]);

    assert_eq!(inserted, 1);
    assert!(store.contains(2));
    assert!(!store.contains(6));
}

#[test]
fn empty_store_has_no_last_id() {
    let store = StrokeStore::new();
    assert!(store.is_empty());
    assert_eq!(store.last_id(), None);
}
