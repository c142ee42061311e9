//! Reducer views: lookup, merge order and final values
use crate::common::*;
use forkrace_engine::features::reducers::{merge_tables, ViewEntry, ViewTable};
use forkrace_engine::{AccessProps, Detector, DetectorError, ReducerOps};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

const KEY: u64 = 0x5000;
const SIZE: usize = 8;

/// `*view(KEY) += delta` as the instrumented program would perform it
fn add(detector: &mut Detector, heap: &TestHeap, ops: &Arc<SumOps>, instr: u64, delta: i64) {
    let view = detector
        .hyper_lookup(id(instr), KEY, SIZE, ops.clone())
        .unwrap();
    detector
        .load(id(instr + 1), view, SIZE, SIZE, AccessProps::plain())
        .unwrap();
    heap.add_int(view, delta);
    detector
        .store(id(instr + 2), view, SIZE, SIZE, AccessProps::plain())
        .unwrap();
}

fn append(detector: &mut Detector, heap: &TestHeap, ops: &Arc<ConcatOps>, instr: u64, s: &str) {
    let view = detector
        .hyper_lookup(id(instr), KEY, SIZE, ops.clone())
        .unwrap();
    heap.push_str(view, s);
    detector
        .store(id(instr + 1), view, SIZE, SIZE, AccessProps::plain())
        .unwrap();
}

#[test]
fn test_lookup_without_parallelism_returns_leftmost() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });

    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();
    let view = detector.hyper_lookup(id(2), KEY, SIZE, ops).unwrap();

    assert_eq!(view, KEY);
    assert_eq!(heap.allocations(), 0);
}

#[test]
fn test_spawned_child_uses_leftmost_and_continuation_gets_view() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();

    detector.detach(id(2), 0).unwrap();
    let child_view = detector.hyper_lookup(id(3), KEY, SIZE, ops.clone()).unwrap();
    detector.detach_continue(id(2), 0).unwrap();
    let cont_view = detector.hyper_lookup(id(4), KEY, SIZE, ops.clone()).unwrap();
    let again = detector.hyper_lookup(id(5), KEY, SIZE, ops).unwrap();

    assert_eq!(child_view, KEY);
    assert_ne!(cont_view, KEY);
    assert_eq!(again, cont_view);
    assert_eq!(heap.live_views(), 1);

    detector.sync(id(6), 0).unwrap();
    assert_eq!(heap.live_views(), 0);
    detector.finish().unwrap();
}

#[test]
fn test_reducer_sum_matches_serial_sum() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    heap.set_int(KEY, 0);
    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();

    let mut expected = 0;
    for i in 1..=6 {
        detector.detach(id(10), 0).unwrap();
        add(&mut detector, &heap, &ops, 20, i);
        detector.detach_continue(id(10), 0).unwrap();
        add(&mut detector, &heap, &ops, 30, 100 * i);
        expected += i + 100 * i;
    }
    detector.sync(id(40), 0).unwrap();
    detector
        .load(id(41), KEY, SIZE, SIZE, AccessProps::plain())
        .unwrap();
    let summary = detector.finish().unwrap();

    assert_eq!(heap.int(KEY), expected);
    assert_eq!(summary.distinct_races, 0);
    assert_eq!(heap.live_views(), 0);
}

#[test]
fn test_leftmost_access_races_without_reducer() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });

    // Same accesses as a reducer update, but the continuation bypasses the lookup
    detector.detach(id(10), 0).unwrap();
    add(&mut detector, &heap, &ops, 20, 1);
    detector.detach_continue(id(10), 0).unwrap();
    detector
        .store(id(30), KEY, SIZE, SIZE, AccessProps::plain())
        .unwrap();
    detector.sync(id(40), 0).unwrap();
    let summary = detector.finish().unwrap();

    // Both the child's load and its store race with the bypassing store
    assert_eq!(summary.distinct_races, 2);
    assert!(summary.races.iter().all(|entry| entry.record.second.id == id(30)));
}

#[test]
fn test_concat_preserves_program_order() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(ConcatOps { heap: heap.clone() });
    heap.set_string(KEY, "");
    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();

    detector.detach(id(10), 0).unwrap();
    append(&mut detector, &heap, &ops, 20, "1");
    detector.detach_continue(id(10), 0).unwrap();
    append(&mut detector, &heap, &ops, 30, "2");
    detector.detach(id(11), 0).unwrap();
    append(&mut detector, &heap, &ops, 40, "3");
    detector.detach_continue(id(11), 0).unwrap();
    append(&mut detector, &heap, &ops, 50, "4");
    detector.sync(id(60), 0).unwrap();
    let summary = detector.finish().unwrap();

    assert_eq!(heap.string(KEY), "1234");
    assert!(!summary.has_races());
}

#[test]
fn test_nested_parallel_loops_with_stack_frames() {
    const OUTER: usize = 4;
    const INNER: usize = 5;
    const HIGH: u64 = 0x9000;
    const LOW: u64 = 0x8f00;

    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    heap.set_int(KEY, 0);
    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();

    let mut expected = 0;
    detector.loop_begin(id(100)).unwrap();
    for i in 0..OUTER {
        detector.iteration_begin(id(100)).unwrap();
        detector.push_stack_frame(HIGH, LOW).unwrap();
        detector
            .store(id(101), LOW + 8, 8, 8, AccessProps::captured_stack())
            .unwrap();

        detector.loop_begin(id(110)).unwrap();
        for j in 0..INNER {
            detector.iteration_begin(id(110)).unwrap();
            let delta = (i * INNER + j) as i64;
            add(&mut detector, &heap, &ops, 111, delta);
            expected += delta;
            detector.iteration_end(id(110)).unwrap();
        }
        detector.loop_end(id(110), 0).unwrap();
        detector.sync(id(120), 0).unwrap();

        detector.pop_stack_frame().unwrap();
        detector.iteration_end(id(100)).unwrap();
    }
    detector.loop_end(id(100), 0).unwrap();
    detector.sync(id(130), 0).unwrap();
    let summary = detector.finish().unwrap();

    assert_eq!(heap.int(KEY), expected);
    assert_eq!(summary.distinct_races, 0);
    assert_eq!(heap.live_views(), 0);
    assert_eq!(detector.frame_depth(), 1);
}

#[test]
fn test_unregister_discards_private_view() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    heap.set_int(KEY, 7);
    detector.reducer_register(id(1), KEY, SIZE, ops.clone()).unwrap();

    detector.detach(id(2), 0).unwrap();
    detector.detach_continue(id(2), 0).unwrap();
    add(&mut detector, &heap, &ops, 10, 5);
    assert_eq!(heap.live_views(), 1);

    detector.reducer_unregister(id(20), KEY).unwrap();
    assert_eq!(heap.live_views(), 0);

    detector.sync(id(30), 0).unwrap();
    detector.finish().unwrap();
    assert_eq!(heap.int(KEY), 7);
}

#[test]
fn test_register_over_private_view_releases_it() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    heap.set_int(KEY, 7);

    detector.detach(id(1), 0).unwrap();
    detector.detach_continue(id(1), 0).unwrap();
    add(&mut detector, &heap, &ops, 10, 5);
    assert_eq!(heap.live_views(), 1);

    detector.reducer_register(id(20), KEY, SIZE, ops.clone()).unwrap();
    assert_eq!(heap.live_views(), 0);

    detector.sync(id(30), 0).unwrap();
    let summary = detector.finish().unwrap();
    assert_eq!(summary.distinct_races, 0);
    assert_eq!(heap.live_views(), 0);
    assert_eq!(heap.int(KEY), 7);
}

#[test]
fn test_view_allocation_failure_poisons_detector() {
    let (mut detector, heap) = detector();
    let ops = Arc::new(SumOps { heap: heap.clone() });
    heap.fail_after(0);

    detector.detach(id(1), 0).unwrap();
    detector.detach_continue(id(1), 0).unwrap();
    let err = detector.hyper_lookup(id(2), KEY, SIZE, ops).unwrap_err();
    assert!(matches!(err, DetectorError::ResourceExhausted { .. }));

    let err = detector.sync(id(3), 0).unwrap_err();
    assert!(matches!(err, DetectorError::ModelViolation { .. }));
}

// ============================================================================
// Table merges
// ============================================================================

fn table(heap: &TestHeap, ops: &Arc<dyn ReducerOps>, view: u64, value: i64) -> ViewTable {
    heap.set_int(view, value);
    let mut table = ViewTable::new();
    table.insert(
        KEY,
        ViewEntry {
            view,
            size: SIZE,
            ops: ops.clone(),
        },
    );
    table
}

fn surviving_view(table: &ViewTable) -> u64 {
    table.get(KEY).map(|entry| entry.view).unwrap()
}

#[test]
fn test_non_associative_merge_is_a_left_fold_in_program_order() {
    let heap = TestHeap::new();
    let ops: Arc<dyn ReducerOps> = Arc::new(SubtractOps { heap: heap.clone() });

    // ((a - b) - c)
    let ab = merge_tables(table(&heap, &ops, 0xa0, 100), table(&heap, &ops, 0xb0, 10)).unwrap();
    let abc = merge_tables(ab.table, table(&heap, &ops, 0xc0, 1)).unwrap();
    assert_eq!(surviving_view(&abc.table), 0xa0);
    assert_eq!(heap.int(0xa0), 89);

    // (a - (b - c)) differs: callers must only rely on associative operations
    let bc = merge_tables(table(&heap, &ops, 0xb0, 10), table(&heap, &ops, 0xc0, 1)).unwrap();
    let abc = merge_tables(table(&heap, &ops, 0xa0, 100), bc.table).unwrap();
    assert_eq!(surviving_view(&abc.table), 0xa0);
    assert_eq!(heap.int(0xa0), 91);
}

#[test]
fn test_merge_keeps_the_larger_table_and_left_view() {
    let heap = TestHeap::new();
    let ops: Arc<dyn ReducerOps> = Arc::new(ConcatOps { heap: heap.clone() });
    heap.set_string(0xa0, "a");
    heap.set_string(0xb0, "b");

    let mut left = ViewTable::new();
    left.insert(KEY, ViewEntry { view: 0xa0, size: SIZE, ops: ops.clone() });
    let mut right = ViewTable::new();
    right.insert(KEY, ViewEntry { view: 0xb0, size: SIZE, ops: ops.clone() });
    right.insert(0x6000, ViewEntry { view: 0xc0, size: SIZE, ops: ops.clone() });
    right.insert(0x7000, ViewEntry { view: 0xd0, size: SIZE, ops });

    let outcome = merge_tables(left, right).unwrap();

    assert_eq!(outcome.table.len(), 3);
    assert_eq!(surviving_view(&outcome.table), 0xa0);
    assert_eq!(heap.string(0xa0), "ab");
    assert_eq!(outcome.retired.len(), 1);
    assert_eq!(outcome.retired[0].view, 0xb0);
}

proptest! {
    /// Every association of an ordered sequence of sum views yields the same total
    #[test]
    fn prop_merge_association_does_not_change_sum(
        values in prop::collection::vec(-1000i64..1000, 4),
        shape in 0usize..5,
    ) {
        let heap = TestHeap::new();
        let ops: Arc<dyn ReducerOps> = Arc::new(SumOps { heap: heap.clone() });
        let views = [0xa0, 0xb0, 0xc0, 0xd0];
        let t = |i: usize| table(&heap, &ops, views[i], values[i]);
        let m = |l: ViewTable, r: ViewTable| merge_tables(l, r).unwrap().table;

        let merged = match shape {
            0 => m(m(m(t(0), t(1)), t(2)), t(3)),
            1 => m(m(t(0), m(t(1), t(2))), t(3)),
            2 => m(t(0), m(m(t(1), t(2)), t(3))),
            3 => m(t(0), m(t(1), m(t(2), t(3)))),
            _ => m(m(t(0), t(1)), m(t(2), t(3))),
        };

        prop_assert_eq!(surviving_view(&merged), 0xa0);
        prop_assert_eq!(heap.int(0xa0), values.iter().sum::<i64>());
    }
}
