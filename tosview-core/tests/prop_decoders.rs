//! Property tests for ring ordering, queue walking and task durations

use proptest::prelude::*;
use tosview_core::ring::{decode, RingCursor};
use tosview_core::task_queue::walk;
use tosview_core::*;

const NO_TASK: TaskId = 255;

// ============================================================================
// Strategies
// ============================================================================

/// Ring capacity and an in-range next-write index
fn ring_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|n| (Just(n), 0..n))
}

/// Arbitrary link table: every entry is a task id, the sentinel or garbage
fn links_strategy() -> impl Strategy<Value = (Vec<TaskId>, TaskId)> {
    (1usize..16).prop_flat_map(|n| {
        let link = prop_oneof![
            (0..n as TaskId),
            Just(NO_TASK),
            (0..300u16),
        ];
        (prop::collection::vec(link, n), 0..(n as TaskId + 2))
    })
}

fn task_record_strategy() -> impl Strategy<Value = TraceRecord> {
    (0u16..4, 0i64..3, 1u32..10_000).prop_map(|(id, tag, value)| TraceRecord::new(id, tag, value))
}

// ============================================================================
// Ring ordering
// ============================================================================

proptest! {
    #[test]
    fn prop_ring_yields_capacity_items((n, i) in ring_strategy()) {
        prop_assert_eq!(decode(n, i, |s| s).count(), n);
    }

    #[test]
    fn prop_ring_oldest_and_newest((n, i) in ring_strategy()) {
        let order: Vec<usize> = decode(n, i, |s| s).collect();
        prop_assert_eq!(order[0], i);
        prop_assert_eq!(order[n - 1], (i + n - 1) % n);
        prop_assert_eq!(RingCursor::new(n, i).newest(), Some(order[n - 1]));
    }

    #[test]
    fn prop_ring_adjacent_slots((n, i) in ring_strategy()) {
        let order: Vec<usize> = decode(n, i, |s| s).collect();
        for pair in order.windows(2) {
            prop_assert_eq!(pair[1], (pair[0] + 1) % n);
        }
    }

    #[test]
    fn prop_ring_visits_every_slot_once((n, i) in ring_strategy()) {
        let mut order: Vec<usize> = decode(n, i, |s| s).collect();
        order.sort_unstable();
        prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn prop_ring_bad_index_still_terminates(n in 1usize..64, i in 64usize..10_000) {
        let order: Vec<usize> = decode(n, i, |s| s).collect();
        prop_assert_eq!(order, (0..n).collect::<Vec<_>>());
    }
}

// ============================================================================
// Queue walk
// ============================================================================

proptest! {
    #[test]
    fn prop_walk_always_terminates((links, head) in links_strategy()) {
        let max_steps = links.len();
        match walk(head, NO_TASK, &links, NO_TASK, max_steps) {
            Ok(w) => {
                prop_assert!(w.order.len() <= max_steps);
                let mut ids = w.order.clone();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), w.order.len());
            }
            Err(e) => prop_assert!(e.partial.len() <= max_steps),
        }
    }

    #[test]
    fn prop_walk_follows_links((links, head) in links_strategy()) {
        if let Ok(w) = walk(head, NO_TASK, &links, NO_TASK, links.len()) {
            if let Some(first) = w.order.first() {
                prop_assert_eq!(*first, head);
            }
            for pair in w.order.windows(2) {
                prop_assert_eq!(links[usize::from(pair[0])], pair[1]);
            }
        }
    }
}

// ============================================================================
// Task durations
// ============================================================================

proptest! {
    #[test]
    fn prop_decode_is_deterministic(records in prop::collection::vec(task_record_strategy(), 0..40)) {
        let tags = TaskTagSet { post: 0, run: 1, end: 2 };
        let run = || {
            TaskTraceDecoder::new(tags, NameResolver::default(), RunTiming::Legacy)
                .decode(records.iter().copied().enumerate())
        };
        prop_assert_eq!(run(), run());
    }

    #[test]
    fn prop_only_end_has_duration(records in prop::collection::vec(task_record_strategy(), 0..40)) {
        let tags = TaskTagSet { post: 0, run: 1, end: 2 };
        let events = TaskTraceDecoder::new(tags, NameResolver::default(), RunTiming::PerTask)
            .decode(records.iter().copied().enumerate());
        for event in events {
            prop_assert_eq!(event.duration.is_some(), event.tag == TaskTag::End);
        }
    }
}
