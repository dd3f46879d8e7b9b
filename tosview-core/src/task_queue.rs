//! Ready queue traversal
//!
//! The scheduler keeps posted tasks in a singly linked list threaded through
//! `m_next[NUM_TASKS]`, with `m_head`/`m_tail` scalars and `NO_TASK` as the
//! terminator. The links are copied while the scheduler keeps running, so
//! the walk is bounded by `NUM_TASKS` and reports cycles and wild links
//! instead of following them.

use tracing::{debug, warn};

use crate::config::InspectorConfig;
use crate::error::{CorruptedQueueError, CorruptionReason, Result};
use crate::target::{read_scalar_as, MemoryReader};
use crate::types::TaskId;

/// Result of a completed walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueWalk {
    /// Queued task ids, head first
    pub order: Vec<TaskId>,
    /// Whether the last id reached equals the tail scalar (or both are empty)
    pub tail_matches: bool,
}

/// Follow `next_links` from `head` until `sentinel`, visiting at most
/// `max_steps` ids.
pub fn walk(
    head: TaskId,
    tail: TaskId,
    next_links: &[TaskId],
    sentinel: TaskId,
    max_steps: usize,
) -> std::result::Result<QueueWalk, CorruptedQueueError> {
    let mut order: Vec<TaskId> = Vec::new();
    let mut seen = vec![false; next_links.len()];
    let mut cur = head;

    while cur != sentinel {
        let reason = if order.len() >= max_steps {
            Some(CorruptionReason::StepLimit { max_steps })
        } else if usize::from(cur) >= next_links.len() {
            Some(CorruptionReason::LinkOutOfRange {
                from: order.last().copied(),
                to: cur,
            })
        } else if seen[usize::from(cur)] {
            Some(CorruptionReason::Cycle { at: cur })
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(CorruptedQueueError {
                head,
                tail,
                reason,
                partial: order,
            });
        }

        seen[usize::from(cur)] = true;
        order.push(cur);
        cur = next_links[usize::from(cur)];
    }

    let tail_matches = match order.last() {
        Some(last) => *last == tail,
        None => tail == sentinel,
    };
    Ok(QueueWalk { order, tail_matches })
}

/// Queue header line
pub fn header(head: TaskId, tail: TaskId) -> String {
    format!("taskQ:  h: {:03}  t: {:03}", head, tail)
}

/// Chain line for the ids walked, head first
pub fn chain(order: &[TaskId]) -> String {
    match order.split_first() {
        None => "  (empty)".to_string(),
        Some((first, rest)) => {
            let mut line = format!("  {:2}", first);
            for id in rest {
                line.push_str(&format!(" -> {}", id));
            }
            line
        }
    }
}

/// Render a walk the way the queue command prints it
pub fn render(head: TaskId, tail: TaskId, walk: &QueueWalk) -> Vec<String> {
    let mut lines = vec![header(head, tail), chain(&walk.order)];
    if !walk.tail_matches {
        lines.push(format!("  (tail {} not at end of chain, queue changed while reading?)", tail));
    }
    lines
}

/// Walk the ready queue on the target
pub fn task_queue(reader: &dyn MemoryReader, config: &InspectorConfig) -> Result<Vec<String>> {
    let sym = &config.symbols.scheduler;
    let num_tasks: usize = read_scalar_as(reader, &sym.num_tasks)?;
    let no_task: TaskId = read_scalar_as(reader, &sym.no_task)?;
    let head: TaskId = read_scalar_as(reader, &sym.queue_head)?;
    let tail: TaskId = read_scalar_as(reader, &sym.queue_tail)?;

    let len = reader.array_length(&sym.queue_next)?;
    let mut links = Vec::with_capacity(len);
    for id in 0..len {
        let elem = reader.read_array_element(&sym.queue_next, id)?;
        links.push(elem.get_as::<TaskId>("value")?);
    }
    debug!("task-queue: head {} tail {} ({} tasks, {} links)", head, tail, num_tasks, len);

    let walked = walk(head, tail, &links, no_task, num_tasks).map_err(|e| {
        warn!("{}", e);
        e
    })?;
    if !walked.tail_matches {
        warn!("ready queue tail {} not reached from head {}", tail, head);
    }
    Ok(render(head, tail, &walked))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TASK: TaskId = 255;

    /// Link table of `n` entries, all pointing at NO_TASK except `pairs`
    fn links(n: usize, pairs: &[(TaskId, TaskId)]) -> Vec<TaskId> {
        let mut table = vec![NO_TASK; n];
        for (from, to) in pairs {
            table[usize::from(*from)] = *to;
        }
        table
    }

    #[test]
    fn test_walk_head_to_tail() {
        let w = walk(2, 5, &links(8, &[(2, 5), (5, NO_TASK)]), NO_TASK, 8).unwrap();
        assert_eq!(w.order, vec![2, 5]);
        assert!(w.tail_matches);
    }

    #[test]
    fn test_empty_queue() {
        let w = walk(NO_TASK, NO_TASK, &links(8, &[]), NO_TASK, 8).unwrap();
        assert!(w.order.is_empty());
        assert!(w.tail_matches);
    }

    #[test]
    fn test_full_queue_within_bound() {
        let pairs: Vec<_> = (0..7).map(|i| (i, i + 1)).collect();
        let w = walk(0, 7, &links(8, &pairs), NO_TASK, 8).unwrap();
        assert_eq!(w.order, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_cycle_detected() {
        let c = walk(2, 5, &links(8, &[(2, 5), (5, 2)]), NO_TASK, 8).unwrap_err();
        assert_eq!(c.reason, CorruptionReason::Cycle { at: 2 });
        assert_eq!(c.partial, vec![2, 5]);
        assert_eq!((c.head, c.tail), (2, 5));
    }

    #[test]
    fn test_link_out_of_range() {
        let c = walk(2, 5, &links(8, &[(2, 40)]), NO_TASK, 8).unwrap_err();
        assert_eq!(
            c.reason,
            CorruptionReason::LinkOutOfRange { from: Some(2), to: 40 }
        );
        assert_eq!(c.partial, vec![2]);

        let c = walk(9, 9, &links(8, &[]), NO_TASK, 8).unwrap_err();
        assert_eq!(c.reason, CorruptionReason::LinkOutOfRange { from: None, to: 9 });
        assert!(c.partial.is_empty());
    }

    #[test]
    fn test_step_limit() {
        // The link array is longer than the task count.
        let pairs: Vec<_> = (0..5).map(|i| (i, i + 1)).collect();
        let c = walk(0, 5, &links(6, &pairs), NO_TASK, 3).unwrap_err();
        assert_eq!(c.reason, CorruptionReason::StepLimit { max_steps: 3 });
        assert_eq!(c.partial, vec![0, 1, 2]);
    }

    #[test]
    fn test_tail_mismatch_is_advisory() {
        let w = walk(2, 9, &links(16, &[(2, 5)]), NO_TASK, 16).unwrap();
        assert_eq!(w.order, vec![2, 5]);
        assert!(!w.tail_matches);
        let lines = render(2, 9, &w);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render() {
        let w = QueueWalk {
            order: vec![2, 5, 6],
            tail_matches: true,
        };
        assert_eq!(render(2, 6, &w), vec!["taskQ:  h: 002  t: 006", "   2 -> 5 -> 6"]);

        let empty = QueueWalk {
            order: vec![],
            tail_matches: true,
        };
        assert_eq!(render(255, 255, &empty)[1], "  (empty)");
    }
}
