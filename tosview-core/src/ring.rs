//! Circular trace buffer ordering
//!
//! The target writes trace records into a fixed array and advances a
//! next-write index after each write. The slot at that index is the next one
//! to be overwritten, so once the buffer has wrapped it is also the oldest
//! live entry. Reading oldest to newest means starting at the next-write
//! index and wrapping modulo the capacity.
//!
//! Never-written slots are not distinguished from live ones. A buffer that
//! has not wrapped yet will show zeroed or stale entries; callers that know
//! how to tell can use [`RingCursor::next_write`] and
//! [`RingCursor::capacity`] to apply their own check.

use std::fmt;
use std::iter::FusedIterator;
use tracing::{debug, warn};

use crate::error::{Error, Result, TargetAccessError};
use crate::target::{MemoryReader, Symbol};
use crate::types::TraceRecord;

/// Position of a ring buffer at the time its next-write index was read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingCursor {
    capacity: usize,
    next_write: usize,
}

impl RingCursor {
    /// Create a cursor from a next-write index.
    ///
    /// An index outside `[0, capacity)` (torn or corrupted read) restarts at
    /// slot 0.
    pub fn new(capacity: usize, next_write: usize) -> Self {
        Self::restart_out_of_range(capacity, Some(next_write), next_write)
    }

    /// Create a cursor from the signed index as read off the target.
    pub fn from_raw(capacity: usize, raw: i64) -> Self {
        Self::restart_out_of_range(capacity, usize::try_from(raw).ok(), raw)
    }

    fn restart_out_of_range(capacity: usize, index: Option<usize>, raw: impl fmt::Display) -> Self {
        let next_write = match index {
            Some(i) if i < capacity => i,
            _ => {
                if capacity != 0 {
                    warn!(
                        "next-write index {} out of range for capacity {}, starting at 0",
                        raw, capacity
                    );
                }
                0
            }
        };
        Self { capacity, next_write }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot that will be overwritten next (the oldest once wrapped)
    pub fn next_write(&self) -> usize {
        self.next_write
    }

    /// Slot holding the most recent record
    pub fn newest(&self) -> Option<usize> {
        if self.capacity == 0 {
            None
        } else {
            Some((self.next_write + self.capacity - 1) % self.capacity)
        }
    }

    /// Slot indices from oldest to newest
    pub fn slots(&self) -> Slots {
        Slots {
            capacity: self.capacity,
            start: self.next_write,
            emitted: 0,
        }
    }
}

/// Iterator over slot indices of a ring, oldest first
#[derive(Debug, Clone)]
pub struct Slots {
    capacity: usize,
    start: usize,
    emitted: usize,
}

impl Iterator for Slots {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.emitted >= self.capacity {
            return None;
        }
        let slot = (self.start + self.emitted) % self.capacity;
        self.emitted += 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.capacity - self.emitted;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Slots {}

impl FusedIterator for Slots {}

/// Yield every element of a ring, oldest to newest.
///
/// The sequence is lazy, has exactly `capacity` items and depends only on
/// its inputs.
pub fn decode<T, F>(capacity: usize, next_write: usize, element_at: F) -> impl ExactSizeIterator<Item = T>
where
    F: FnMut(usize) -> T,
{
    RingCursor::new(capacity, next_write).slots().map(element_at)
}

// ============================================================================
// Trace rings on the target
// ============================================================================

/// Read the `{ num, ttype, val }` record in one slot of a trace array
pub fn read_record(
    reader: &dyn MemoryReader,
    array: &Symbol,
    slot: usize,
) -> std::result::Result<TraceRecord, TargetAccessError> {
    let elem = reader.read_array_element(array, slot)?;
    Ok(TraceRecord {
        id: elem.get_as("num")?,
        tag: elem.get("ttype")?,
        value: elem.get_as("val")?,
    })
}

/// Read a trace ring off the target and render each record, oldest first.
///
/// The next-write index is read once, then each slot is read separately.
/// If a slot read fails the lines rendered so far are returned inside
/// [`Error::Incomplete`].
pub fn render_ring<F>(
    reader: &dyn MemoryReader,
    next: &Symbol,
    array: &Symbol,
    command: &'static str,
    mut render: F,
) -> Result<Vec<String>>
where
    F: FnMut(usize, TraceRecord) -> String,
{
    let capacity = reader.array_length(array)?;
    let raw_next = reader.read_scalar(next)?;
    let cursor = RingCursor::from_raw(capacity, raw_next);
    debug!(
        "{}: {} slots, next write {} (raw {})",
        command,
        capacity,
        cursor.next_write(),
        raw_next
    );

    let mut lines = Vec::with_capacity(capacity);
    for slot in cursor.slots() {
        match read_record(reader, array, slot) {
            Ok(record) => lines.push(render(slot, record)),
            Err(source) => {
                return Err(Error::Incomplete {
                    command,
                    decoded: lines,
                    total: capacity,
                    source,
                })
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{fields, Snapshot};

    #[test]
    fn test_wraps_from_next_write() {
        let order: Vec<usize> = decode(5, 3, |i| i).collect();
        assert_eq!(order, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_start_at_zero() {
        let order: Vec<usize> = decode(4, 0, |i| i).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_ring() {
        assert_eq!(decode(0, 0, |i| i).count(), 0);
        assert_eq!(RingCursor::new(0, 7).newest(), None);
    }

    #[test]
    fn test_out_of_range_index_restarts_at_zero() {
        let cursor = RingCursor::new(4, 9);
        assert_eq!(cursor.next_write(), 0);
        assert_eq!(cursor.slots().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_raw_index() {
        assert_eq!(RingCursor::from_raw(4, 2).next_write(), 2);
        assert_eq!(RingCursor::from_raw(4, -1).next_write(), 0);
        assert_eq!(RingCursor::from_raw(4, i64::MIN).next_write(), 0);
        assert_eq!(RingCursor::from_raw(4, 4).next_write(), 0);
        assert_eq!(RingCursor::from_raw(0, -3).slots().count(), 0);
    }

    #[test]
    fn test_newest_and_len() {
        let cursor = RingCursor::new(8, 0);
        assert_eq!(cursor.newest(), Some(7));
        let mut slots = cursor.slots();
        assert_eq!(slots.len(), 8);
        slots.next();
        assert_eq!(slots.len(), 7);
    }

    #[test]
    fn test_restartable() {
        let cursor = RingCursor::new(6, 2);
        let a: Vec<_> = cursor.slots().collect();
        let b: Vec<_> = cursor.slots().collect();
        assert_eq!(a, b);
    }

    fn trace_snapshot() -> Snapshot {
        Snapshot::new().with_scalar("nxt", 1).with_array(
            "trace",
            vec![
                fields(&[("num", 1), ("ttype", 0), ("val", 10)]),
                fields(&[("num", 2), ("ttype", 0), ("val", 20)]),
                fields(&[("num", 3), ("ttype", 0), ("val", 30)]),
            ],
        )
    }

    #[test]
    fn test_render_ring_order() {
        let snap = trace_snapshot();
        let lines = render_ring(&snap, &"nxt".into(), &"trace".into(), "test", |slot, r| {
            format!("{}:{}", slot, r.id)
        })
        .unwrap();
        assert_eq!(lines, vec!["1:2", "2:3", "0:1"]);
    }

    #[test]
    fn test_render_ring_negative_index() {
        let snap = trace_snapshot().with_scalar("nxt", -1);
        let lines = render_ring(&snap, &"nxt".into(), &"trace".into(), "test", |slot, _| {
            slot.to_string()
        })
        .unwrap();
        assert_eq!(lines, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_render_ring_incomplete() {
        let snap = trace_snapshot().with_array(
            "trace",
            vec![
                fields(&[("num", 1), ("ttype", 0), ("val", 10)]),
                fields(&[("num", 2), ("ttype", 0)]),
                fields(&[("num", 3), ("ttype", 0), ("val", 30)]),
            ],
        );
        let err = render_ring(&snap, &"nxt".into(), &"trace".into(), "test", |slot, _| {
            slot.to_string()
        })
        .unwrap_err();

        match err {
            Error::Incomplete { decoded, total, source, .. } => {
                assert!(decoded.is_empty());
                assert_eq!(total, 3);
                assert!(matches!(source, TargetAccessError::MissingField { index: 1, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
