//! Virtual timer descriptor table

use tracing::{debug, warn};

use crate::config::InspectorConfig;
use crate::error::{Result, TargetAccessError};
use crate::names::NameResolver;
use crate::target::{read_scalar_as, MemoryReader};
use crate::types::{TimerDescriptor, TimerId};

pub const HEADER: &str = "   t  state       t0        dt       max";

/// One row per timer id, preceded by [`HEADER`]
///
/// Timer ids are 16 bits wide; descriptors past the last id are not shown.
pub fn dump(descriptors: &[TimerDescriptor], names: &NameResolver) -> Vec<String> {
    if descriptors.len() > usize::from(TimerId::MAX) + 1 {
        warn!(
            "timer table has {} entries, showing the first {}",
            descriptors.len(),
            usize::from(TimerId::MAX) + 1
        );
    }
    let mut rows = vec![HEADER.to_string()];
    for (id, t) in (0..=TimerId::MAX).zip(descriptors) {
        rows.push(format!(
            "  {:2}    {}{}  {:8x}  {:8x}  {:8x}  {}",
            id,
            if t.is_oneshot { 'O' } else { 'o' },
            if t.is_running { 'R' } else { 'r' },
            t.t0,
            t.dt,
            t.fired_max_us,
            names.resolve(id)
        ));
    }
    rows
}

/// Read the descriptor table off the target and render it
pub fn timer_dump(reader: &dyn MemoryReader, config: &InspectorConfig) -> Result<Vec<String>> {
    let sym = &config.symbols.timers;
    let count: TimerId = read_scalar_as(reader, &sym.num_timers)?;
    let len = reader.array_length(&sym.descriptors)?;
    if usize::from(count) > len {
        return Err(TargetAccessError::CountExceedsArray {
            count: sym.num_timers.to_string(),
            value: usize::from(count),
            array: sym.descriptors.to_string(),
            len,
        }
        .into());
    }
    debug!("timer-dump: {} timers", count);

    let mut descriptors = Vec::with_capacity(usize::from(count));
    for id in 0..usize::from(count) {
        let elem = reader.read_array_element(&sym.descriptors, id)?;
        descriptors.push(TimerDescriptor {
            t0: elem.get_as("t0")?,
            dt: elem.get_as("dt")?,
            fired_max_us: elem.get_as("fired_max_us")?,
            is_oneshot: elem.get_flag("isoneshot")?,
            is_running: elem.get_flag("isrunning")?,
        });
    }
    Ok(dump(&descriptors, &config.timer_names()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimerSymbols;
    use crate::error::Error;
    use crate::names::NameOverrides;
    use crate::snapshot::{fields, Snapshot};

    #[test]
    fn test_dump_rows() {
        let timers = [
            TimerDescriptor {
                t0: 0x100,
                dt: 0x400,
                fired_max_us: 0x1f,
                is_oneshot: false,
                is_running: true,
            },
            TimerDescriptor {
                is_oneshot: true,
                ..Default::default()
            },
        ];
        let rows = dump(&timers, &NameResolver::new(NameOverrides::new().with(0, "blink")));

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], HEADER);
        assert_eq!(rows[1], "   0    oR       100       400        1f  blink/0");
        assert_eq!(rows[2], "   1    Or         0         0         0  t1");
    }

    #[test]
    fn test_dump_empty() {
        assert_eq!(dump(&[], &NameResolver::default()), vec![HEADER.to_string()]);
    }

    #[test]
    fn test_dump_stops_at_last_timer_id() {
        let timers = vec![TimerDescriptor::default(); usize::from(TimerId::MAX) + 3];
        let rows = dump(&timers, &NameResolver::default());
        assert_eq!(rows.len(), usize::from(TimerId::MAX) + 2);
        assert!(rows[rows.len() - 1].ends_with("  t65535"));
    }

    fn descriptor_table(num_timers: i64, entries: usize) -> Snapshot {
        let sym = TimerSymbols::default();
        let row = fields(&[
            ("t0", 0),
            ("dt", 0),
            ("fired_max_us", 0),
            ("isoneshot", 0),
            ("isrunning", 0),
        ]);
        Snapshot::new()
            .with_scalar(sym.num_timers.as_str(), num_timers)
            .with_array(sym.descriptors.as_str(), vec![row; entries])
    }

    #[test]
    fn test_garbage_count_is_an_error() {
        let err = timer_dump(&descriptor_table(i64::MAX, 0), &InspectorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Target(TargetAccessError::ValueOutOfRange { value: i64::MAX, .. })
        ));

        let err = timer_dump(&descriptor_table(-1, 0), &InspectorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Target(TargetAccessError::ValueOutOfRange { .. })));
    }

    #[test]
    fn test_count_beyond_array_is_an_error() {
        let err = timer_dump(&descriptor_table(5, 2), &InspectorConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Target(TargetAccessError::CountExceedsArray { value: 5, len: 2, .. })
        ));
    }

    #[test]
    fn test_count_below_array_length() {
        let rows = timer_dump(&descriptor_table(1, 4), &InspectorConfig::default()).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
