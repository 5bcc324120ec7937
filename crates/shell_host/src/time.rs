//! Time helpers shared across host contracts and the shell runtime.

use std::cell::Cell;
use std::time::{SystemTime, UNIX_EPOCH};

thread_local! {
    static LAST_EVENT_ORDINAL: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Returns a strictly increasing event ordinal anchored to unix milliseconds.
///
/// Link candidates are ordered by observation ordinal rather than wall time,
/// because the attribution callback and the OS initial-link check race and the
/// clock may not advance between them.
pub fn next_event_ordinal() -> u64 {
    let now = unix_time_ms_now();
    LAST_EVENT_ORDINAL.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

#[cfg(test)]
mod tests {
    use super::next_event_ordinal;

    #[test]
    fn event_ordinals_are_strictly_increasing() {
        let first = next_event_ordinal();
        let second = next_event_ordinal();
        let third = next_event_ordinal();
        assert!(first < second);
        assert!(second < third);
    }
}
