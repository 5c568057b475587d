//! Per-channel temporal debouncing

/// Tracks how long a channel's condition has held continuously
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTimer {
    started_at_ms: Option<u64>,
}

/// Outcome of one debouncer update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debounced {
    pub sustained: bool,
    pub timer: ChannelTimer,
}

impl ChannelTimer {
    /// Timer that has been running since `started_at_ms`
    pub fn running_since(started_at_ms: u64) -> Self {
        Self { started_at_ms: Some(started_at_ms) }
    }

    pub fn started_at_ms(&self) -> Option<u64> {
        self.started_at_ms
    }

    pub fn is_running(&self) -> bool {
        self.started_at_ms.is_some()
    }

    /// Continuous duration so far, zero when not running
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.started_at_ms
            .map(|start| now_ms.saturating_sub(start))
            .unwrap_or(0)
    }

    /// Advance in place, returning whether the condition is sustained
    pub fn advance(&mut self, condition: bool, now_ms: u64, dwell_ms: u64) -> bool {
        let Debounced { sustained, timer } = update(*self, condition, now_ms, dwell_ms);
        *self = timer;
        sustained
    }
}

/// Feed one observation of a channel's instantaneous condition.
///
/// A false observation clears the timer outright. The first true observation
/// only starts it, so a single qualifying frame is never sustained. After
/// that the channel is sustained once strictly more than `dwell_ms` has
/// passed since the start.
pub fn update(timer: ChannelTimer, condition: bool, now_ms: u64, dwell_ms: u64) -> Debounced {
    if !condition {
        return Debounced { sustained: false, timer: ChannelTimer::default() };
    }

    match timer.started_at_ms {
        None => Debounced { sustained: false, timer: ChannelTimer::running_since(now_ms) },
        Some(start) => Debounced {
            sustained: now_ms.saturating_sub(start) > dwell_ms,
            timer,
        },
    }
}
