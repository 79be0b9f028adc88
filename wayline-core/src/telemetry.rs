//! Telemetry scheduling
//!
//! Three independent interval timers drive unsolicited frames:
//! - Heartbeat (`HB`), default every 5 s
//! - Arrival (`ARR`), default every 10 s
//! - Delay (`DL`), default every 30 s
//!
//! All comparisons use wrapping subtraction so a millisecond clock that
//! rolls over at `u32::MAX` keeps firing on schedule.

use heapless::Vec;

use wayline_protocol::MessageType;

use crate::config::TelemetryConfig;

/// Telemetry stream identifiers, in polling order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryStream {
    Heartbeat,
    Arrival,
    Delay,
}

impl TelemetryStream {
    /// TYPE field used by this stream
    pub fn message_type(self) -> MessageType {
        match self {
            TelemetryStream::Heartbeat => MessageType::Heartbeat,
            TelemetryStream::Arrival => MessageType::Arrival,
            TelemetryStream::Delay => MessageType::Delay,
        }
    }
}

/// Periodic timer against a wrapping millisecond clock
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalTimer {
    interval_ms: u32,
    last_fire_ms: u32,
}

impl IntervalTimer {
    /// Create a timer whose first period starts at `now_ms`
    pub fn new(interval_ms: u32, now_ms: u32) -> Self {
        Self {
            interval_ms,
            last_fire_ms: now_ms,
        }
    }

    /// Fire if at least one interval has elapsed since the last fire
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if now_ms.wrapping_sub(self.last_fire_ms) >= self.interval_ms {
            self.last_fire_ms = now_ms;
            true
        } else {
            false
        }
    }
}

/// Timers for all telemetry streams
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryScheduler {
    heartbeat: IntervalTimer,
    arrival: IntervalTimer,
    delay: IntervalTimer,
}

impl TelemetryScheduler {
    /// Create the scheduler at boot time `now_ms`
    pub fn new(config: &TelemetryConfig, now_ms: u32) -> Self {
        Self {
            heartbeat: IntervalTimer::new(config.heartbeat_ms, now_ms),
            arrival: IntervalTimer::new(config.arrival_ms, now_ms),
            delay: IntervalTimer::new(config.delay_ms, now_ms),
        }
    }

    /// Streams due at `now_ms`, in heartbeat/arrival/delay order
    pub fn poll(&mut self, now_ms: u32) -> Vec<TelemetryStream, 3> {
        let mut due = Vec::new();
        if self.heartbeat.poll(now_ms) {
            let _ = due.push(TelemetryStream::Heartbeat);
        }
        if self.arrival.poll(now_ms) {
            let _ = due.push(TelemetryStream::Arrival);
        }
        if self.delay.poll(now_ms) {
            let _ = due.push(TelemetryStream::Delay);
        }
        due
    }
}
