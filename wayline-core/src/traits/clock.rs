//! Monotonic time source

/// Monotonic millisecond clock
///
/// The value wraps at `u32::MAX` (about 49.7 days). Consumers must compare
/// readings with wrapping subtraction.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch
    fn now_ms(&self) -> u32;
}
