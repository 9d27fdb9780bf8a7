/// Millisecond tick that never goes backwards.
///
/// The polling loop reads it once per pass and hands the value to the
/// scheduler; actions never read it themselves.
pub trait Monotonic {
    fn now_ms(&self) -> u64;
}

impl<M: Monotonic + ?Sized> Monotonic for &M {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Saturating `now - earlier`, so a stale timestamp reads as "no time passed".
pub fn elapsed_ms(now: u64, earlier: u64) -> u64 {
    now.saturating_sub(earlier)
}

/// Duration as whole milliseconds for `DelayNs::delay_ms`, saturating.
pub fn delay_millis(d: std::time::Duration) -> u32 {
    u32::try_from(d.as_millis()).unwrap_or(u32::MAX)
}
