//! Busy-wait strategies for polled DMA completion.
//!
//! The CPU spins on the engine's busy flags. [`Spin`] waits forever, which is
//! what a one-shot bring-up test on real silicon does. [`SpinWithTimeout`]
//! gives up after a time budget measured with an [`embedded_hal::delay::DelayNs`]
//! provider, so host tests can run against a stuck engine without hanging.

use embedded_hal::delay::DelayNs;

/// The wait gave up before the condition became true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitTimeout {
    /// Number of times the condition was polled.
    pub polls: u32,
    /// Time budget that was exhausted, in microseconds.
    pub elapsed_us: u32,
}

/// How to wait for a condition on a single thread.
pub trait WaitStrategy {
    /// Poll `done` until it returns `true`. Returns how many polls it took.
    fn wait_until<F: FnMut() -> bool>(&mut self, done: F) -> Result<u32, WaitTimeout>;
}

impl<W: WaitStrategy + ?Sized> WaitStrategy for &mut W {
    fn wait_until<F: FnMut() -> bool>(&mut self, done: F) -> Result<u32, WaitTimeout> {
        (**self).wait_until(done)
    }
}

/// Unbounded spin. An unresponsive engine hangs the caller forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct Spin;

impl WaitStrategy for Spin {
    fn wait_until<F: FnMut() -> bool>(&mut self, mut done: F) -> Result<u32, WaitTimeout> {
        let mut polls: u32 = 0;
        loop {
            polls = polls.saturating_add(1);
            if done() {
                return Ok(polls);
            }
            core::hint::spin_loop();
        }
    }
}

/// Spin with a delay between polls, giving up after `timeout_us`.
///
/// Elapsed time is the sum of the requested delays, so it is a lower bound on
/// wall time. With a no-op delay provider the budget becomes a poll count,
/// which is how host tests use it.
pub struct SpinWithTimeout<D> {
    delay: D,
    poll_interval_us: u32,
    timeout_us: u32,
}

impl<D: DelayNs> SpinWithTimeout<D> {
    /// Create a bounded wait. A zero poll interval is treated as 1 µs.
    pub fn new(delay: D, poll_interval_us: u32, timeout_us: u32) -> Self {
        Self {
            delay,
            poll_interval_us: poll_interval_us.max(1),
            timeout_us,
        }
    }

    /// Give the delay provider back.
    pub fn free(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> WaitStrategy for SpinWithTimeout<D> {
    fn wait_until<F: FnMut() -> bool>(&mut self, mut done: F) -> Result<u32, WaitTimeout> {
        let mut polls: u32 = 0;
        let mut elapsed_us: u32 = 0;
        loop {
            polls = polls.saturating_add(1);
            if done() {
                return Ok(polls);
            }
            if elapsed_us >= self.timeout_us {
                return Err(WaitTimeout { polls, elapsed_us });
            }
            self.delay.delay_us(self.poll_interval_us);
            elapsed_us = elapsed_us.saturating_add(self.poll_interval_us);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    #[test]
    fn spin_returns_once_condition_holds() {
        let mut remaining = 5;
        let polls = Spin
            .wait_until(|| {
                remaining -= 1;
                remaining == 0
            })
            .unwrap();
        assert_eq!(polls, 5);
    }

    #[test]
    fn spin_with_timeout_succeeds_within_budget() {
        let mut wait = SpinWithTimeout::new(NoopDelay::new(), 10, 100);
        let mut remaining = 3;
        let polls = wait
            .wait_until(|| {
                remaining -= 1;
                remaining == 0
            })
            .unwrap();
        assert_eq!(polls, 3);
    }

    #[test]
    fn spin_with_timeout_gives_up_on_stuck_condition() {
        let mut wait = SpinWithTimeout::new(NoopDelay::new(), 10, 100);
        let err = wait.wait_until(|| false).unwrap_err();
        // One poll at t=0 plus one after each of the ten 10 µs delays.
        assert_eq!(err, WaitTimeout { polls: 11, elapsed_us: 100 });
    }

    #[test]
    fn zero_interval_still_terminates() {
        let mut wait = SpinWithTimeout::new(NoopDelay::new(), 0, 3);
        let err = wait.wait_until(|| false).unwrap_err();
        assert_eq!(err.polls, 4);
    }
}
