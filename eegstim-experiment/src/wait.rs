//! Abort-responsive waiting.
//!
//! A wait never blocks for its full duration. It computes its deadline once, then loops:
//! service input, compare the monotonic clock with the deadline, sleep one bounded slice.
//! Abort latency is therefore at most one slice, whatever the requested duration.

use std::time::Duration;

use eegstim_timing::Timer;

pub use crate::abort::Interrupted;
use crate::abort::{AbortReason, AbortToken};
use crate::error::DisplayError;
use crate::surface::InputSource;

pub struct CooperativeWait<'a, T> {
    timer: &'a T,
    token: &'a AbortToken,
    slice: Duration,
}

impl<'a, T> CooperativeWait<'a, T>
where
    T: Timer<Timestamp = u64>,
{
    pub fn new(timer: &'a T, token: &'a AbortToken, slice: Duration) -> Self {
        Self {
            timer,
            token,
            slice,
        }
    }

    /// Polls input once and fails if the token is now tripped.
    pub fn check<I: InputSource + ?Sized>(&self, input: &mut I) -> Result<(), Interrupted> {
        if let Some(reason) = input.poll_abort() {
            self.token.abort(reason);
        }
        self.guard()
    }

    /// Fails if the token is tripped, without polling input.
    pub fn guard(&self) -> Result<(), Interrupted> {
        self.token.check()
    }

    pub fn wait<I: InputSource + ?Sized>(
        &self,
        input: &mut I,
        duration: Duration,
    ) -> Result<(), Interrupted> {
        self.wait_with(input, duration, |_, _| Ok(()))
    }

    /// Like [`wait`](Self::wait), calling `tick` with the time left on every iteration.
    /// A failing tick trips the token as a display failure.
    pub fn wait_with<I, F>(
        &self,
        input: &mut I,
        duration: Duration,
        mut tick: F,
    ) -> Result<(), Interrupted>
    where
        I: InputSource + ?Sized,
        F: FnMut(&mut I, Duration) -> Result<(), DisplayError>,
    {
        let start = self.timer.now();
        loop {
            self.check(input)?;
            let elapsed = self.timer.elapsed(start);
            if elapsed >= duration {
                return Ok(());
            }
            let remaining = duration - elapsed;
            if let Err(e) = tick(input, remaining) {
                self.token.abort(AbortReason::DisplayFailure(e.0));
                return self.guard();
            }
            self.timer.sleep(remaining.min(self.slice));
        }
    }

    /// Waits, without a deadline, until `ready` reports true.
    pub fn until<I, F>(&self, input: &mut I, mut ready: F) -> Result<(), Interrupted>
    where
        I: InputSource + ?Sized,
        F: FnMut(&mut I) -> bool,
    {
        loop {
            self.check(input)?;
            if ready(input) {
                return Ok(());
            }
            self.timer.sleep(self.slice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eegstim_timing::{HighPrecisionTimer, ManualTimer};
    use std::time::Instant;

    /// Reports an abort once the shared clock passes `at`.
    struct AbortAfter<T> {
        timer: T,
        at: Duration,
        polls: usize,
    }

    impl<T: Timer<Timestamp = u64>> InputSource for AbortAfter<T> {
        fn poll_abort(&mut self) -> Option<AbortReason> {
            self.polls += 1;
            (self.timer.elapsed(0) >= self.at).then_some(AbortReason::OperatorRequested)
        }
    }

    struct Quiet;

    impl InputSource for Quiet {
        fn poll_abort(&mut self) -> Option<AbortReason> {
            None
        }
    }

    #[test]
    fn test_wait_runs_to_deadline() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        waiter.wait(&mut Quiet, Duration::from_millis(2000)).unwrap();
        assert_eq!(timer.now(), 2_000_000_000);
    }

    #[test]
    fn test_last_slice_is_clipped_to_deadline() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        waiter.wait(&mut Quiet, Duration::from_millis(25)).unwrap();
        assert_eq!(timer.now(), 25_000_000);
    }

    #[test]
    fn test_abort_returns_within_one_slice() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let slice = Duration::from_millis(10);
        let mut input = AbortAfter {
            timer: timer.clone(),
            at: Duration::from_millis(300),
            polls: 0,
        };
        let waiter = CooperativeWait::new(&timer, &token, slice);

        let err = waiter
            .wait(&mut input, Duration::from_secs(2))
            .unwrap_err();

        assert_eq!(err, Interrupted(AbortReason::OperatorRequested));
        let returned_at = timer.elapsed(0);
        assert!(returned_at >= Duration::from_millis(300));
        assert!(returned_at <= Duration::from_millis(300) + slice);
        assert!(input.polls > 1);
    }

    #[test]
    fn test_abort_latency_on_real_clock() {
        let timer = HighPrecisionTimer::new();
        let token = AbortToken::new();
        let mut input = AbortAfter {
            timer: timer.clone(),
            at: Duration::from_millis(300),
            polls: 0,
        };
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));

        let started = Instant::now();
        assert!(waiter.wait(&mut input, Duration::from_secs(2)).is_err());
        assert!(started.elapsed() < Duration::from_millis(800));
    }

    #[test]
    fn test_pre_tripped_token_fails_immediately() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        token.abort(AbortReason::DisplayClosed);
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        let err = waiter.wait(&mut Quiet, Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.0, AbortReason::DisplayClosed);
        assert_eq!(timer.now(), 0);
    }

    #[test]
    fn test_failing_tick_becomes_display_failure() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        let err = waiter
            .wait_with(&mut Quiet, Duration::from_secs(1), |_, _| {
                Err(DisplayError("surface lost".into()))
            })
            .unwrap_err();
        assert_eq!(
            err.0,
            AbortReason::DisplayFailure("surface lost".to_string())
        );
    }

    #[test]
    fn test_tick_sees_shrinking_remaining_time() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        let mut seen = Vec::new();
        waiter
            .wait_with(&mut Quiet, Duration::from_millis(30), |_, left| {
                seen.push(left);
                Ok(())
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                Duration::from_millis(30),
                Duration::from_millis(20),
                Duration::from_millis(10)
            ]
        );
    }

    #[test]
    fn test_until_waits_for_ready() {
        let timer = ManualTimer::new();
        let token = AbortToken::new();
        let waiter = CooperativeWait::new(&timer, &token, Duration::from_millis(10));
        let mut calls = 0;
        waiter
            .until(&mut Quiet, |_| {
                calls += 1;
                calls == 4
            })
            .unwrap();
        assert_eq!(timer.now(), 30_000_000);
    }
}
