//! The presentation state machine.
//!
//! One run walks `Initializing → InitialFixation → (ActivePresentation ⇄ InterTrialInterval)
//! → Complete`, or drops into `Aborted` as soon as a wait or render point sees the abort
//! token tripped. Abort is a hard stop: a phase interrupted mid-wait never gets its end
//! marker.

use std::time::Duration;

use eegstim_core::{Line, PresentationState};
use eegstim_timing::Timer;
use tracing::{debug, error, info, info_span, warn};

use crate::abort::{AbortReason, AbortToken, Interrupted};
use crate::config::ExperimentConfig;
use crate::error::{ConfigError, DriverError, MarkerError};
use crate::outcome::{RunOutcome, RunReport};
use crate::screens;
use crate::session::Session;
use crate::surface::{DisplaySurface, InputSource, MarkerSink};
use crate::wait::CooperativeWait;

/// Why `present` returned early.
enum Stop {
    Interrupted(Interrupted),
    Marker(MarkerError),
}

impl From<Interrupted> for Stop {
    fn from(value: Interrupted) -> Self {
        Stop::Interrupted(value)
    }
}

impl From<MarkerError> for Stop {
    fn from(value: MarkerError) -> Self {
        Stop::Marker(value)
    }
}

pub struct Driver<F, M, T>
where
    F: DisplaySurface + InputSource,
    M: MarkerSink,
    T: Timer<Timestamp = u64>,
{
    config: ExperimentConfig,
    session: Session,
    frontend: F,
    markers: M,
    timer: T,
    token: AbortToken,
    state: PresentationState,
    trials_completed: usize,
    markers_emitted: usize,
}

impl<F, M, T> Driver<F, M, T>
where
    F: DisplaySurface + InputSource,
    M: MarkerSink,
    T: Timer<Timestamp = u64>,
{
    pub fn new(
        config: ExperimentConfig,
        session: Session,
        frontend: F,
        markers: M,
        timer: T,
        token: AbortToken,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            session,
            frontend,
            markers,
            timer,
            token,
            state: PresentationState::default(),
            trials_completed: 0,
            markers_emitted: 0,
        })
    }

    /// Runs the session to completion or abort. Only marker transport failures are errors.
    pub fn run(mut self) -> Result<RunReport, DriverError> {
        let span = info_span!("run", seed = self.session.seed(), trials = self.session.len());
        let _guard = span.enter();

        let outcome = match self.present() {
            Ok(()) => {
                self.hold_end_screen();
                RunOutcome::Completed
            }
            Err(Stop::Interrupted(Interrupted(reason))) => {
                warn!(state = %self.state, %reason, "run aborted");
                self.transition(PresentationState::Aborted);
                RunOutcome::Aborted(reason)
            }
            Err(Stop::Marker(e)) => {
                error!(state = %self.state, error = %e, "marker transport failed");
                return Err(e.into());
            }
        };

        info!(
            trials_completed = self.trials_completed,
            markers = self.markers_emitted,
            "run finished"
        );
        Ok(RunReport {
            outcome,
            seed: self.session.seed(),
            trials_completed: self.trials_completed,
            markers_emitted: self.markers_emitted,
        })
    }

    fn present(&mut self) -> Result<(), Stop> {
        if self.config.await_start {
            let welcome = screens::welcome(
                self.session.len(),
                self.config.active_duration().as_secs_f64(),
                &self.config.labels,
            );
            self.show(&welcome)?;
            CooperativeWait::new(&self.timer, &self.token, self.config.poll_slice())
                .until(&mut self.frontend, |input| input.poll_proceed())?;
            info!("operator started the run");
        }

        self.checkpoint()?;
        self.transition(PresentationState::InitialFixation);
        self.show(&screens::fixation())?;
        self.pause(self.config.initial_fixation())?;

        loop {
            let index = self.session.cursor();
            self.checkpoint()?;
            self.transition(PresentationState::ActivePresentation { trial: index });
            self.present_trial(index)?;
            self.trials_completed += 1;

            if self.session.is_last() {
                break;
            }

            self.checkpoint()?;
            let iti = self.session.draw_iti(self.config.iti_range_ms);
            self.transition(PresentationState::InterTrialInterval { after: index });
            debug!(iti_ms = iti.as_millis() as u64, "inter-trial interval");
            self.show(&screens::fixation())?;
            self.pause(iti)?;
            self.session.advance();
        }

        self.transition(PresentationState::Complete);
        Ok(())
    }

    fn present_trial(&mut self, index: usize) -> Result<(), Stop> {
        let Some(trial) = self.session.current().cloned() else {
            return Ok(());
        };
        let condition = trial.condition();
        let progress = (index + 1, self.session.len());
        let active = self.config.active_duration();
        let countdown = self.config.show_countdown;

        let mut shown = countdown.then(|| whole_seconds(active));
        self.show(&screens::trial(&trial, progress, shown))?;

        let start = self.config.labels.start_marker(condition);
        self.emit(start)?;
        info!(trial = index + 1, ?condition, payload = ?trial.payload(), "trial started");

        CooperativeWait::new(&self.timer, &self.token, self.config.poll_slice()).wait_with(
            &mut self.frontend,
            active,
            |frontend, remaining| {
                if !countdown {
                    return Ok(());
                }
                let secs = whole_seconds(remaining);
                if shown == Some(secs) {
                    return Ok(());
                }
                shown = Some(secs);
                frontend.render(&screens::trial(&trial, progress, shown))
            },
        )?;

        let end = self.config.labels.end_marker(condition);
        self.emit(end)?;
        Ok(())
    }

    /// Completion screen. An abort here only dismisses it early.
    fn hold_end_screen(&mut self) {
        if let Err(e) = self.frontend.render(&screens::complete()) {
            warn!(error = %e, "cannot show completion screen");
            return;
        }
        let dismiss = AbortToken::new();
        let held = CooperativeWait::new(&self.timer, &dismiss, self.config.poll_slice())
            .wait(&mut self.frontend, self.config.end_screen());
        if held.is_err() {
            debug!("completion screen dismissed");
        }
    }

    fn transition(&mut self, next: PresentationState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "transition");
        self.state = next;
    }

    /// Top-of-transition cancellation point.
    fn checkpoint(&mut self) -> Result<(), Interrupted> {
        CooperativeWait::new(&self.timer, &self.token, self.config.poll_slice())
            .check(&mut self.frontend)
    }

    fn pause(&mut self, duration: Duration) -> Result<(), Interrupted> {
        CooperativeWait::new(&self.timer, &self.token, self.config.poll_slice())
            .wait(&mut self.frontend, duration)
    }

    /// Render point: refuses to draw once aborted, and turns a failed draw into an abort.
    fn show(&mut self, lines: &[Line]) -> Result<(), Interrupted> {
        self.token.check()?;
        if let Err(e) = self.frontend.render(lines) {
            self.token.abort(AbortReason::DisplayFailure(e.0));
            return self.token.check();
        }
        Ok(())
    }

    fn emit(&mut self, label: String) -> Result<(), MarkerError> {
        let timestamp = self.timer.now() as f64 / 1e9;
        self.markers.emit(&label, timestamp)?;
        self.markers_emitted += 1;
        info!(marker = %label, timestamp, "marker emitted");
        Ok(())
    }
}

/// Whole seconds left, rounded up, for the countdown caption.
fn whole_seconds(remaining: Duration) -> u64 {
    remaining.as_secs_f64().ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_millis(5000)), 5);
        assert_eq!(whole_seconds(Duration::from_millis(4990)), 5);
        assert_eq!(whole_seconds(Duration::from_millis(4000)), 4);
        assert_eq!(whole_seconds(Duration::from_millis(10)), 1);
    }
}
