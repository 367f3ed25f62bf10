use std::time::Duration;

use crate::{
    foundation::{config::RevealTimings, random::RandomSource},
    reveal::{
        phase::{Outcome, RevealPhase, Transition},
        scheduler::{Fired, RevealEvent, Scheduler, TimerId},
    },
};

/// Side effects a reveal asks its owner to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealEffect {
    /// Unlock the lucky variants and dress the avatar in them.
    UnlockLucky,
}

/// Read-only projection for whatever renders the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RevealView {
    pub phase: RevealPhase,
    pub show_open_box: bool,
    pub headline: &'static str,
}

/// One recorded phase change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseChange {
    pub at: Duration,
    pub phase: RevealPhase,
}

/// State of the current activation.
#[derive(Clone, Debug, Default)]
pub struct RevealSession {
    pub phase: RevealPhase,
    pub forced_outcome: Option<bool>,
    pub outcome: Option<Outcome>,
    /// Set on a winning reveal and held until the session settles back to idle.
    pub win_latched: bool,
    /// Timers owned by this activation, cancelled together.
    pending: Vec<TimerId>,
}

impl RevealSession {
    pub fn pending_timers(&self) -> &[TimerId] {
        &self.pending
    }
}

/// Timer-driven blind-box state machine.
///
/// Transitions are computed by [`RevealPhase::step`]; this type only owns the session, the
/// timers and the outcome draw. Call [`RevealMachine::pump`] whenever the scheduler may have
/// timers due.
pub struct RevealMachine<S, R> {
    scheduler: S,
    rng: R,
    timings: RevealTimings,
    win_chance: f64,
    session: RevealSession,
    log: Vec<PhaseChange>,
}

impl<S: Scheduler, R: RandomSource> RevealMachine<S, R> {
    pub fn new(scheduler: S, rng: R, timings: RevealTimings, win_chance: f64) -> Self {
        Self {
            scheduler,
            rng,
            timings,
            win_chance,
            session: RevealSession::default(),
            log: Vec::new(),
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.session.phase
    }

    pub fn session(&self) -> &RevealSession {
        &self.session
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Whether the opened box should be shown.
    pub fn show_open_box(&self) -> bool {
        self.session.phase.shows_open_box() || self.session.win_latched
    }

    pub fn view(&self) -> RevealView {
        RevealView {
            phase: self.session.phase,
            show_open_box: self.show_open_box(),
            headline: self.session.phase.headline(),
        }
    }

    /// Drain the recorded phase changes.
    pub fn take_log(&mut self) -> Vec<PhaseChange> {
        std::mem::take(&mut self.log)
    }

    /// Begin a session. `force_outcome` bypasses the random draw.
    ///
    /// Returns `false` without doing anything while a session is still active.
    pub fn start(&mut self, force_outcome: Option<bool>) -> bool {
        if self.session.phase.is_active() {
            tracing::debug!(phase = %self.session.phase, "reveal already active");
            return false;
        }

        self.cancel_pending();
        self.session = RevealSession {
            forced_outcome: force_outcome,
            ..RevealSession::default()
        };
        self.apply(Transition::Start);

        let t = self.timings;
        self.arm(RevealTimings::ms(t.calibrate_ms), RevealEvent::Calibrate);
        self.arm(RevealTimings::ms(t.open_ms), RevealEvent::Open);
        self.arm(RevealTimings::ms(t.reveal_ms), RevealEvent::Reveal);
        true
    }

    /// Cancel everything still pending and head back to idle through `Exiting`.
    ///
    /// Closing while already exiting re-arms the settle timer. Closing while idle does nothing.
    pub fn close(&mut self) {
        if !self.session.phase.is_active() {
            return;
        }
        self.cancel_pending();
        self.apply(Transition::Close);
        self.arm(
            RevealTimings::ms(self.timings.settle_ms),
            RevealEvent::Settle,
        );
    }

    /// Handle every timer that is due, returning the effects to apply in order.
    pub fn pump(&mut self) -> Vec<RevealEffect> {
        let mut effects = Vec::new();
        while let Some(fired) = self.scheduler.next_due() {
            self.fire(fired, &mut effects);
        }
        effects
    }

    fn fire(&mut self, fired: Fired, effects: &mut Vec<RevealEffect>) {
        let Some(pos) = self.session.pending.iter().position(|id| *id == fired.id) else {
            // Not ours: belongs to a previous activation.
            return;
        };
        self.session.pending.remove(pos);

        let t = self.timings;
        match fired.event {
            RevealEvent::Calibrate => self.apply(Transition::Calibrate),
            RevealEvent::Open => self.apply(Transition::Open),
            RevealEvent::Reveal => {
                let win = match self.session.forced_outcome {
                    Some(forced) => forced,
                    None => self.rng.chance(self.win_chance),
                };
                let outcome = Outcome::from_win(win);
                self.session.outcome = Some(outcome);
                self.apply(Transition::Reveal(outcome));
                tracing::debug!(?outcome, forced = self.session.forced_outcome.is_some(), "reveal resolved");

                // Follow-ups keep their offsets from `start`, however late this timer ran.
                let started = fired.at.saturating_sub(RevealTimings::ms(t.reveal_ms));
                if outcome.is_win() {
                    self.session.win_latched = true;
                    self.arm_at(started + RevealTimings::ms(t.unlock_ms), RevealEvent::CommitUnlock);
                    self.arm_at(started + RevealTimings::ms(t.win_close_ms), RevealEvent::AutoClose);
                } else {
                    self.arm_at(started + RevealTimings::ms(t.lose_close_ms), RevealEvent::AutoClose);
                }
            }
            RevealEvent::CommitUnlock => effects.push(RevealEffect::UnlockLucky),
            RevealEvent::AutoClose => self.close(),
            RevealEvent::Settle => {
                self.apply(Transition::Settle);
                self.session.win_latched = false;
            }
        }
    }

    fn apply(&mut self, transition: Transition) {
        let next = self.session.phase.step(transition);
        if next != self.session.phase {
            tracing::debug!(from = %self.session.phase, to = %next, "reveal phase");
            self.session.phase = next;
            self.log.push(PhaseChange {
                at: self.scheduler.now(),
                phase: next,
            });
        }
    }

    fn arm(&mut self, delay: Duration, event: RevealEvent) {
        let id = self.scheduler.schedule(delay, event);
        self.session.pending.push(id);
    }

    fn arm_at(&mut self, deadline: Duration, event: RevealEvent) {
        let id = self.scheduler.schedule_at(deadline, event);
        self.session.pending.push(id);
    }

    fn cancel_pending(&mut self) {
        for id in self.session.pending.drain(..) {
            self.scheduler.cancel(id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/machine.rs"]
mod tests;
