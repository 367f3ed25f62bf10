use super::*;
use crate::{
    foundation::random::ScriptedRandom,
    reveal::scheduler::{ManualScheduler, TimerQueue},
};

type Machine = RevealMachine<ManualScheduler, ScriptedRandom>;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn machine(draw: f64) -> Machine {
    RevealMachine::new(
        ManualScheduler::new(),
        ScriptedRandom::constant(draw),
        RevealTimings::default(),
        0.02,
    )
}

/// Advance to `t` and pump, returning effects.
fn run_to(m: &mut Machine, t: u64) -> Vec<RevealEffect> {
    m.scheduler_mut().advance_to(ms(t));
    m.pump()
}

fn phases(log: &[PhaseChange]) -> Vec<(u64, RevealPhase)> {
    log.iter()
        .map(|c| (c.at.as_millis() as u64, c.phase))
        .collect()
}

#[test]
fn forced_win_follows_the_full_timeline() {
    let mut m = machine(0.99);
    assert!(m.start(Some(true)));
    assert_eq!(m.phase(), RevealPhase::Entering);

    assert!(run_to(&mut m, 3799).is_empty());
    assert_eq!(m.phase(), RevealPhase::Open);

    assert!(run_to(&mut m, 3800).is_empty());
    assert_eq!(m.phase(), RevealPhase::RevealedWin);
    assert!(m.show_open_box());

    assert!(run_to(&mut m, 3949).is_empty());
    assert_eq!(run_to(&mut m, 3950), vec![RevealEffect::UnlockLucky]);

    run_to(&mut m, 8199);
    assert_eq!(m.phase(), RevealPhase::RevealedWin);
    run_to(&mut m, 8200);
    assert_eq!(m.phase(), RevealPhase::Exiting);
    // The latch keeps the open box up while exiting.
    assert!(m.show_open_box());

    run_to(&mut m, 8460);
    assert_eq!(m.phase(), RevealPhase::Idle);
    assert!(!m.show_open_box());

    assert_eq!(
        phases(&m.take_log()),
        vec![
            (0, RevealPhase::Entering),
            (850, RevealPhase::Calibrating),
            (3600, RevealPhase::Open),
            (3800, RevealPhase::RevealedWin),
            (8200, RevealPhase::Exiting),
            (8460, RevealPhase::Idle),
        ]
    );
    assert!(m.session().pending_timers().is_empty());
}

#[test]
fn forced_outcome_skips_the_random_draw() {
    let mut m = machine(0.0);
    m.start(Some(false));
    run_to(&mut m, 20_000);
    assert_eq!(m.session().outcome, Some(Outcome::Lose));
    assert_eq!(m.rng_mut().draws(), 0);
}

#[test]
fn stubbed_losing_draw_always_loses_and_autocloses_at_7800() {
    for _ in 0..3 {
        let mut m = machine(0.99);
        m.start(None);
        let effects = run_to(&mut m, 10_000);
        assert!(effects.is_empty());
        assert_eq!(m.session().outcome, Some(Outcome::Lose));
        assert_eq!(
            phases(&m.take_log())[3..],
            [
                (3800, RevealPhase::RevealedLose),
                (7800, RevealPhase::Exiting),
                (8060, RevealPhase::Idle),
            ]
        );
    }
}

#[test]
fn winning_draw_below_chance_wins() {
    let mut m = machine(0.01);
    m.start(None);
    run_to(&mut m, 3800);
    assert_eq!(m.phase(), RevealPhase::RevealedWin);
    assert_eq!(m.rng_mut().draws(), 1);
}

#[test]
fn early_close_cancels_every_scheduled_transition() {
    let mut m = machine(0.0);
    m.start(Some(true));
    run_to(&mut m, 1000);
    assert_eq!(m.phase(), RevealPhase::Calibrating);

    m.close();
    assert_eq!(m.phase(), RevealPhase::Exiting);
    assert_eq!(m.session().pending_timers().len(), 1);

    let effects = run_to(&mut m, 20_000);
    assert!(effects.is_empty());
    assert_eq!(m.phase(), RevealPhase::Idle);

    let log = phases(&m.take_log());
    assert_eq!(
        log,
        vec![
            (0, RevealPhase::Entering),
            (850, RevealPhase::Calibrating),
            (1000, RevealPhase::Exiting),
            (1260, RevealPhase::Idle),
        ]
    );
    assert_eq!(m.scheduler().pending(), 0);
}

#[test]
fn start_while_active_is_a_noop() {
    let mut m = machine(0.99);
    assert!(m.start(None));
    run_to(&mut m, 900);
    assert!(!m.start(Some(true)));
    assert_eq!(m.phase(), RevealPhase::Calibrating);
    assert_eq!(m.session().forced_outcome, None);

    m.close();
    assert!(!m.start(None), "exiting still counts as active");
}

#[test]
fn close_while_idle_does_nothing() {
    let mut m = machine(0.5);
    m.close();
    assert_eq!(m.phase(), RevealPhase::Idle);
    assert_eq!(m.scheduler().pending(), 0);
    assert!(m.take_log().is_empty());
}

#[test]
fn close_while_exiting_rearms_settle() {
    let mut m = machine(0.5);
    m.start(None);
    run_to(&mut m, 100);
    m.close();
    run_to(&mut m, 300);
    m.close();
    assert_eq!(m.scheduler().pending(), 1);
    run_to(&mut m, 359);
    assert_eq!(m.phase(), RevealPhase::Exiting);
    run_to(&mut m, 560);
    assert_eq!(m.phase(), RevealPhase::Idle);
}

#[test]
fn restart_after_settle_begins_a_fresh_activation() {
    let mut m = machine(0.99);
    m.start(Some(true));
    run_to(&mut m, 9000);
    assert_eq!(m.phase(), RevealPhase::Idle);

    assert!(m.start(None));
    assert!(!m.session().win_latched);
    assert_eq!(m.session().outcome, None);
    run_to(&mut m, 9000 + 3800);
    assert_eq!(m.phase(), RevealPhase::RevealedLose);
}

#[test]
fn view_projects_phase_latch_and_headline() {
    let mut m = machine(0.99);
    assert_eq!(
        m.view(),
        RevealView {
            phase: RevealPhase::Idle,
            show_open_box: false,
            headline: ""
        }
    );
    m.start(None);
    run_to(&mut m, 3700);
    let v = m.view();
    assert_eq!(v.phase, RevealPhase::Open);
    assert!(v.show_open_box);
    assert_eq!(v.headline, "OPENING TODAY'S BLIND BOX...");
}

/// Wall-clock stand-in: `now` is wherever the clock was moved, even while late timers are
/// being handled.
#[derive(Default)]
struct LateClock {
    queue: TimerQueue<RevealEvent>,
    clock: Duration,
}

impl Scheduler for LateClock {
    fn now(&self) -> Duration {
        self.clock
    }

    fn schedule_at(&mut self, deadline: Duration, event: RevealEvent) -> TimerId {
        self.queue.push(deadline, event)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id)
    }

    fn next_due(&mut self) -> Option<Fired> {
        self.queue
            .pop_due(self.clock)
            .map(|(id, at, event)| Fired { id, at, event })
    }

    fn next_deadline(&self) -> Option<Duration> {
        None
    }
}

fn late_machine() -> RevealMachine<LateClock, ScriptedRandom> {
    RevealMachine::new(
        LateClock::default(),
        ScriptedRandom::constant(0.5),
        RevealTimings::default(),
        0.02,
    )
}

#[test]
fn late_reveal_keeps_win_offsets_from_start() {
    let mut m = late_machine();
    m.start(Some(true));

    // The reveal timer is handled 100ms late.
    m.scheduler_mut().clock = ms(3900);
    assert!(m.pump().is_empty());
    assert_eq!(m.phase(), RevealPhase::RevealedWin);

    m.scheduler_mut().clock = ms(3949);
    assert!(m.pump().is_empty());
    m.scheduler_mut().clock = ms(3950);
    assert_eq!(m.pump(), vec![RevealEffect::UnlockLucky]);

    m.scheduler_mut().clock = ms(8199);
    m.pump();
    assert_eq!(m.phase(), RevealPhase::RevealedWin);
    m.scheduler_mut().clock = ms(8200);
    m.pump();
    assert_eq!(m.phase(), RevealPhase::Exiting);
}

#[test]
fn late_reveal_keeps_lose_offset_from_start() {
    let mut m = late_machine();
    m.start(Some(false));

    m.scheduler_mut().clock = ms(4500);
    m.pump();
    assert_eq!(m.phase(), RevealPhase::RevealedLose);

    m.scheduler_mut().clock = ms(7799);
    m.pump();
    assert_eq!(m.phase(), RevealPhase::RevealedLose);
    m.scheduler_mut().clock = ms(7800);
    m.pump();
    assert_eq!(m.phase(), RevealPhase::Exiting);
}
