use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap},
    time::{Duration, Instant},
};

/// Deferred work a reveal session schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RevealEvent {
    Calibrate,
    Open,
    Reveal,
    CommitUnlock,
    AutoClose,
    Settle,
}

/// Handle of one scheduled event, used for cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A timer whose deadline has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    /// Deadline the timer was scheduled for, on the scheduler's clock.
    pub at: Duration,
    pub event: RevealEvent,
}

/// Time source plus cancellable one-shot timers.
///
/// `next_due` hands back expired timers one at a time in deadline order (ties in scheduling
/// order); the owner handles each before asking for the next, so a handler may schedule or
/// cancel timers that would fall due in the same pump.
pub trait Scheduler {
    /// Current time on this scheduler's clock.
    fn now(&self) -> Duration;
    /// Schedule `event` for an absolute `deadline` on this clock. A deadline already in the past
    /// fires on the next `next_due`.
    fn schedule_at(&mut self, deadline: Duration, event: RevealEvent) -> TimerId;
    /// Schedule `event` to fire `delay` after [`Scheduler::now`].
    fn schedule(&mut self, delay: Duration, event: RevealEvent) -> TimerId {
        let deadline = self.now() + delay;
        self.schedule_at(deadline, event)
    }
    /// Cancel a pending timer. Returns `false` if it already fired or was cancelled.
    fn cancel(&mut self, id: TimerId) -> bool;
    /// Pop the earliest expired timer, if any.
    fn next_due(&mut self) -> Option<Fired>;
    /// Deadline of the earliest pending timer.
    fn next_deadline(&self) -> Option<Duration>;
}

/// Min-heap of deadlines with lazy cancellation.
#[derive(Debug)]
pub struct TimerQueue<E> {
    heap: BinaryHeap<Reverse<(Duration, u64)>>,
    pending: HashMap<u64, E>,
    next_seq: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, deadline: Duration, event: E) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((deadline, seq)));
        self.pending.insert(seq, event);
        TimerId(seq)
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id.0).is_some()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest live deadline. Drops cancelled heads on the way.
    pub fn peek_deadline(&mut self) -> Option<Duration> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((d, _))| *d)
    }

    /// Pop the earliest live entry if its deadline is `<= now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerId, Duration, E)> {
        self.discard_cancelled();
        let Reverse((deadline, seq)) = *self.heap.peek()?;
        if deadline > now {
            return None;
        }
        self.heap.pop();
        let event = self.pending.remove(&seq)?;
        Some((TimerId(seq), deadline, event))
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, seq))) = self.heap.peek() {
            if self.pending.contains_key(seq) {
                break;
            }
            self.heap.pop();
        }
    }

    fn live_min(&self) -> Option<Duration> {
        self.heap
            .iter()
            .filter(|Reverse((_, seq))| self.pending.contains_key(seq))
            .map(|Reverse((d, _))| *d)
            .min()
    }
}

/// Virtual clock driven explicitly with [`ManualScheduler::advance`].
///
/// While expired timers are being drained, `now` reads as the deadline of the timer being
/// handled, so follow-up timers are scheduled relative to the exact firing time.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    queue: TimerQueue<RevealEvent>,
    horizon: Duration,
    firing: Option<Duration>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `by` more time elapse. Timers become due on the next `next_due` calls.
    pub fn advance(&mut self, by: Duration) {
        self.horizon += by;
    }

    /// Let time elapse up to `t`. Never moves backwards.
    pub fn advance_to(&mut self, t: Duration) {
        self.horizon = self.horizon.max(t);
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.firing.unwrap_or(self.horizon)
    }

    fn schedule_at(&mut self, deadline: Duration, event: RevealEvent) -> TimerId {
        self.queue.push(deadline, event)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id)
    }

    fn next_due(&mut self) -> Option<Fired> {
        match self.queue.pop_due(self.horizon) {
            Some((id, at, event)) => {
                self.firing = Some(at);
                Some(Fired { id, at, event })
            }
            None => {
                self.firing = None;
                None
            }
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.live_min()
    }
}

/// Wall-clock scheduler measured from its creation.
#[derive(Debug)]
pub struct SystemScheduler {
    queue: TimerQueue<RevealEvent>,
    origin: Instant,
}

impl Default for SystemScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemScheduler {
    pub fn new() -> Self {
        Self {
            queue: TimerQueue::new(),
            origin: Instant::now(),
        }
    }

    /// Block the current thread until the earliest timer is due. Returns `false` when nothing
    /// is pending.
    pub fn wait_for_next(&self) -> bool {
        let Some(deadline) = self.next_deadline() else {
            return false;
        };
        let now = self.now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        true
    }
}

impl Scheduler for SystemScheduler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn schedule_at(&mut self, deadline: Duration, event: RevealEvent) -> TimerId {
        self.queue.push(deadline, event)
    }

    fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.cancel(id)
    }

    fn next_due(&mut self) -> Option<Fired> {
        let now = self.now();
        self.queue
            .pop_due(now)
            .map(|(id, at, event)| Fired { id, at, event })
    }

    fn next_deadline(&self) -> Option<Duration> {
        self.queue.live_min()
    }
}
