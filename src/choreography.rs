//! Active-vessel state machine with an owned auto-advance timer.

use crate::error::{Result, SceneError};
use crate::params::ChoreographyParams;

/// Repeating timer polled by the frame loop.
///
/// A single schedule at most: `start` while running keeps the current
/// deadline, and `cancel` on a stopped timer does nothing.
#[derive(Debug, Clone)]
pub struct AdvanceTimer {
    interval_s: f32,
    next_due: Option<f32>,
}

impl AdvanceTimer {
    pub fn new(interval_s: f32) -> Self {
        Self {
            interval_s,
            next_due: None,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval_s
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the timer unless it is already running
    pub fn start(&mut self, now: f32) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.interval_s);
        }
    }

    /// Re-arm from `now`, discarding any pending deadline
    pub fn restart(&mut self, now: f32) {
        self.next_due = Some(now + self.interval_s);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Returns true at most once per call when the deadline has passed.
    ///
    /// Missed intervals are not replayed: the next deadline is `now + interval`.
    pub fn poll(&mut self, now: f32) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval_s);
                true
            }
            _ => false,
        }
    }
}

/// Change of the active vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: usize,
    pub current: usize,
}

/// Which vessel is highlighted, and when to move on
#[derive(Debug, Clone)]
pub struct Choreographer {
    count: usize,
    active: usize,
    timer: AdvanceTimer,
    restart_on_input: bool,
    last_advance_time: f32,
    now: f32,
}

impl Choreographer {
    pub fn new(count: usize, params: &ChoreographyParams) -> Result<Self> {
        params.validate()?;
        if count == 0 {
            return Err(SceneError::EmptyRoster);
        }
        if params.initial_index >= count {
            return Err(SceneError::IndexOutOfRange {
                index: params.initial_index,
                count,
            });
        }
        let mut timer = AdvanceTimer::new(params.interval_s);
        if params.autoplay {
            timer.start(0.0);
        }
        Ok(Self {
            count,
            active: params.initial_index,
            timer,
            restart_on_input: params.suppress_tick_after_input,
            last_advance_time: 0.0,
            now: 0.0,
        })
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        index == self.active
    }

    pub fn vessel_count(&self) -> usize {
        self.count
    }

    pub fn timer(&self) -> &AdvanceTimer {
        &self.timer
    }

    /// Time of the most recent change of the active vessel
    pub fn last_advance_time(&self) -> f32 {
        self.last_advance_time
    }

    pub fn advance(&mut self) -> ActiveChange {
        self.manual_input();
        self.set_active((self.active + 1) % self.count)
    }

    pub fn retreat(&mut self) -> ActiveChange {
        self.manual_input();
        self.set_active((self.active + self.count - 1) % self.count)
    }

    pub fn select(&mut self, index: usize) -> Result<ActiveChange> {
        if index >= self.count {
            return Err(SceneError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }
        self.manual_input();
        Ok(self.set_active(index))
    }

    /// Automatic advance; identical to `advance` but never restarts the timer
    pub fn on_timer_tick(&mut self) -> ActiveChange {
        self.set_active((self.active + 1) % self.count)
    }

    /// Poll the timer at `now`; fires at most one tick
    pub fn update(&mut self, now: f32) -> Option<ActiveChange> {
        self.now = now;
        if self.timer.poll(now) {
            let change = self.on_timer_tick();
            log::debug!("Auto-advance to vessel {}", change.current);
            Some(change)
        } else {
            None
        }
    }

    /// Resume automatic advancing from `now`
    pub fn play(&mut self, now: f32) {
        self.now = now;
        self.timer.start(now);
    }

    /// Stop automatic advancing; idempotent
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    fn manual_input(&mut self) {
        if self.restart_on_input && self.timer.is_running() {
            self.timer.restart(self.now);
        }
    }

    fn set_active(&mut self, index: usize) -> ActiveChange {
        let change = ActiveChange {
            previous: self.active,
            current: index,
        };
        self.active = index;
        self.last_advance_time = self.now;
        change
    }
}
