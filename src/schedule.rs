/// PaperTable Recompute Scheduler
///
/// Coalesces user input into single recomputation passes and orders row
/// reloads. At most one pass is pending at a time: a new submission
/// supersedes the pending one and pushes its due time back, never forward.
/// Reloads are numbered; only the response to the newest reload is
/// accepted, so a slow stale response cannot overwrite fresher rows.
///
/// Time is passed in explicitly, which keeps the scheduler independent of
/// any timer runtime.
///
/// # Examples
///
/// ```
/// use papertable::{RecomputeScheduler, Trigger};
/// use std::time::{Duration, Instant};
///
/// let mut scheduler = RecomputeScheduler::new(Duration::from_millis(200), Duration::from_millis(300));
/// let start = Instant::now();
///
/// scheduler.submit(Trigger::Toggle, start);
/// scheduler.submit(Trigger::Toggle, start + Duration::from_millis(100));
///
/// assert_eq!(scheduler.poll(start + Duration::from_millis(250)), None);
/// assert_eq!(scheduler.poll(start + Duration::from_millis(300)), Some(Trigger::Toggle));
/// assert_eq!(scheduler.poll(start + Duration::from_millis(900)), None);
/// ```

use crate::config::DebounceConfig;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What caused a recomputation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Checkbox, numeric input or sort change
    Toggle,
    /// Free-text search input
    Search,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    trigger: Trigger,
    due: Instant,
}

/// Handle of an in-flight row reload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadTicket {
    generation: u64,
}

impl ReloadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct RecomputeScheduler {
    toggle_delay: Duration,
    search_delay: Duration,
    pending: Option<Pending>,
    /// Generation of the newest reload handed out
    reload_generation: u64,
    busy: bool,
}

impl RecomputeScheduler {
    pub fn new(toggle_delay: Duration, search_delay: Duration) -> Self {
        RecomputeScheduler {
            toggle_delay,
            search_delay,
            pending: None,
            reload_generation: 0,
            busy: false,
        }
    }

    pub fn from_config(config: &DebounceConfig) -> Self {
        Self::new(config.toggle(), config.search())
    }

    pub fn delay(&self, trigger: Trigger) -> Duration {
        match trigger {
            Trigger::Toggle => self.toggle_delay,
            Trigger::Search => self.search_delay,
        }
    }

    /// Request a pass. Replaces any pending request; the new due time is
    /// `now` plus the trigger's delay, or the pending due time if later.
    /// Returns the due time.
    pub fn submit(&mut self, trigger: Trigger, now: Instant) -> Instant {
        let mut due = now + self.delay(trigger);
        if let Some(pending) = self.pending {
            if pending.due > due {
                due = pending.due;
            }
        }
        self.pending = Some(Pending { trigger, due });
        due
    }

    /// Take the pending pass if it is due
    pub fn poll(&mut self, now: Instant) -> Option<Trigger> {
        match self.pending {
            Some(pending) if now >= pending.due => {
                self.pending = None;
                Some(pending.trigger)
            }
            _ => None,
        }
    }

    /// Take the pending pass regardless of its due time
    pub fn flush(&mut self) -> Option<Trigger> {
        self.pending.take().map(|p| p.trigger)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a reload. Any reload started earlier becomes stale.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reload_generation += 1;
        self.busy = true;
        ReloadTicket {
            generation: self.reload_generation,
        }
    }

    pub fn is_current(&self, ticket: &ReloadTicket) -> bool {
        ticket.generation == self.reload_generation
    }

    /// Mark a reload finished. Returns whether its result should be applied;
    /// the busy flag clears only when the newest reload finishes.
    pub fn finish_reload(&mut self, ticket: &ReloadTicket) -> bool {
        if self.is_current(ticket) {
            self.busy = false;
            true
        } else {
            log::debug!(
                "dropping stale reload {} (newest is {})",
                ticket.generation,
                self.reload_generation
            );
            false
        }
    }

    /// A reload is in flight
    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

impl Default for RecomputeScheduler {
    fn default() -> Self {
        Self::from_config(&DebounceConfig::default())
    }
}
