//! The host's cooperative timer contract.
//!
//! Hosts that own a main thread expose some way to run a callback on it every
//! so often. The bridge only depends on [`Scheduler`]; [`TimerLoop`] is a
//! minimal single-threaded implementation for hosts without one of their own.

use std::cell::RefCell;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

/// What a periodic callback asks the scheduler to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reschedule {
    /// Fire again after the given delay.
    After(Duration),
    /// Unregister; the callback will not fire again.
    Stop,
}

/// A callback registered with a [`Scheduler`].
pub type PeriodicCallback = Box<dyn FnMut() -> Reschedule>;

/// Host capability for running callbacks on its main thread.
pub trait Scheduler {
    /// Register a callback. It first fires on the scheduler's next pass and
    /// keeps firing until it returns [`Reschedule::Stop`].
    fn register_periodic(&self, callback: PeriodicCallback);
}

struct Timer {
    callback: PeriodicCallback,
    due: Instant,
}

/// Single-threaded timer loop in the style of a host's idle/timer queue.
#[derive(Default)]
pub struct TimerLoop {
    timers: RefCell<Vec<Timer>>,
}

impl TimerLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.timers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.borrow().is_empty()
    }

    /// Earliest instant at which some callback is due.
    pub fn next_due(&self) -> Option<Instant> {
        self.timers.borrow().iter().map(|t| t.due).min()
    }

    /// Fire every callback due at `now` once. Returns how many fired.
    pub fn run_due(&self, now: Instant) -> usize {
        // Taken out so callbacks may register new timers while we iterate.
        let mut timers = std::mem::take(&mut *self.timers.borrow_mut());
        let mut fired = 0;

        timers.retain_mut(|timer| {
            if timer.due > now {
                return true;
            }
            fired += 1;
            match (timer.callback)() {
                Reschedule::After(delay) => {
                    timer.due = now + delay;
                    true
                }
                Reschedule::Stop => false,
            }
        });

        let mut slot = self.timers.borrow_mut();
        timers.append(&mut *slot);
        *slot = timers;
        fired
    }

    /// Run callbacks as they come due until `deadline`, sleeping in between.
    pub fn run_until(&self, deadline: Instant) {
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            self.run_due(now);
            let wake = self.next_due().map_or(deadline, |due| due.min(deadline));
            thread::sleep(wake.saturating_duration_since(Instant::now()));
        }
    }

    /// Run until every callback has unregistered itself.
    pub fn run_to_completion(&self) {
        while let Some(due) = self.next_due() {
            thread::sleep(due.saturating_duration_since(Instant::now()));
            self.run_due(Instant::now());
        }
    }
}

impl Scheduler for TimerLoop {
    fn register_periodic(&self, callback: PeriodicCallback) {
        self.timers.borrow_mut().push(Timer {
            callback,
            due: Instant::now(),
        });
    }
}

impl fmt::Debug for TimerLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerLoop")
            .field("timers", &self.len())
            .field("next_due", &self.next_due())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn callbacks_fire_when_due_and_stop_unregisters() {
        let timers = TimerLoop::new();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        timers.register_periodic(Box::new(move || {
            counter.set(counter.get() + 1);
            if counter.get() < 3 {
                Reschedule::After(Duration::from_millis(10))
            } else {
                Reschedule::Stop
            }
        }));

        let start = Instant::now();
        assert_eq!(timers.run_due(start), 1);
        // Not due yet.
        assert_eq!(timers.run_due(start), 0);
        assert_eq!(timers.run_due(start + Duration::from_millis(10)), 1);
        assert_eq!(timers.run_due(start + Duration::from_millis(20)), 1);
        assert_eq!(count.get(), 3);
        assert!(timers.is_empty());
    }

    #[test]
    fn callback_may_register_another_timer() {
        let timers = Rc::new(TimerLoop::new());
        let inner_fired = Rc::new(Cell::new(false));

        let registrar = timers.clone();
        let flag = inner_fired.clone();
        timers.register_periodic(Box::new(move || {
            let flag = flag.clone();
            registrar.register_periodic(Box::new(move || {
                flag.set(true);
                Reschedule::Stop
            }));
            Reschedule::Stop
        }));

        timers.run_due(Instant::now());
        assert_eq!(timers.len(), 1);
        timers.run_to_completion();
        assert!(inner_fired.get());
        assert!(timers.is_empty());
    }
}
