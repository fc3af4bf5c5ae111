//! Countdown timer state machine.
//!
//! States: idle -> running -> paused -> running -> completed, with reset
//! returning to idle (remaining = duration) from anywhere. The machine is
//! driven by an external ~1 s tick and anchors the countdown to the wall
//! clock (`end_at - now`), not to tick counts, so a throttled or delayed
//! driver cannot stretch the countdown.
//!
//! A snapshot is persisted on every start/pause/reset/add-time through the
//! injected [`KeyValueStore`]; on construction an existing snapshot is
//! resumed, including the "expired while the process was away" case. All
//! persistence failures are swallowed with a log line; the timer then
//! degrades to an in-memory countdown.

use serde::{Deserialize, Serialize};

use crate::storage::KeyValueStore;

/// Storage key for the persisted countdown snapshot.
pub const TIMER_SNAPSHOT_KEY: &str = "emergency_timer";

/// Wall clock abstraction so tests can steer time.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Real wall clock.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Persisted snapshot. Field names are part of the stable storage format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub remaining: i64,
    pub is_running: bool,
    pub saved_at: i64,
    pub duration: i64,
}

/// What a driver should relay to its UI. Delivery is entirely the
/// caller's concern; the machine only reports transitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Paused,
    Tick { remaining_ms: i64 },
    /// Fired exactly once per countdown.
    Completed,
    Reset,
}

pub struct EmergencyTimer<S, C = SystemClock> {
    duration_ms: i64,
    remaining_ms: i64,
    running: bool,
    completed: bool,
    started_at_ms: Option<i64>,
    end_at_ms: Option<i64>,
    store: S,
    clock: C,
}

impl<S: KeyValueStore> EmergencyTimer<S, SystemClock> {
    /// Build a timer against the real wall clock, resuming any persisted
    /// snapshot. See [`EmergencyTimer::with_clock`].
    pub fn new(duration_ms: i64, store: S) -> (Self, Option<TimerEvent>) {
        Self::with_clock(duration_ms, store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> EmergencyTimer<S, C> {
    /// Build a timer, resuming a persisted snapshot when one exists:
    /// a paused snapshot restores its remaining time; a running snapshot
    /// resumes with the wall-clock time since the save deducted; a running
    /// snapshot whose remaining time has already elapsed completes
    /// immediately (the returned event is the one completion
    /// notification).
    pub fn with_clock(duration_ms: i64, store: S, clock: C) -> (Self, Option<TimerEvent>) {
        let mut timer = Self {
            duration_ms,
            remaining_ms: duration_ms,
            running: false,
            completed: false,
            started_at_ms: None,
            end_at_ms: None,
            store,
            clock,
        };

        let Some(snapshot) = timer.load_snapshot() else {
            return (timer, None);
        };

        timer.duration_ms = snapshot.duration;
        if !snapshot.is_running {
            timer.remaining_ms = snapshot.remaining.clamp(0, snapshot.duration);
            return (timer, None);
        }

        let now = timer.clock.now_ms();
        let elapsed = now - snapshot.saved_at;
        if elapsed < snapshot.remaining {
            // still counting down while we were away
            timer.remaining_ms = (snapshot.remaining - elapsed).min(snapshot.duration);
            timer.running = true;
            timer.started_at_ms = Some(now);
            timer.end_at_ms = Some(now + timer.remaining_ms);
            (timer, Some(TimerEvent::Started))
        } else {
            // expired while the process was absent
            timer.remaining_ms = 0;
            timer.completed = true;
            timer.clear_snapshot();
            (timer, Some(TimerEvent::Completed))
        }
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn started_at_ms(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Begin (or resume) the countdown. No-op while running or after
    /// completion; reset first to run again.
    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.running || self.remaining_ms <= 0 {
            return None;
        }
        let now = self.clock.now_ms();
        self.running = true;
        self.completed = false;
        self.started_at_ms = Some(now);
        self.end_at_ms = Some(now + self.remaining_ms);
        self.persist();
        Some(TimerEvent::Started)
    }

    /// Halt the countdown, keeping the remaining time. No-op when not
    /// running.
    pub fn pause(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining_ms = self.wall_clock_remaining();
        self.running = false;
        self.started_at_ms = None;
        self.end_at_ms = None;
        self.persist();
        Some(TimerEvent::Paused)
    }

    /// Start when paused, pause when running.
    pub fn toggle(&mut self) -> Option<TimerEvent> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Back to a full countdown, not running.
    pub fn reset(&mut self) -> TimerEvent {
        self.running = false;
        self.completed = false;
        self.remaining_ms = self.duration_ms;
        self.started_at_ms = None;
        self.end_at_ms = None;
        self.persist();
        TimerEvent::Reset
    }

    /// Extend the countdown. Remaining time never exceeds the original
    /// duration.
    pub fn add_time(&mut self, ms: i64) {
        if self.completed {
            return;
        }
        let current = if self.running {
            self.wall_clock_remaining()
        } else {
            self.remaining_ms
        };
        self.remaining_ms = (current + ms).clamp(0, self.duration_ms);
        if self.running {
            self.end_at_ms = Some(self.clock.now_ms() + self.remaining_ms);
        }
        self.persist();
    }

    /// Advance the countdown against the wall clock. Call roughly once a
    /// second while running; a no-op otherwise, so a stray late tick after
    /// pause or completion has no effect.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        self.remaining_ms = self.wall_clock_remaining();
        if self.remaining_ms <= 0 {
            self.running = false;
            self.completed = true;
            self.remaining_ms = 0;
            self.started_at_ms = None;
            self.end_at_ms = None;
            // a completed countdown leaves no resumable snapshot
            self.clear_snapshot();
            Some(TimerEvent::Completed)
        } else {
            Some(TimerEvent::Tick {
                remaining_ms: self.remaining_ms,
            })
        }
    }

    fn wall_clock_remaining(&self) -> i64 {
        match self.end_at_ms {
            Some(end) => (end - self.clock.now_ms()).max(0),
            None => self.remaining_ms,
        }
    }

    fn load_snapshot(&self) -> Option<TimerSnapshot> {
        let raw = match self.store.get(TIMER_SNAPSHOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%err, "timer snapshot unreadable, starting fresh");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                tracing::warn!(%err, "timer snapshot corrupt, starting fresh");
                None
            }
        }
    }

    fn persist(&mut self) {
        let snapshot = TimerSnapshot {
            remaining: self.remaining_ms,
            is_running: self.running,
            saved_at: self.clock.now_ms(),
            duration: self.duration_ms,
        };
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(%err, "timer snapshot unserialisable");
                return;
            }
        };
        if let Err(err) = self.store.set(TIMER_SNAPSHOT_KEY, &json) {
            tracing::warn!(%err, "timer snapshot not persisted, countdown is in-memory only");
        }
    }

    fn clear_snapshot(&mut self) {
        if let Err(err) = self.store.remove(TIMER_SNAPSHOT_KEY) {
            tracing::warn!(%err, "stale timer snapshot not removed");
        }
    }
}

/* ===========================
Unit tests
=========================== */

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;
    use std::cell::Cell;
    use std::rc::Rc;

    const MINUTE: i64 = 60_000;
    const HOUR: i64 = 60 * MINUTE;

    /// Test clock advanced by hand.
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<i64>>);

    impl ManualClock {
        fn at(ms: i64) -> Self {
            Self(Rc::new(Cell::new(ms)))
        }

        fn advance(&self, ms: i64) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> i64 {
            self.0.get()
        }
    }

    /// Store whose writes always fail, for degradation tests.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("store offline")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("store offline")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("store offline")))
        }
    }

    fn snapshot_in(store: &MemoryStore) -> Option<TimerSnapshot> {
        store
            .get(TIMER_SNAPSHOT_KEY)
            .unwrap()
            .map(|raw| serde_json::from_str(&raw).unwrap())
    }

    fn seeded_store(snapshot: TimerSnapshot) -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .set(
                TIMER_SNAPSHOT_KEY,
                &serde_json::to_string(&snapshot).unwrap(),
            )
            .unwrap();
        store
    }

    #[test]
    fn counts_down_against_the_wall_clock() {
        let clock = ManualClock::at(1_000_000);
        let (mut timer, resumed) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());
        assert_eq!(resumed, None);

        assert_eq!(timer.start(), Some(TimerEvent::Started));
        assert_eq!(timer.start(), None); // already running

        clock.advance(3 * MINUTE);
        assert_eq!(
            timer.tick(),
            Some(TimerEvent::Tick {
                remaining_ms: 7 * MINUTE
            })
        );
    }

    #[test]
    fn tick_is_inert_when_paused() {
        let clock = ManualClock::at(0);
        let (mut timer, _) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());
        assert_eq!(timer.tick(), None);

        timer.start();
        clock.advance(MINUTE);
        assert_eq!(timer.pause(), Some(TimerEvent::Paused));
        assert_eq!(timer.pause(), None);
        assert_eq!(timer.remaining_ms(), 9 * MINUTE);

        // wall clock keeps moving, a paused timer does not
        clock.advance(5 * MINUTE);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.remaining_ms(), 9 * MINUTE);
    }

    #[test]
    fn toggle_dispatches_on_state() {
        let clock = ManualClock::at(0);
        let (mut timer, _) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());
        assert_eq!(timer.toggle(), Some(TimerEvent::Started));
        assert_eq!(timer.toggle(), Some(TimerEvent::Paused));
        assert_eq!(timer.toggle(), Some(TimerEvent::Started));
    }

    #[test]
    fn completes_exactly_once_and_clears_the_snapshot() {
        let clock = ManualClock::at(0);
        let store = MemoryStore::new();
        let (mut timer, _) = EmergencyTimer::with_clock(2 * MINUTE, store, clock.clone());

        timer.start();
        clock.advance(2 * MINUTE + 500);
        assert_eq!(timer.tick(), Some(TimerEvent::Completed));
        assert!(timer.is_completed());
        assert_eq!(timer.remaining_ms(), 0);

        // late stray tick after completion fires nothing
        clock.advance(MINUTE);
        assert_eq!(timer.tick(), None);
        assert_eq!(timer.start(), None);
    }

    #[test]
    fn reset_restores_full_duration_from_any_state() {
        let clock = ManualClock::at(0);
        let (mut timer, _) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());

        timer.start();
        clock.advance(4 * MINUTE);
        timer.tick();
        assert_eq!(timer.reset(), TimerEvent::Reset);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_ms(), 10 * MINUTE);

        // reset also revives a completed timer
        timer.start();
        clock.advance(11 * MINUTE);
        assert_eq!(timer.tick(), Some(TimerEvent::Completed));
        timer.reset();
        assert!(!timer.is_completed());
        assert_eq!(timer.start(), Some(TimerEvent::Started));
    }

    #[test]
    fn add_time_clamps_to_duration() {
        let clock = ManualClock::at(0);
        let (mut timer, _) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());

        timer.start();
        clock.advance(6 * MINUTE);
        timer.tick();
        timer.add_time(2 * MINUTE);
        assert_eq!(timer.remaining_ms(), 6 * MINUTE);

        // cannot exceed the original duration
        timer.add_time(HOUR);
        assert_eq!(timer.remaining_ms(), 10 * MINUTE);

        clock.advance(3 * MINUTE);
        assert_eq!(
            timer.tick(),
            Some(TimerEvent::Tick {
                remaining_ms: 7 * MINUTE
            })
        );
    }

    #[test]
    fn resumes_a_running_snapshot_with_elapsed_time_deducted() {
        // saved with 90 min left, reloaded 45 min later
        let t = 1_700_000_000_000;
        let store = seeded_store(TimerSnapshot {
            remaining: 90 * MINUTE,
            is_running: true,
            saved_at: t,
            duration: 2 * HOUR,
        });
        let clock = ManualClock::at(t + 45 * MINUTE);
        let (timer, event) = EmergencyTimer::with_clock(2 * HOUR, store, clock);

        assert_eq!(event, Some(TimerEvent::Started));
        assert!(timer.is_running());
        assert_eq!(timer.remaining_ms(), 45 * MINUTE);
    }

    #[test]
    fn synthesizes_completion_when_expired_while_absent() {
        // saved with 10 min left, reloaded 20 min later
        let t = 1_700_000_000_000;
        let store = seeded_store(TimerSnapshot {
            remaining: 10 * MINUTE,
            is_running: true,
            saved_at: t,
            duration: 2 * HOUR,
        });
        let clock = ManualClock::at(t + 20 * MINUTE);
        let (mut timer, event) = EmergencyTimer::with_clock(2 * HOUR, store, clock);

        assert_eq!(event, Some(TimerEvent::Completed));
        assert!(timer.is_completed());
        assert!(!timer.is_running());
        // no resumable state left behind
        assert_eq!(timer.store.get(TIMER_SNAPSHOT_KEY).unwrap(), None);
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn restores_a_paused_snapshot() {
        let store = seeded_store(TimerSnapshot {
            remaining: 7 * MINUTE,
            is_running: false,
            saved_at: 0,
            duration: 10 * MINUTE,
        });
        let clock = ManualClock::at(HOUR);
        let (timer, event) = EmergencyTimer::with_clock(2 * HOUR, store, clock);

        assert_eq!(event, None);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_ms(), 7 * MINUTE);
        // snapshot duration wins over the constructor argument
        assert_eq!(timer.duration_ms(), 10 * MINUTE);
    }

    #[test]
    fn persists_on_start_pause_and_add_time() {
        let clock = ManualClock::at(0);
        let (mut timer, _) =
            EmergencyTimer::with_clock(10 * MINUTE, MemoryStore::new(), clock.clone());

        timer.start();
        let saved = snapshot_in(&timer.store).unwrap();
        assert!(saved.is_running);
        assert_eq!(saved.duration, 10 * MINUTE);

        clock.advance(MINUTE);
        timer.pause();
        let saved = snapshot_in(&timer.store).unwrap();
        assert!(!saved.is_running);
        assert_eq!(saved.remaining, 9 * MINUTE);

        timer.add_time(MINUTE);
        let saved = snapshot_in(&timer.store).unwrap();
        assert_eq!(saved.remaining, 10 * MINUTE);
    }

    #[test]
    fn snapshot_uses_the_stable_field_names() {
        let json = serde_json::to_string(&TimerSnapshot {
            remaining: 1,
            is_running: true,
            saved_at: 2,
            duration: 3,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"remaining":1,"isRunning":true,"savedAt":2,"duration":3}"#
        );
    }

    #[test]
    fn broken_store_degrades_to_in_memory_countdown() {
        let clock = ManualClock::at(0);
        let (mut timer, event) =
            EmergencyTimer::with_clock(10 * MINUTE, BrokenStore, clock.clone());
        assert_eq!(event, None);

        // every persistence call fails silently; the countdown still works
        assert_eq!(timer.start(), Some(TimerEvent::Started));
        clock.advance(4 * MINUTE);
        assert_eq!(
            timer.tick(),
            Some(TimerEvent::Tick {
                remaining_ms: 6 * MINUTE
            })
        );
        clock.advance(7 * MINUTE);
        assert_eq!(timer.tick(), Some(TimerEvent::Completed));
    }
}
