use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

/// Identifies one started timer so a stale cancel cannot stop its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// One-shot countdown before a try becomes interactive.
    SleepDelay { remaining_secs: u64 },
    /// Counts up while the try is interactive.
    Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    DelayTick { remaining_secs: u64 },
    DelayElapsed,
    ElapsedTick { elapsed_secs: u64 },
}

#[derive(Debug)]
struct ActiveTimer {
    handle: TimerHandle,
    mode: TimerMode,
    carry: Duration,
}

/// Single-slot one-second timer shared by the sleep delay and the elapsed
/// counter. Starting either mode replaces whatever was running.
#[derive(Debug, Default)]
pub struct TryTimerService {
    current: Option<ActiveTimer>,
    elapsed_secs: u64,
    next_handle: u64,
    starts: u64,
    stops: u64,
}

impl TryTimerService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_delay(&mut self, secs: u64) -> TimerHandle {
        self.start(TimerMode::SleepDelay {
            remaining_secs: secs,
        })
    }

    pub fn start_elapsed(&mut self) -> TimerHandle {
        self.start(TimerMode::Elapsed)
    }

    fn start(&mut self, mode: TimerMode) -> TimerHandle {
        self.stop();
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.starts += 1;
        self.current = Some(ActiveTimer {
            handle,
            mode,
            carry: Duration::ZERO,
        });
        handle
    }

    /// Returns true when a running timer was actually stopped.
    pub fn stop(&mut self) -> bool {
        if self.current.take().is_some() {
            self.stops += 1;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        if self.handle() == Some(handle) {
            self.stop()
        } else {
            false
        }
    }

    pub fn reset_elapsed(&mut self) {
        self.elapsed_secs = 0;
    }

    /// Whole seconds counted by the elapsed mode. Survives `stop()`.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn formatted_elapsed(&self) -> String {
        format!("{}s", self.elapsed_secs)
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.current.as_ref().map(|active| active.mode)
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.current.as_ref().map(|active| active.handle)
    }

    /// Number of starts and stops so far. Balanced whenever no timer runs.
    pub fn lifecycle_counts(&self) -> (u64, u64) {
        (self.starts, self.stops)
    }

    /// Feed wall time into the timer. Sub-second remainders carry over to
    /// the next call; at most one event is reported per call.
    pub fn on_tick(&mut self, dt: Duration) -> Option<TimerEvent> {
        let active = self.current.as_mut()?;
        active.carry += dt;

        let mut whole = 0u64;
        while active.carry >= TICK {
            active.carry -= TICK;
            whole += 1;
        }
        if whole == 0 {
            return None;
        }

        let mode = active.mode;
        match mode {
            TimerMode::SleepDelay { remaining_secs } => {
                let remaining_secs = remaining_secs.saturating_sub(whole);
                if remaining_secs == 0 {
                    self.stop();
                    Some(TimerEvent::DelayElapsed)
                } else {
                    active.mode = TimerMode::SleepDelay { remaining_secs };
                    Some(TimerEvent::DelayTick { remaining_secs })
                }
            }
            TimerMode::Elapsed => {
                self.elapsed_secs += whole;
                Some(TimerEvent::ElapsedTick {
                    elapsed_secs: self.elapsed_secs,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_is_idempotent() {
        let mut timer = TryTimerService::new();
        assert!(!timer.stop());

        timer.start_elapsed();
        assert!(timer.stop());
        assert!(!timer.stop());
        assert_eq!(timer.lifecycle_counts(), (1, 1));
    }

    #[test]
    fn test_elapsed_counts_whole_seconds_with_carry() {
        let mut timer = TryTimerService::new();
        timer.start_elapsed();

        assert_eq!(timer.on_tick(Duration::from_millis(600)), None);
        assert_eq!(
            timer.on_tick(Duration::from_millis(600)),
            Some(TimerEvent::ElapsedTick { elapsed_secs: 1 })
        );
        assert_eq!(
            timer.on_tick(Duration::from_millis(2800)),
            Some(TimerEvent::ElapsedTick { elapsed_secs: 4 })
        );
        assert_eq!(timer.formatted_elapsed(), "4s");
    }

    #[test]
    fn test_elapsed_survives_stop_until_reset() {
        let mut timer = TryTimerService::new();
        timer.start_elapsed();
        timer.on_tick(Duration::from_secs(12));
        timer.stop();

        assert_eq!(timer.elapsed_secs(), 12);
        assert_eq!(timer.on_tick(Duration::from_secs(5)), None);
        assert_eq!(timer.elapsed_secs(), 12);

        timer.reset_elapsed();
        assert_eq!(timer.elapsed_secs(), 0);
    }

    #[test]
    fn test_delay_is_one_shot() {
        let mut timer = TryTimerService::new();
        timer.start_delay(2);

        assert_eq!(
            timer.on_tick(Duration::from_secs(1)),
            Some(TimerEvent::DelayTick { remaining_secs: 1 })
        );
        assert_eq!(
            timer.on_tick(Duration::from_secs(1)),
            Some(TimerEvent::DelayElapsed)
        );
        assert!(!timer.is_running());
        assert_eq!(timer.on_tick(Duration::from_secs(1)), None);
        assert_eq!(timer.lifecycle_counts(), (1, 1));
    }

    #[test]
    fn test_start_replaces_running_timer() {
        let mut timer = TryTimerService::new();
        let delay = timer.start_delay(30);
        let elapsed = timer.start_elapsed();

        assert_ne!(delay, elapsed);
        assert_eq!(timer.mode(), Some(TimerMode::Elapsed));
        assert_eq!(timer.lifecycle_counts(), (2, 1));

        // a stale handle leaves the new timer alone
        assert!(!timer.cancel(delay));
        assert!(timer.is_running());
        assert!(timer.cancel(elapsed));
        assert!(!timer.is_running());
    }
}
