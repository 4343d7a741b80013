use std::collections::BTreeMap;
use std::time::Duration;

/// Unique identifier for a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// Type of timer
#[derive(Debug, Clone)]
enum TimerType {
    /// One-shot timer that fires once and is removed
    OneShot { fire_at: Duration },
    /// Recurring timer that fires repeatedly at an interval
    Recurring {
        interval: Duration,
        next_fire: Duration,
    },
}

/// A timer with metadata
#[derive(Debug, Clone)]
struct Timer {
    name: String,
    timer_type: TimerType,
}

/// Timers driven by frame time rather than wall-clock time.
///
/// The clock only moves when [`TimerManager::advance`] is called from the
/// frame tick, so everything scheduled here runs on the host's frame thread.
pub struct TimerManager {
    timers: BTreeMap<TimerId, Timer>,
    next_id: u64,
    /// Frame time accumulated so far
    now: Duration,
    /// Timers that fired during the most recent advance
    fired_timers: Vec<TimerId>,
}

impl TimerManager {
    /// Create a new timer manager
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_id: 0,
            now: Duration::ZERO,
            fired_timers: Vec::new(),
        }
    }

    fn next_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Schedule a one-shot timer that fires after a delay
    pub fn schedule_timer(&mut self, delay: Duration, name: String) -> TimerId {
        let id = self.next_id();
        let timer = Timer {
            name,
            timer_type: TimerType::OneShot {
                fire_at: self.now + delay,
            },
        };

        self.timers.insert(id, timer);
        id
    }

    /// Schedule a recurring timer that fires repeatedly at an interval
    pub fn schedule_recurring(&mut self, interval: Duration, name: String) -> TimerId {
        let id = self.next_id();
        let timer = Timer {
            name,
            timer_type: TimerType::Recurring {
                interval,
                next_fire: self.now + interval,
            },
        };

        self.timers.insert(id, timer);
        id
    }

    /// Cancel a timer
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Check if a timer fired during the current frame (and consume the fired state)
    pub fn check_timer(&mut self, id: TimerId) -> bool {
        if let Some(pos) = self.fired_timers.iter().position(|&tid| tid == id) {
            self.fired_timers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Move the frame clock forward and return the timers that came due, in
    /// scheduling order. Fired state from the previous frame is discarded.
    pub fn advance(&mut self, delta: Duration) -> Vec<(TimerId, String)> {
        self.now += delta;
        let now = self.now;

        let mut fired = Vec::new();
        let mut to_remove = Vec::new();

        for (id, timer) in self.timers.iter_mut() {
            match &mut timer.timer_type {
                TimerType::OneShot { fire_at } => {
                    if now >= *fire_at {
                        fired.push((*id, timer.name.clone()));
                        to_remove.push(*id);
                    }
                }
                TimerType::Recurring {
                    interval,
                    next_fire,
                } => {
                    if now >= *next_fire {
                        fired.push((*id, timer.name.clone()));
                        *next_fire = now + *interval;
                    }
                }
            }
        }

        // Remove one-shot timers that have fired
        for id in to_remove {
            self.timers.remove(&id);
        }

        self.fired_timers.clear();
        self.fired_timers.extend(fired.iter().map(|(id, _)| *id));

        fired
    }

    /// Frame time elapsed since the manager was created
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Get the number of active timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    #[test]
    fn test_one_shot_timer() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_timer(Duration::from_millis(50), "test".to_string());

        // Three frames = 48ms, not due yet
        for _ in 0..3 {
            assert!(manager.advance(FRAME).is_empty());
        }

        let fired = manager.advance(FRAME);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, id);
        assert_eq!(fired[0].1, "test");

        // Should be removed after firing
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_timer(Duration::ZERO, "now".to_string());

        let fired = manager.advance(Duration::ZERO);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, id);
    }

    #[test]
    fn test_recurring_timer() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_recurring(Duration::from_millis(50), "recurring".to_string());

        assert!(manager.advance(Duration::from_millis(40)).is_empty());

        let fired = manager.advance(Duration::from_millis(10));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, id);

        // Should still be active
        assert_eq!(manager.active_count(), 1);

        assert!(manager.advance(Duration::from_millis(40)).is_empty());
        let fired = manager.advance(Duration::from_millis(10));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].0, id);
    }

    #[test]
    fn test_fired_in_scheduling_order() {
        let mut manager = TimerManager::new();
        let first = manager.schedule_timer(Duration::from_millis(10), "first".to_string());
        let second = manager.schedule_timer(Duration::from_millis(5), "second".to_string());

        let fired: Vec<TimerId> = manager
            .advance(Duration::from_millis(10))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(fired, vec![first, second]);
    }

    #[test]
    fn test_cancel_timer() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_timer(Duration::from_secs(10), "test".to_string());

        assert!(manager.cancel_timer(id));
        assert_eq!(manager.active_count(), 0);
        assert!(!manager.cancel_timer(id)); // Already removed
    }

    #[test]
    fn test_check_timer() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_timer(Duration::from_millis(50), "test".to_string());

        // Not fired yet
        assert!(!manager.check_timer(id));

        manager.advance(Duration::from_millis(60));

        // Should return true once
        assert!(manager.check_timer(id));
        // Should return false second time (consumed)
        assert!(!manager.check_timer(id));
    }

    #[test]
    fn test_fired_state_lasts_one_frame() {
        let mut manager = TimerManager::new();
        let id = manager.schedule_timer(Duration::from_millis(10), "test".to_string());

        manager.advance(Duration::from_millis(10));
        manager.advance(FRAME);

        assert!(!manager.check_timer(id));
        assert_eq!(manager.now(), Duration::from_millis(26));
    }
}
