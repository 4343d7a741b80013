use std::time::Duration;

use super::notification::{NotificationHandle, NotificationSink};
use super::stepped_value::{StepDirection, SteppedValue};
use super::timer::{TimerId, TimerManager};
use super::world::World;

/// How long the value readout stays up after a radius/distance change
const STEP_SUBTITLE_DURATION: Duration = Duration::from_millis(2000);

/// Context handed to every script hook for the duration of one dispatch
pub struct ScriptContext<'a> {
    world: &'a mut (dyn World + 'a),
    sink: &'a mut (dyn NotificationSink + 'a),
    timers: &'a mut TimerManager,
    /// Frame time since the previous tick (zero for key events)
    delta: Duration,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        world: &'a mut (dyn World + 'a),
        sink: &'a mut (dyn NotificationSink + 'a),
        timers: &'a mut TimerManager,
        delta: Duration,
    ) -> Self {
        Self {
            world,
            sink,
            timers,
            delta,
        }
    }

    // ===== World Access =====

    /// The game world
    pub fn world(&mut self) -> &mut (dyn World + 'a) {
        &mut *self.world
    }

    // ===== Notifications =====

    /// Show a notification that stays until hidden
    pub fn notify(&mut self, text: &str) -> NotificationHandle {
        self.sink.show(text)
    }

    /// Hide a notification shown with [`ScriptContext::notify`]
    pub fn hide_notification(&mut self, handle: NotificationHandle) {
        self.sink.hide(handle);
    }

    /// Show a subtitle that disappears on its own
    pub fn show_subtitle(&mut self, text: &str, duration: Duration) {
        self.sink.show_subtitle(text, duration);
    }

    /// Debug readout shown as a short subtitle
    pub fn debug_msg(&mut self, value: impl std::fmt::Display) {
        self.sink
            .show_subtitle(&format!("DEBUG: [ {} ]", value), Duration::from_millis(1000));
    }

    /// Step a script-owned value and show `"<label>: <value>"`
    pub fn step_value(
        &mut self,
        value: &mut SteppedValue,
        direction: StepDirection,
        label: &str,
    ) -> f32 {
        let next = value.step(direction);
        self.sink
            .show_subtitle(&format!("{}: {}", label, next), STEP_SUBTITLE_DURATION);
        next
    }

    // ===== Timer Methods =====

    /// Schedule a one-shot timer that fires after a delay of frame time
    pub fn schedule_timer(&mut self, delay: Duration, name: impl Into<String>) -> TimerId {
        self.timers.schedule_timer(delay, name.into())
    }

    /// Schedule a recurring timer that fires repeatedly at an interval
    pub fn schedule_recurring(&mut self, interval: Duration, name: impl Into<String>) -> TimerId {
        self.timers.schedule_recurring(interval, name.into())
    }

    /// Cancel a timer
    pub fn cancel_timer(&mut self, timer_id: TimerId) -> bool {
        self.timers.cancel_timer(timer_id)
    }

    /// Check if a timer fired this frame (consumes the fired state)
    pub fn check_timer(&mut self, timer_id: TimerId) -> bool {
        self.timers.check_timer(timer_id)
    }

    // ===== Clock =====

    /// Frame time since the previous tick
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Total frame time since the runner started
    pub fn frame_time(&self) -> Duration {
        self.timers.now()
    }
}
