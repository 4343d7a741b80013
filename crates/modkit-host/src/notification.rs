use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

use super::timer::{TimerId, TimerManager};

/// Default time a status notification stays on screen
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_millis(3000);

/// Timer name used for notification auto-hide
const HIDE_TIMER_NAME: &str = "notification-hide";

/// Handle to a notification shown by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationHandle(pub u64);

/// On-screen notification renderer provided by the host
pub trait NotificationSink {
    /// Show a notification until it is hidden
    fn show(&mut self, text: &str) -> NotificationHandle;

    /// Hide a notification previously returned by [`NotificationSink::show`]
    fn hide(&mut self, handle: NotificationHandle);

    /// Show a subtitle that the host removes on its own after `duration`
    fn show_subtitle(&mut self, text: &str, duration: Duration);
}

/// Shows "<name>: Active" / "<name>: Disabled" and hides it again after a timeout
pub struct StatusNotifier {
    timeout: Duration,
    /// Hide timers that have not fired yet
    pending: BTreeMap<TimerId, NotificationHandle>,
}

impl StatusNotifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: BTreeMap::new(),
        }
    }

    /// Text shown when a script is toggled
    pub fn status_text(name: &str, active: bool) -> String {
        if active {
            format!("{}: Active", name)
        } else {
            format!("{}: Disabled", name)
        }
    }

    /// Show the status of a script and schedule its removal
    pub fn announce(
        &mut self,
        sink: &mut dyn NotificationSink,
        timers: &mut TimerManager,
        name: &str,
        active: bool,
    ) -> NotificationHandle {
        let handle = sink.show(&Self::status_text(name, active));
        let timer = timers.schedule_timer(self.timeout, HIDE_TIMER_NAME.to_string());
        self.pending.insert(timer, handle);
        handle
    }

    /// Hide the notification bound to a fired timer. Returns false for timers
    /// that don't belong to the notifier.
    pub fn on_timer_fired(&mut self, sink: &mut dyn NotificationSink, timer: TimerId) -> bool {
        match self.pending.remove(&timer) {
            Some(handle) => {
                debug!(target: "scripting", "Hiding notification {:?}", handle);
                sink.hide(handle);
                true
            }
            None => false,
        }
    }

    /// Hide everything still on screen and cancel the hide timers
    pub fn clear(&mut self, sink: &mut dyn NotificationSink, timers: &mut TimerManager) {
        for (timer, handle) in std::mem::take(&mut self.pending) {
            timers.cancel_timer(timer);
            sink.hide(handle);
        }
    }

    /// Number of notifications waiting to be hidden
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_TIMEOUT)
    }
}
