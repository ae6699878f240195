//! Refresh debouncing.

use std::time::Duration;
use tokio::{task::JoinHandle, time::Instant};

/// What to do about a matching notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The last refresh is at least one window old
    RefreshNow,
    /// Refresh at this deadline, replacing any timer already armed
    Deferred(Instant),
}

/// Coalesces bursts of notifications into single refreshes.
///
/// Owns at most one scheduled refresh. Re-arming cancels the previous timer
/// before storing the new one.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_refresh: Option<Instant>,
    pending: Option<JoinHandle<()>>,
    generation: u64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_refresh: None,
            pending: None,
            generation: 0,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Decide how a notification arriving at `now` is handled.
    pub fn plan(&self, now: Instant) -> Trigger {
        match self.last_refresh {
            Some(last) if now.saturating_duration_since(last) < self.window => {
                Trigger::Deferred(last + self.window)
            }
            _ => Trigger::RefreshNow,
        }
    }

    /// Note a refresh started outside the timer.
    ///
    /// A pending timer is cancelled; a timer already past its sleep will find
    /// nothing to fire.
    pub fn record_refresh(&mut self, at: Instant) {
        self.cancel();
        self.last_refresh = Some(at);
    }

    /// Generation the next armed timer must present when it fires
    pub fn next_generation(&self) -> u64 {
        self.generation + 1
    }

    /// Store `timer` as the single pending refresh.
    pub fn arm(&mut self, timer: JoinHandle<()>) {
        self.cancel();
        self.generation += 1;
        self.pending = Some(timer);
    }

    /// Called by a timer when its deadline passes.
    ///
    /// Returns `false` if that timer has since been replaced or cancelled, in
    /// which case it must not refresh.
    pub fn fire(&mut self, generation: u64, now: Instant) -> bool {
        if generation != self.generation || self.pending.is_none() {
            return false;
        }
        self.pending = None;
        self.last_refresh = Some(now);
        true
    }

    /// Abort the pending timer. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(timer) => {
                timer.abort();
                true
            }
            None => false,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_first_notification_refreshes_now() {
        let debouncer = Debouncer::new(WINDOW);
        assert_eq!(debouncer.plan(Instant::now()), Trigger::RefreshNow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_inside_window_is_deferred() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.record_refresh(start);

        let now = start + Duration::from_millis(120);
        assert_eq!(debouncer.plan(now), Trigger::Deferred(start + WINDOW));
        assert_eq!(debouncer.plan(start + WINDOW), Trigger::RefreshNow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_cancels_previous_timer() {
        let mut debouncer = Debouncer::new(WINDOW);
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        debouncer.arm(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            let _ = tx.send(());
        }));
        debouncer.arm(tokio::spawn(tokio::time::sleep(Duration::from_secs(10))));

        // The aborted timer drops its sender without sending
        assert!(rx.await.is_err());
        assert!(debouncer.has_pending());
        assert!(debouncer.cancel());
        assert!(!debouncer.has_pending());
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_does_not_fire() {
        let mut debouncer = Debouncer::new(WINDOW);
        let stale = debouncer.next_generation();
        debouncer.arm(tokio::spawn(async {}));
        let current = debouncer.next_generation();
        debouncer.arm(tokio::spawn(async {}));

        let now = Instant::now();
        assert!(!debouncer.fire(stale, now));
        assert!(debouncer.fire(current, now));
        assert_eq!(debouncer.last_refresh(), Some(now));
        assert!(!debouncer.fire(current, now));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_refresh_disarms_pending_timer() {
        let mut debouncer = Debouncer::new(WINDOW);
        let start = Instant::now();
        debouncer.record_refresh(start);

        let generation = debouncer.next_generation();
        debouncer.arm(tokio::spawn(async {}));

        let deadline = start + WINDOW;
        assert_eq!(debouncer.plan(deadline), Trigger::RefreshNow);
        debouncer.record_refresh(deadline);

        assert!(!debouncer.has_pending());
        assert!(!debouncer.fire(generation, deadline));
        assert_eq!(debouncer.last_refresh(), Some(deadline));
    }
}
