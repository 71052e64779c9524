use std::time::Duration;

/// One-shot countdown polled by its owner.
///
/// The timer never calls back: owners call [`Timer::update`] once per frame with
/// the current game clock and read [`Timer::is_active`].
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    duration: Duration,
    started_at: Option<Duration>,
    active: bool,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
            active: false,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Restarts the countdown at `now`. A zero duration expires on the spot.
    pub fn start(&mut self, now: Duration) {
        if self.duration.is_zero() {
            self.stop();
            return;
        }
        self.started_at = Some(now);
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.started_at = None;
        self.active = false;
    }

    pub fn update(&mut self, now: Duration) {
        if let Some(started_at) = self.started_at {
            if now.saturating_sub(started_at) >= self.duration {
                self.stop();
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[test]
fn test_timer_inactive_until_started() {
    let mut timer = Timer::from_millis(500);
    assert!(!timer.is_active());
    timer.update(Duration::from_secs(10));
    assert!(!timer.is_active());
}

#[test]
fn test_timer_expires_lazily() {
    let mut timer = Timer::from_millis(500);
    timer.start(Duration::from_millis(1000));
    assert!(timer.is_active());

    timer.update(Duration::from_millis(1499));
    assert!(timer.is_active());

    // Still reported active until the owner polls it.
    assert!(timer.is_active());
    timer.update(Duration::from_millis(1500));
    assert!(!timer.is_active());
}

#[test]
fn test_timer_does_not_retrigger_without_restart() {
    let mut timer = Timer::from_millis(200);
    timer.start(Duration::ZERO);
    timer.update(Duration::from_millis(250));
    assert!(!timer.is_active());
    timer.update(Duration::from_millis(10_000));
    assert!(!timer.is_active());

    timer.start(Duration::from_millis(10_000));
    assert!(timer.is_active());
}

#[test]
fn test_timer_zero_duration_is_immediately_expired() {
    let mut timer = Timer::new(Duration::ZERO);
    timer.start(Duration::from_millis(5));
    assert!(!timer.is_active());
    timer.update(Duration::from_millis(5));
    assert!(!timer.is_active());
}
