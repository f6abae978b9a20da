use std::time::{Duration, Instant};

/// The dock stays visible this long after the last pointer/touch activity.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Idle-driven dock visibility. At most one hide deadline is armed at a
/// time; every activity event replaces it, so the newest activity wins.
#[derive(Debug, Clone, Copy)]
pub struct DockVisibility {
    visible: bool,
    hide_at: Option<Instant>,
}

impl DockVisibility {
    /// Starts visible with the countdown already armed, as if opening the
    /// window were the first activity.
    pub fn new(now: Instant) -> Self {
        Self {
            visible: true,
            hide_at: Some(now + IDLE_TIMEOUT),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Pending hide deadline, for scheduling a wake-up.
    pub fn deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Records activity: shows the dock and restarts the countdown.
    pub fn poke(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + IDLE_TIMEOUT);
    }

    /// Evaluates the countdown. Returns true when visibility flipped.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.visible = false;
                self.hide_at = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DockVisibility, IDLE_TIMEOUT};
    use std::time::{Duration, Instant};

    #[test]
    fn later_activity_supersedes_the_earlier_deadline() {
        let t0 = Instant::now();
        let mut dock = DockVisibility::new(t0);
        dock.poke(t0);
        dock.poke(t0 + Duration::from_secs(2));

        // 3s after the first poke the dock must still be visible.
        assert!(!dock.tick(t0 + Duration::from_millis(3100)));
        assert!(dock.visible());

        // 3s after the second poke it hides.
        assert!(dock.tick(t0 + Duration::from_secs(5)));
        assert!(!dock.visible());
    }

    #[test]
    fn activity_restores_a_hidden_dock() {
        let t0 = Instant::now();
        let mut dock = DockVisibility::new(t0);
        assert!(dock.tick(t0 + IDLE_TIMEOUT));
        assert!(!dock.visible());

        let t1 = t0 + Duration::from_secs(10);
        dock.poke(t1);
        assert!(dock.visible());
        assert_eq!(dock.deadline(), Some(t1 + IDLE_TIMEOUT));
    }

    #[test]
    fn only_the_latest_deadline_is_armed() {
        let t0 = Instant::now();
        let mut dock = DockVisibility::new(t0);
        dock.poke(t0 + Duration::from_secs(1));
        dock.poke(t0 + Duration::from_secs(2));
        assert_eq!(
            dock.deadline(),
            Some(t0 + Duration::from_secs(2) + IDLE_TIMEOUT)
        );
    }

    #[test]
    fn tick_before_the_deadline_changes_nothing() {
        let t0 = Instant::now();
        let mut dock = DockVisibility::new(t0);
        assert!(!dock.tick(t0 + Duration::from_secs(1)));
        assert!(dock.visible());
        assert!(dock.deadline().is_some());
    }
}
