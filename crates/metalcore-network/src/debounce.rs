//! Quiet-period debouncing for the search box.

use std::time::Duration;

use tokio::time::Instant;

/// Holds the latest search text until input has been quiet for `quiet`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a keystroke at `now`. Replaces any pending text and pushes the
    /// deadline out. Returns the new deadline.
    pub fn push(&mut self, text: impl Into<String>, now: Instant) -> Instant {
        let deadline = now + self.quiet;
        self.pending = Some((text.into(), deadline));
        deadline
    }

    /// Take the pending text if its deadline has passed.
    pub fn due(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(text, _)| text),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Drop pending input, e.g. when a control change recenters directly.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: Duration = Duration::from_millis(300);

    #[test]
    fn test_fires_after_quiet_period() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(QUIET);
        assert_eq!(d.push("lorna", t0), t0 + QUIET);

        assert_eq!(d.due(t0 + Duration::from_millis(299)), None);
        assert_eq!(d.due(t0 + QUIET).as_deref(), Some("lorna"));
        // Fires once.
        assert_eq!(d.due(t0 + Duration::from_secs(5)), None);
        assert_eq!(d.deadline(), None);
    }

    #[test]
    fn test_keystroke_reschedules() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(QUIET);
        d.push("lor", t0);
        let t1 = t0 + Duration::from_millis(200);
        d.push("lorna shore", t1);

        assert_eq!(d.due(t0 + QUIET), None);
        assert_eq!(d.deadline(), Some(t1 + QUIET));
        assert_eq!(d.due(t1 + QUIET).as_deref(), Some("lorna shore"));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(QUIET);
        d.push("x", t0);
        d.cancel();
        assert_eq!(d.due(t0 + QUIET), None);
    }
}
