//! Value debouncing - delays propagation of a rapidly-changing value.
//!
//! A [`Debounced`] value updates its output to match its input only after
//! the input has remained unchanged for a quiet period. Typing into the
//! search field feeds the input on every keystroke; the settled output is
//! what actually drives a network request.
//!
//! The debouncer is tick-polled: no timer task exists, the owner calls
//! [`poll`](Debounced::poll) from its update loop. Dropping the value
//! implicitly cancels any pending change, so nothing can fire into a
//! destroyed consumer.

use std::time::{Duration, Instant};

/// A debounced value with a fixed quiet period.
///
/// The output equals the initial input from the start (no artificial
/// startup delay). Any genuine change to the input restarts the quiet
/// timer; the output only changes once the input has been stable for the
/// whole period.
///
/// # Usage
/// ```rust
/// use std::time::Duration;
/// use hakken::debounce::Debounced;
///
/// let mut term = Debounced::new(String::new(), Duration::from_millis(250));
/// term.set("naruto".to_string());
/// assert_eq!(term.value(), "");         // not settled yet
/// assert_eq!(term.latest(), "naruto");  // immediate input
/// // in the update loop:
/// if let Some(settled) = term.poll() {
///     println!("search for {settled}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    output: T,
    pending: Option<(T, Instant)>,
    delay: Duration,
}

impl<T: PartialEq> Debounced<T> {
    /// Creates a debounced value; the output starts equal to `initial`.
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            output: initial,
            pending: None,
            delay,
        }
    }

    /// Feeds a new input value.
    ///
    /// Setting the input back to the current output cancels the pending
    /// change. Re-setting the value already pending is not a change and
    /// does not restart the timer; anything else (re)schedules the settle.
    pub fn set(&mut self, value: T) {
        if value == self.output {
            self.pending = None;
            return;
        }
        if let Some((pending, _)) = &self.pending {
            if *pending == value {
                return;
            }
        }
        self.pending = Some((value, Instant::now()));
    }

    /// Moves a pending value to the output once it has been stable for the
    /// quiet period.
    ///
    /// Returns `Some(&output)` exactly on the tick the value settles,
    /// `None` otherwise. Call this from the owner's update loop.
    pub fn poll(&mut self) -> Option<&T> {
        match self.pending.take() {
            Some((value, since)) if since.elapsed() >= self.delay => {
                self.output = value;
                Some(&self.output)
            }
            other => {
                self.pending = other;
                None
            }
        }
    }

    /// The settled output.
    pub fn value(&self) -> &T {
        &self.output
    }

    /// The immediate input: the pending value if one exists, else the output.
    pub fn latest(&self) -> &T {
        match &self.pending {
            Some((value, _)) => value,
            None => &self.output,
        }
    }

    /// `true` while a change is waiting out its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops any pending change; the output stays as it is.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    const DELAY: Duration = Duration::from_millis(40);

    #[test]
    fn initial_output_equals_input() {
        let mut d = Debounced::new(7u32, DELAY);
        assert_eq!(*d.value(), 7);
        assert!(!d.is_pending());
        assert!(d.poll().is_none());
    }

    #[test]
    fn settles_only_after_quiet_period() {
        let mut d = Debounced::new(0u32, DELAY);
        d.set(1);
        assert!(d.poll().is_none());
        assert_eq!(*d.value(), 0);

        sleep(DELAY * 2);
        assert_eq!(d.poll(), Some(&1));
        assert_eq!(*d.value(), 1);
        assert!(d.poll().is_none());
    }

    #[test]
    fn rapid_changes_collapse_to_final_value() {
        let mut d = Debounced::new(String::new(), DELAY);
        d.set("naruto".to_string());
        sleep(Duration::from_millis(10));
        d.set("naruto shippuden".to_string());

        // the first value never settles
        sleep(Duration::from_millis(15));
        assert!(d.poll().is_none());

        sleep(DELAY);
        assert_eq!(d.poll().map(String::as_str), Some("naruto shippuden"));
    }

    #[test]
    fn reverting_to_output_cancels() {
        let mut d = Debounced::new(5u32, DELAY);
        d.set(9);
        d.set(5);
        assert!(!d.is_pending());
        sleep(DELAY * 2);
        assert!(d.poll().is_none());
        assert_eq!(*d.value(), 5);
    }

    #[test]
    fn resetting_same_pending_value_keeps_timer() {
        let mut d = Debounced::new(0u32, DELAY);
        d.set(1);
        sleep(DELAY / 2);
        d.set(1); // not a change
        sleep(DELAY * 3 / 4);
        // total elapsed > DELAY since the genuine change
        assert_eq!(d.poll(), Some(&1));
    }

    #[test]
    fn latest_tracks_pending_input() {
        let mut d = Debounced::new(String::from("a"), DELAY);
        assert_eq!(d.latest(), "a");
        d.set("ab".to_string());
        assert_eq!(d.latest(), "ab");
        assert_eq!(d.value(), "a");
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debounced::new(0u32, DELAY);
        d.set(3);
        d.cancel();
        sleep(DELAY * 2);
        assert!(d.poll().is_none());
        assert_eq!(*d.value(), 0);
    }
}
