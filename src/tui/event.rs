//! Event handling for the TUI.
//!
//! A separate thread turns terminal input and timer deadlines into a single
//! event stream. Ticks are scheduled against absolute deadlines so that key
//! events (including manual refresh) do not shift the sampling phase.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Timer tick for data refresh.
    Tick,
    /// Keyboard input.
    Key(KeyEvent),
    /// Terminal resize; the next draw repaints at the new size.
    Resize,
}

/// Next tick deadline after one fires. Keeps the established phase unless
/// the loop has fallen behind, in which case it re-anchors to now instead
/// of emitting a burst of catch-up ticks.
fn next_deadline(previous: Instant, now: Instant, period: Duration) -> Instant {
    let next = previous + period;
    if next > now { next } else { now + period }
}

/// Event handler that polls for terminal events in a separate thread.
pub struct EventHandler {
    rx: Receiver<Event>,
    /// Kept alive to prevent channel closure.
    _tx: Sender<Event>,
}

impl EventHandler {
    /// Creates a new event handler with the specified tick period.
    pub fn new(period: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();

        thread::spawn(move || {
            let mut deadline = Instant::now() + period;
            loop {
                let timeout = deadline.saturating_duration_since(Instant::now());
                if event::poll(timeout).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        let event = match evt {
                            CrosstermEvent::Key(key) => Event::Key(key),
                            CrosstermEvent::Resize(_, _) => Event::Resize,
                            _ => continue,
                        };
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                } else {
                    deadline = next_deadline(deadline, Instant::now(), period);
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Receives the next event, blocking until one is available.
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_keeps_phase_when_on_schedule() {
        let start = Instant::now();
        let period = Duration::from_millis(500);

        // Fired on time: the next deadline is exactly one period later.
        let next = next_deadline(start, start, period);
        assert_eq!(next, start + period);

        // A key event arriving mid-interval does not move the deadline.
        let mid = start + Duration::from_millis(200);
        let next = next_deadline(start, mid, period);
        assert_eq!(next, start + period);
    }

    #[test]
    fn deadline_reanchors_when_lagging() {
        let start = Instant::now();
        let period = Duration::from_millis(500);

        // Loop stalled for three periods: no tick burst, re-anchor to now.
        let late = start + Duration::from_millis(1600);
        let next = next_deadline(start, late, period);
        assert_eq!(next, late + period);
    }
}
