use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::warn;

use crate::clock::Clock;

/// Everything the main loop reacts to, serialized onto one thread
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// time to poll the engine's stats timer
    Tick,
}

/// Source of terminal events (keyboard, resize)
pub trait EventSource: Send + 'static {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread and forwards them
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(AppEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    warn!(%err, "terminal event reader stopped");
                    break;
                }
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events pushed by hand through a channel; drives the loop headlessly
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Interleaves terminal events with ticks on a fixed cadence.
///
/// A tick is due once `tick_rate` has passed since the previous one,
/// whether or not events are waiting, so a steady stream of keystrokes
/// can never starve the stats timer.
pub struct Runner<E: EventSource> {
    events: E,
    clock: Rc<dyn Clock>,
    tick_rate: Duration,
    next_tick: Instant,
}

impl<E: EventSource> Runner<E> {
    pub fn new(events: E, clock: Rc<dyn Clock>, tick_rate: Duration) -> Self {
        let tick_rate = tick_rate.max(Duration::from_millis(1));
        let next_tick = clock.now() + tick_rate;
        Self {
            events,
            clock,
            tick_rate,
            next_tick,
        }
    }

    pub fn tick_rate(&self) -> Duration {
        self.tick_rate
    }

    /// Returns Tick if one is due, otherwise blocks until the next event
    /// or until the tick comes due
    pub fn step(&mut self) -> AppEvent {
        let now = self.clock.now();
        if now >= self.next_tick {
            self.next_tick = now + self.tick_rate;
            return AppEvent::Tick;
        }

        let wait = self.next_tick - now;
        match self.events.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => {
                self.next_tick = self.clock.now() + self.tick_rate;
                AppEvent::Tick
            }
            Err(RecvTimeoutError::Disconnected) => {
                // no more input will come; keep ticking at the normal pace
                std::thread::sleep(wait);
                self.next_tick = self.clock.now() + self.tick_rate;
                AppEvent::Tick
            }
        }
    }
}
