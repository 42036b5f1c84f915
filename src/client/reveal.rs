//! Typewriter style reveal of a response into a display surface.
//!
//! A `RevealEngine` belongs to one chat view. Each `start` begins a new
//! session that reveals one character per tick and writes it to the
//! message's revealed prefix. Starting again, stopping, or dropping the
//! engine ends the running session first, so at most one ticker ever
//! writes to the surface.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::models::{MessageId, RevealDelta, SharedChat, lock};
use super::surface::DisplaySurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    Revealing,
    Stopped,
}

struct RevealSession {
    message_id: MessageId,
    ticker: JoinHandle<()>,
}

pub struct RevealEngine {
    period: Duration,
    chat: SharedChat,
    surface: Weak<dyn DisplaySurface>,
    // Generation of the only session allowed to write. Ticks compare
    // against it while holding the lock.
    generation: Arc<Mutex<u64>>,
    state: Arc<watch::Sender<RevealState>>,
    session: Option<RevealSession>,
}

impl RevealEngine {
    pub fn new<S: DisplaySurface + 'static>(
        chat: SharedChat,
        surface: &Arc<S>,
        period: Duration,
    ) -> Self {
        let surface: Weak<S> = Arc::downgrade(surface);
        let surface: Weak<dyn DisplaySurface> = surface;
        let (state, _) = watch::channel(RevealState::Idle);
        Self {
            period: period.max(Duration::from_millis(1)),
            chat,
            surface,
            generation: Arc::new(Mutex::new(0)),
            state: Arc::new(state),
            session: None,
        }
    }

    pub fn state(&self) -> RevealState {
        *self.state.borrow()
    }

    /// Watch state changes, e.g. to wait for a reveal to finish.
    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.state.subscribe()
    }

    /// Reveal `text` into the surface as the response of `message_id`,
    /// replacing whatever reveal was running.
    pub fn start(&mut self, text: &str, message_id: MessageId) {
        let Some(surface) = self.surface.upgrade() else {
            tracing::debug!("Display surface is gone, not revealing {}", message_id);
            return;
        };

        let generation = self.cancel_session();
        lock(&self.chat).begin(&message_id);
        surface.clear();
        surface.set_cursor(true);
        self.state.send_replace(RevealState::Revealing);

        let ticker = Ticker {
            chars: text.chars().collect(),
            index: 0,
            generation,
            gate: Arc::clone(&self.generation),
            chat: Arc::clone(&self.chat),
            surface: self.surface.clone(),
            state: Arc::clone(&self.state),
            message_id: message_id.clone(),
        };
        let ticker = tokio::spawn(ticker.run(self.period));
        self.session = Some(RevealSession { message_id, ticker });
    }

    /// Stop revealing immediately. Safe to call when nothing is running.
    pub fn stop(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.cancel_session();
        if let Some(surface) = self.surface.upgrade() {
            surface.set_cursor(false);
        }
        self.state.send_if_modified(|state| {
            if *state == RevealState::Revealing {
                *state = RevealState::Stopped;
                true
            } else {
                false
            }
        });
    }

    /// Empty the surface without starting a reveal.
    pub fn clear(&self) {
        if let Some(surface) = self.surface.upgrade() {
            surface.clear();
        }
    }

    // Invalidates the running session, if any, and returns the
    // generation for the next one.
    fn cancel_session(&mut self) -> u64 {
        let generation = {
            let mut current = self
                .generation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *current += 1;
            *current
        };
        if let Some(session) = self.session.take() {
            session.ticker.abort();
            lock(&self.chat).finish(&session.message_id);
        }
        generation
    }
}

impl Drop for RevealEngine {
    fn drop(&mut self) {
        self.cancel_session();
    }
}

struct Ticker {
    chars: Vec<char>,
    index: usize,
    generation: u64,
    gate: Arc<Mutex<u64>>,
    chat: SharedChat,
    surface: Weak<dyn DisplaySurface>,
    state: Arc<watch::Sender<RevealState>>,
    message_id: MessageId,
}

impl Ticker {
    async fn run(mut self, period: Duration) {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if !self.tick() {
                break;
            }
        }
    }

    /// Reveal the next character. Returns `false` once the session is
    /// over.
    fn tick(&mut self) -> bool {
        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if *gate != self.generation {
            return false;
        }

        let Some(surface) = self.surface.upgrade() else {
            tracing::debug!("Display surface dropped while revealing {}", self.message_id);
            lock(&self.chat).finish(&self.message_id);
            self.state.send_replace(RevealState::Stopped);
            return false;
        };

        match self.chars.get(self.index) {
            Some(&ch) => {
                let delta = RevealDelta {
                    message_id: self.message_id.clone(),
                    ch,
                    first: self.index == 0,
                };
                lock(&self.chat).apply_delta(&delta);
                surface.push(ch);
                self.index += 1;
                true
            }
            None => {
                lock(&self.chat).finish(&self.message_id);
                surface.set_cursor(false);
                self.state.send_replace(RevealState::Stopped);
                false
            }
        }
    }
}
