/// Input state tracker.
///
/// Tracks which keys are currently held down, so movement reads a
/// held-direction snapshot each frame rather than discrete events:
/// a key's "down" state persists across frames until released.
///
/// Uses crossterm's keyboard enhancement for Release events when
/// available. Falls back to timeout-based release detection on
/// terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind};

use crate::domain::entity::InputSnapshot;

/// After this duration without a Press/Repeat event, consider the key
/// released. Only used when the terminal doesn't report Release.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_INTERACT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' '), KeyCode::Char('e'), KeyCode::Char('E')];
const KEYS_SKIP: &[KeyCode] = &[KeyCode::Char('x'), KeyCode::Char('X')];

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call. Used for edge-triggered
    /// actions (terminal interaction).
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    pub raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.raw_events.push(key);

                match key.kind {
                    KeyEventKind::Release if self.honor_release => {
                        self.last_active.remove(&key.code);
                    }
                    KeyEventKind::Release => {
                        // Ignore release when enhancement not confirmed;
                        // rely on timeout-based expiry instead
                    }
                    _ => {
                        let was_held = self.is_held(key.code);
                        self.last_active.insert(key.code, Instant::now());
                        if !was_held {
                            self.fresh_presses.push(key.code);
                        }
                    }
                }
            }
        }

        // Expire keys that have timed out (fallback for terminals
        // without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    /// Held-direction snapshot for this frame's movement.
    pub fn direction_snapshot(&self) -> InputSnapshot {
        InputSnapshot {
            up: self.any_held(KEYS_UP),
            right: self.any_held(KEYS_RIGHT),
            down: self.any_held(KEYS_DOWN),
            left: self.any_held(KEYS_LEFT),
        }
    }

    /// Fresh press of the terminal-interact key this frame.
    pub fn interact_pressed(&self) -> bool {
        self.any_pressed(KEYS_INTERACT)
    }

    /// Fresh press of the skip-to-end key this frame.
    pub fn skip_pressed(&self) -> bool {
        self.any_pressed(KEYS_SKIP)
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        use crossterm::event::KeyModifiers;
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
