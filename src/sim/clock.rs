/// Simulated ship clock and the periodic detection sweep.
///
/// The clock advances by the wall-clock frame delta; no dilation is
/// applied to it (the dilation factor below is ship lore, kept as a
/// utility). The sweep is a two-phase cycle driven purely by elapsed
/// time:
///
///   Idle ──(now − last_start ≥ interval)──► Sweeping
///   Sweeping ──(now − start ≥ duration)──► Idle
///
/// While sweeping, progress maps to a scan-line screen x that travels
/// the full viewport width plus the scan band. The crossing check
/// fires at most once per sweep, latched by `crossed`; a fresh sweep
/// resets the latch. `disabled` pins the machine in Idle.

use crate::domain::tile::Tile;

use super::event::GameEvent;

pub const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Monotonic sim time, advanced once per frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimClock {
    pub elapsed_ms: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt_ms: u64) {
        self.elapsed_ms += dt_ms;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    pub interval_ms: u64,
    pub duration_ms: u64,
    pub scan_width: i32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SweepState {
    pub active: bool,
    /// Start of the current (or most recent) sweep. The next cycle
    /// begins `interval_ms` after this, counted from sweep start.
    pub last_start_ms: u64,
    /// Has the scan line already been evaluated against the player
    /// this sweep?
    pub crossed: bool,
    pub disabled: bool,
}

impl SweepState {
    /// Advance the sweep machine to `now`. End-then-start order, so a
    /// long frame can close one cycle and open the next in one call.
    pub fn update(&mut self, now_ms: u64, cfg: &SweepConfig, events: &mut Vec<GameEvent>) {
        if self.active && now_ms >= self.last_start_ms + cfg.duration_ms {
            self.active = false;
            events.push(GameEvent::SweepEnded);
        }
        if !self.active
            && !self.disabled
            && now_ms.saturating_sub(self.last_start_ms) >= cfg.interval_ms
        {
            self.active = true;
            self.last_start_ms = now_ms;
            self.crossed = false;
            events.push(GameEvent::SweepStarted);
        }
    }

    /// Sweep progress in [0, 1]. Zero while idle.
    pub fn fraction(&self, now_ms: u64, cfg: &SweepConfig) -> f64 {
        if !self.active || cfg.duration_ms == 0 {
            return 0.0;
        }
        let since = now_ms.saturating_sub(self.last_start_ms) as f64;
        (since / cfg.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// Screen x of the scan line, None while idle. The line starts
    /// one scan band left of the viewport and exits on the right.
    pub fn scan_x(&self, now_ms: u64, cfg: &SweepConfig, view_w: i32) -> Option<i32> {
        if !self.active {
            return None;
        }
        let travel = (view_w + cfg.scan_width) as f64;
        Some((self.fraction(now_ms, cfg) * travel) as i32 - cfg.scan_width)
    }

    /// Milliseconds until the next sweep begins.
    pub fn countdown_ms(&self, now_ms: u64, cfg: &SweepConfig) -> u64 {
        (self.last_start_ms + cfg.interval_ms).saturating_sub(now_ms)
    }
}

/// Outcome of the once-per-sweep crossing evaluation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Detection {
    Clear,
    Busted,
}

/// Is the player's tile exempt from detection? Shielded tiles hide
/// the player from the sweep; anything else is a bust. A player off
/// the grid cannot happen (positions are clamped to world bounds and
/// the grid covers them), but treat it as exposed rather than panic.
pub fn check(tile: Option<Tile>) -> Detection {
    match tile {
        Some(t) if t.is_shielded() => Detection::Clear,
        _ => Detection::Busted,
    }
}

// ── HUD time formatting ──

/// Elapsed day count, 1-based for display.
pub fn day_count(elapsed_ms: u64) -> u64 {
    elapsed_ms / MS_PER_DAY + 1
}

/// Ship clock as `HH:MM:SS.mmm`, wrapping at 24h.
pub fn format_clock(elapsed_ms: u64) -> String {
    let ms = elapsed_ms % 1000;
    let s = elapsed_ms / 1000 % 60;
    let m = elapsed_ms / 60_000 % 60;
    let h = elapsed_ms / 3_600_000 % 24;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

/// Sweep countdown as `S.mmm`.
pub fn format_countdown(remaining_ms: u64) -> String {
    format!("{}.{:03}", remaining_ms / 1000, remaining_ms % 1000)
}

/// Lorentz factor for the ship's cruise speed (fraction of c).
/// Carried over from the flight console; the sim clock does not
/// apply it.
#[allow(dead_code)]
pub fn time_dilation_factor(speed: f64) -> f64 {
    debug_assert!((0.0..1.0).contains(&speed), "invalid speed: {speed}");
    1.0 / (1.0 - speed * speed).sqrt()
}
