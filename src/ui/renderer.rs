/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// World px map onto terminal cells at 25 px per column and 50 px per
/// row, which keeps a 100 px tile at a clean 4×2 cells on the usual
/// 2:1 terminal glyph aspect.
///
/// The renderer also owns everything the core must not: the message
/// log with its typing reveal, and the scan-band styling. It consumes
/// core events and paces the visuals itself.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Facing;
use crate::domain::map::{ObjectKind, Orientation};
use crate::domain::tile::Tile;
use crate::sim::clock;
use crate::sim::event::GameEvent;
use crate::sim::world::GameState;

/// World px per terminal column / row.
const SCALE_X: i32 = 25;
const SCALE_Y: i32 = 50;

/// Vertical layout.
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

/// At most this many messages on screen; older ones fall off.
const MSG_LIMIT: usize = 3;
/// Typing reveal: one extra character per this many milliseconds.
const TYPING_DELAY_MS: u64 = 20;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, used
    /// for both Clear and cell backgrounds so inter-row gap pixels
    /// match on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 12, g: 16, b: 24 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }
}

// ── Message log (presentation state, fed by core events) ──

struct LogEntry {
    sender: String,
    text: String,
    /// Characters revealed so far; advances with the typing timer.
    revealed: usize,
    reveal_budget_ms: u64,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    messages: Vec<LogEntry>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            messages: Vec::new(),
            enhanced_keys: false,
        }
    }

    /// Did init manage to turn on keyboard enhancement? Input uses
    /// this to decide whether Release events can be trusted.
    pub fn keyboard_enhanced(&self) -> bool {
        self.enhanced_keys
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Feed this frame's core events into the presentation state.
    pub fn absorb_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::MessageRevealed { sender, text, immediate } = event {
                // System lines always land whole; others type out.
                let instant = *immediate || sender == "system";
                self.messages.push(LogEntry {
                    sender: sender.clone(),
                    text: text.clone(),
                    revealed: if instant { text.chars().count() } else { 0 },
                    reveal_budget_ms: 0,
                });
                if self.messages.len() > MSG_LIMIT {
                    self.messages.remove(0);
                }
            }
        }
    }

    pub fn render(&mut self, world: &GameState, dt_ms: u64) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.tick_typing(dt_ms);

        self.front.clear();
        self.compose_hud(world);
        self.compose_map(world);
        self.compose_messages();
        self.compose_help(world);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Composition ──

    fn compose_hud(&mut self, world: &GameState) {
        let now = world.clock.elapsed_ms;
        if world.hud_revealed {
            let hud = format!(
                "DAY {}  {}  NEXT SWEEP {}  CRUISE {:.2}c",
                clock::day_count(now),
                clock::format_clock(now),
                clock::format_countdown(world.sweep.countdown_ms(now, &world.sweep_cfg)),
                world.ship_speed,
            );
            self.front.put_str(1, HUD_ROW, &hud, Color::Cyan, Cell::BASE_BG);
        } else {
            self.front.put_str(1, HUD_ROW, "-- no uplink --", Color::DarkGrey, Cell::BASE_BG);
        }
        if world.sweep.active {
            let x = self.term_w.saturating_sub(9);
            self.front.put_str(x, HUD_ROW, "SWEEPING", Color::Red, Cell::BASE_BG);
        }
    }

    fn compose_map(&mut self, world: &GameState) {
        let view_cols = (world.view.view_w / SCALE_X) as usize;
        let view_rows = (world.view.view_h / SCALE_Y) as usize;

        // Tiles: sample the world point under each cell center.
        for sy in 0..view_rows {
            for sx in 0..view_cols {
                let wx = world.viewport.x + sx as i32 * SCALE_X + SCALE_X / 2;
                let wy = world.viewport.y + sy as i32 * SCALE_Y + SCALE_Y / 2;
                let cell = match world.map.tile_at_world(wx, wy) {
                    Some(Tile::Deck) => Cell { ch: ' ', fg: Color::DarkGrey, bg: Cell::BASE_BG },
                    Some(Tile::Hull) => Cell { ch: '█', fg: Color::Grey, bg: Cell::BASE_BG },
                    Some(Tile::Glass) => Cell { ch: '░', fg: Color::Cyan, bg: Cell::BASE_BG },
                    Some(Tile::Vent) => Cell { ch: '≡', fg: Color::DarkGreen, bg: Cell::BASE_BG },
                    Some(Tile::Alcove) => Cell { ch: '∙', fg: Color::DarkGreen, bg: Cell::BASE_BG },
                    None => Cell::BLANK,
                };
                self.front.set(sx, MAP_ROW + sy, cell);
            }
        }

        // Decorations, markers, terminals. Survey marks inside
        // opaque tiles stay hidden.
        for obj in &world.objects {
            let (sx, sy) = match self.to_screen_cell(world, obj.x, obj.y) {
                Some(p) => p,
                None => continue,
            };
            if obj.kind == ObjectKind::Decorative {
                let visible = world
                    .map
                    .tile_at_world(obj.x, obj.y)
                    .map_or(false, |t| t.is_transparent());
                if !visible {
                    continue;
                }
            }
            let cell = match obj.kind {
                ObjectKind::Decorative => Cell { ch: '·', fg: Color::DarkGrey, bg: Cell::BASE_BG },
                ObjectKind::Marker => Cell { ch: '◆', fg: Color::Yellow, bg: Cell::BASE_BG },
                ObjectKind::Terminal => Cell { ch: '◉', fg: Color::Green, bg: Cell::BASE_BG },
            };
            self.front.set(sx, sy, cell);
        }

        // Walls: one glyph run per segment.
        for wall in world.map.walls() {
            let is_door = wall.id.is_some();
            let fg = if is_door { Color::Yellow } else { Color::White };
            let ts = world.map.tile_size();
            match wall.orientation {
                Orientation::Horizontal => {
                    for off in (0..ts).step_by(SCALE_X as usize) {
                        if let Some((sx, sy)) = self.to_screen_cell(world, wall.x + off, wall.y) {
                            self.front.set(sx, sy, Cell { ch: '━', fg, bg: Cell::BASE_BG });
                        }
                    }
                }
                Orientation::Vertical => {
                    for off in (0..ts).step_by(SCALE_Y as usize) {
                        if let Some((sx, sy)) = self.to_screen_cell(world, wall.x, wall.y + off) {
                            self.front.set(sx, sy, Cell { ch: '┃', fg, bg: Cell::BASE_BG });
                        }
                    }
                }
            }
        }

        // Player: a 2-cell body, the head glyph showing facing.
        let (px, py) = world.player_screen();
        let psx = (px / SCALE_X) as usize;
        let psy = MAP_ROW + (py / SCALE_Y) as usize;
        let head = facing_glyph(world.player.facing);
        if px >= 0 && py >= 0 {
            self.front.set(psx, psy, Cell { ch: '@', fg: Color::Green, bg: Cell::BASE_BG });
            self.front.set(psx + 1, psy, Cell { ch: head, fg: Color::Green, bg: Cell::BASE_BG });
        }

        // Scan band sweeps across on top of everything.
        if let Some(scan_x) =
            world.sweep.scan_x(world.clock.elapsed_ms, &world.sweep_cfg, world.view.view_w)
        {
            let band_cols = (world.sweep_cfg.scan_width / SCALE_X).max(1);
            let right = scan_x / SCALE_X;
            for c in (right - band_cols)..=right {
                if c < 0 || c as usize >= view_cols {
                    continue;
                }
                for sy in 0..view_rows {
                    let mut cell = self.front.get(c as usize, MAP_ROW + sy);
                    cell.bg = Color::DarkRed;
                    self.front.set(c as usize, MAP_ROW + sy, cell);
                }
            }
        }
    }

    fn compose_messages(&mut self) {
        let base = self.msg_base_row();
        for (i, entry) in self.messages.iter().enumerate() {
            let shown: String = entry.text.chars().take(entry.revealed).collect();
            let (tag_fg, text_fg) = if entry.sender == "system" {
                (Color::Red, Color::Grey)
            } else {
                (Color::Cyan, Color::White)
            };
            let tag = format!("[{}] ", entry.sender);
            self.front.put_str(1, base + i, &tag, tag_fg, Cell::BASE_BG);
            self.front.put_str(1 + tag.chars().count(), base + i, &shown, text_fg, Cell::BASE_BG);
        }
    }

    fn compose_help(&mut self, world: &GameState) {
        let row = self.term_h.saturating_sub(1);
        self.front.put_str(
            1,
            row,
            "[arrows/wasd] move  [enter] read terminal  [x] skip  [q] quit",
            Color::DarkGrey,
            Cell::BASE_BG,
        );
        // Position readout, kept from the old debug line.
        let dbg = format!(
            "p=({},{}) {}° v=({},{})",
            world.player.x,
            world.player.y,
            world.player.facing.degrees(),
            world.viewport.x,
            world.viewport.y
        );
        let x = self.term_w.saturating_sub(dbg.chars().count() + 1);
        self.front.put_str(x, row, &dbg, Color::DarkGrey, Cell::BASE_BG);
    }

    // ── Helpers ──

    fn msg_base_row(&self) -> usize {
        self.term_h.saturating_sub(1 + MSG_LIMIT)
    }

    /// World px → front-buffer cell, None outside the viewport.
    fn to_screen_cell(&self, world: &GameState, wx: i32, wy: i32) -> Option<(usize, usize)> {
        let sx = wx - world.viewport.x;
        let sy = wy - world.viewport.y;
        if sx < 0 || sy < 0 || sx >= world.view.view_w || sy >= world.view.view_h {
            return None;
        }
        Some(((sx / SCALE_X) as usize, MAP_ROW + (sy / SCALE_Y) as usize))
    }

    fn tick_typing(&mut self, dt_ms: u64) {
        for entry in &mut self.messages {
            let total = entry.text.chars().count();
            if entry.revealed >= total {
                continue;
            }
            entry.reveal_budget_ms += dt_ms;
            while entry.reveal_budget_ms >= TYPING_DELAY_MS && entry.revealed < total {
                entry.reveal_budget_ms -= TYPING_DELAY_MS;
                entry.revealed += 1;
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors at start of frame; ResetColor would
        // fall back to the terminal default and cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}

fn facing_glyph(facing: Facing) -> char {
    match facing {
        Facing::East => '→',
        Facing::SouthEast => '↘',
        Facing::South => '↓',
        Facing::SouthWest => '↙',
        Facing::West => '←',
        Facing::NorthWest => '↖',
        Facing::North => '↑',
        Facing::NorthEast => '↗',
    }
}
