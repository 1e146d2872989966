/// GameState: the complete snapshot of a running game.
///
/// Every subsystem works through this struct; nothing lives in
/// globals and no component reaches into another's internals. The
/// step function borrows it for one frame, the renderer reads it.
///
/// ## Viewport
///
/// World and screen coordinates are separate:
///   - `viewport` — world px offset of the top-left visible corner
///   - screen(sx, sy) = world(x − viewport.x, y − viewport.y)
///   - Dead-zone scrolling: the camera is stationary while the
///     player is inside the inner region and tracks 1:1 (by the
///     player's own step) once the player comes within
///     `scroll_padding` of an edge.

use std::collections::HashMap;

use crate::config::GameConfig;
use crate::domain::entity::Player;
use crate::domain::map::{MapObject, ObjectKind, TileMap};
use crate::domain::movement::{MoveParams, Steps};

use super::clock::{SimClock, SweepConfig, SweepState};
use super::narrative::Terminal;

/// World/viewport geometry, fixed for a run.
#[derive(Clone, Copy, Debug)]
pub struct ViewParams {
    pub view_w: i32,
    pub view_h: i32,
    pub world_w: i32,
    pub world_h: i32,
    pub scroll_padding: i32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
}

impl Viewport {
    /// Scroll after a player step. Only the axes that stepped this
    /// frame are considered, and the offset moves by the same step
    /// the player took, clamped to [0, world − view].
    pub fn follow(&mut self, steps: Steps, player: &Player, step: i32, p: &ViewParams) {
        if steps.up && player.y - self.y <= p.scroll_padding {
            self.y = (self.y - step).max(0);
        }
        if steps.right && player.x - self.x >= p.view_w - p.scroll_padding {
            self.x = (self.x + step).min(p.world_w - p.view_w);
        }
        if steps.down && player.y - self.y >= p.view_h - p.scroll_padding {
            self.y = (self.y + step).min(p.world_h - p.view_h);
        }
        if steps.left && player.x - self.x <= p.scroll_padding {
            self.x = (self.x - step).max(0);
        }
    }
}

#[derive(Debug)]
pub struct GameState {
    // ── Static-ish world ──
    pub map: TileMap,
    pub objects: Vec<MapObject>,

    // ── Entities ──
    pub player: Player,

    // ── Camera ──
    pub viewport: Viewport,

    // ── Time / sweep ──
    pub clock: SimClock,
    pub sweep: SweepState,

    // ── Narrative ──
    pub terminals: HashMap<String, Terminal>,

    // ── Ship parameters ──
    /// Cruise speed as a fraction of c. Raised by narrative effects;
    /// feeds the flight-console dilation readout, not the sim clock.
    pub ship_speed: f64,
    pub hud_revealed: bool,

    // ── Fixed parameters ──
    pub view: ViewParams,
    pub move_params: MoveParams,
    pub sweep_cfg: SweepConfig,
}

impl GameState {
    pub fn new(
        config: &GameConfig,
        map: TileMap,
        objects: Vec<MapObject>,
        terminals: HashMap<String, Terminal>,
    ) -> Self {
        GameState {
            map,
            objects,
            player: Player::new(config.player.start_x, config.player.start_y),
            viewport: Viewport::default(),
            clock: SimClock::default(),
            sweep: SweepState::default(),
            terminals,
            ship_speed: config.ship.initial_speed,
            hud_revealed: false,
            view: ViewParams {
                view_w: config.world.view_w,
                view_h: config.world.view_h,
                world_w: config.world.world_w,
                world_h: config.world.world_h,
                scroll_padding: config.world.scroll_padding,
            },
            move_params: MoveParams {
                speed: config.player.speed,
                player_size: config.player.size,
                world_w: config.world.world_w,
                world_h: config.world.world_h,
            },
            sweep_cfg: SweepConfig {
                interval_ms: config.sweep.interval_ms,
                duration_ms: config.sweep.duration_ms,
                scan_width: config.sweep.scan_width,
            },
        }
    }

    /// Player center in world px; the tile under this point is the
    /// player's tile for detection.
    pub fn player_center(&self) -> (i32, i32) {
        let half = self.move_params.player_size / 2;
        (self.player.x + half, self.player.y + half)
    }

    /// Player position in screen space.
    pub fn player_screen(&self) -> (i32, i32) {
        (self.player.x - self.viewport.x, self.player.y - self.viewport.y)
    }

    /// Id of the terminal object within reach of the player, if any.
    /// Reach is one tile from the player's center.
    pub fn terminal_in_reach(&self) -> Option<&str> {
        let (cx, cy) = self.player_center();
        let reach = self.map.tile_size();
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Terminal)
            .filter(|o| (o.x - cx).abs() <= reach && (o.y - cy).abs() <= reach)
            .min_by_key(|o| (o.x - cx).abs() + (o.y - cy).abs())
            .and_then(|o| o.id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Player;
    use crate::domain::movement::Steps;

    const VIEW: ViewParams = ViewParams {
        view_w: 800,
        view_h: 500,
        world_w: 1200,
        world_h: 800,
        scroll_padding: 100,
    };

    #[test]
    fn stationary_inside_the_dead_zone() {
        let mut vp = Viewport::default();
        let player = Player::new(400, 250);
        let steps = Steps { right: true, down: true, ..Default::default() };
        vp.follow(steps, &player, 4, &VIEW);
        assert_eq!((vp.x, vp.y), (0, 0));
    }

    #[test]
    fn tracks_once_within_padding_of_an_edge() {
        let mut vp = Viewport::default();
        // Screen x = 700 = view_w - padding → right edge engaged
        let player = Player::new(700, 250);
        vp.follow(Steps { right: true, ..Default::default() }, &player, 4, &VIEW);
        assert_eq!(vp.x, 4);
        // A step on the other axis does not scroll x
        vp.follow(Steps { down: true, ..Default::default() }, &player, 4, &VIEW);
        assert_eq!(vp.x, 4);
    }

    #[test]
    fn offset_never_leaves_world_bounds() {
        let mut vp = Viewport::default();
        let mut player = Player::new(0, 0);

        // Drag the camera hard toward every corner in turn.
        for _ in 0..2_000 {
            player.x = (player.x + 4).min(VIEW.world_w);
            player.y = (player.y + 4).min(VIEW.world_h);
            vp.follow(Steps { right: true, down: true, ..Default::default() }, &player, 4, &VIEW);
            assert!(vp.x >= 0 && vp.x <= VIEW.world_w - VIEW.view_w);
            assert!(vp.y >= 0 && vp.y <= VIEW.world_h - VIEW.view_h);
        }
        assert_eq!((vp.x, vp.y), (400, 300)); // pinned at the far corner

        for _ in 0..2_000 {
            player.x = (player.x - 4).max(0);
            player.y = (player.y - 4).max(0);
            vp.follow(Steps { left: true, up: true, ..Default::default() }, &player, 4, &VIEW);
            assert!(vp.x >= 0 && vp.x <= VIEW.world_w - VIEW.view_w);
            assert!(vp.y >= 0 && vp.y <= VIEW.world_h - VIEW.view_h);
        }
        assert_eq!((vp.x, vp.y), (0, 0));
    }
}
