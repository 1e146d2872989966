/// Movement rules: per-axis probe-and-step against the tile map.
///
/// Each of the four directions is evaluated independently every
/// frame, so diagonal input applies both axes. The probe point is the
/// leading edge of travel: half the player size ahead on right/down,
/// the top-left corner on up/left. A blocked probe skips that axis
/// entirely for the frame (no clamping up to the wall), which can
/// leave a sub-tile gap of up to speed-1 px. Accepted approximation.
///
/// Per-axis probes do not check the corner tile a diagonal step
/// passes through; diagonal movement may clip a corner both straight
/// probes miss. Accepted simplification.

use super::entity::{Facing, InputSnapshot, Player};
use super::map::TileMap;

/// Which directions actually stepped this frame. The viewport uses
/// this to scroll by the same step on the same axes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Steps {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

impl Steps {
    pub fn any(self) -> bool {
        self.up || self.right || self.down || self.left
    }
}

/// Movement parameters, fixed for a run.
#[derive(Clone, Copy, Debug)]
pub struct MoveParams {
    pub speed: i32,
    pub player_size: i32,
    pub world_w: i32,
    pub world_h: i32,
}

/// Apply one frame of held-direction movement. Returns the directions
/// that stepped. Facing is recomputed from the pressed set; with
/// nothing pressed the previous facing stays.
pub fn apply(player: &mut Player, input: InputSnapshot, map: &TileMap, p: MoveParams) -> Steps {
    let mut steps = Steps::default();
    if input.idle() {
        return steps;
    }
    let half = p.player_size / 2;

    if input.up {
        if map.is_walkable(player.x, player.y - p.speed) {
            player.y = (player.y - p.speed).max(0);
            steps.up = true;
        }
    }
    if input.right {
        if map.is_walkable(player.x + half + p.speed, player.y) {
            player.x = (player.x + p.speed).min(p.world_w - p.player_size);
            steps.right = true;
        }
    }
    if input.down {
        if map.is_walkable(player.x, player.y + half + p.speed) {
            player.y = (player.y + p.speed).min(p.world_h - p.player_size);
            steps.down = true;
        }
    }
    if input.left {
        if map.is_walkable(player.x - p.speed, player.y) {
            player.x = (player.x - p.speed).max(0);
            steps.left = true;
        }
    }

    if let Some(facing) = Facing::from_input(input) {
        player.facing = facing;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;

    fn open_map(cols: usize, rows: usize) -> TileMap {
        let tiles = vec![vec![Tile::Deck; cols]; rows];
        TileMap::new(tiles, 100, cols as i32 * 100, rows as i32 * 100).unwrap()
    }

    fn map_with_blocker(col: usize, row: usize) -> TileMap {
        let mut tiles = vec![vec![Tile::Deck; 3]; 3];
        tiles[row][col] = Tile::Hull;
        TileMap::new(tiles, 100, 300, 300).unwrap()
    }

    const PARAMS: MoveParams = MoveParams {
        speed: 4,
        player_size: 56,
        world_w: 300,
        world_h: 300,
    };

    #[test]
    fn leading_edge_probe_blocks_entry() {
        // Player at (146,150), pressing right with speed 4 and size 56:
        // probe = (146+28+4, 150) = (178,150) → tile (1,1), a blocker.
        let map = map_with_blocker(1, 1);
        let mut player = Player::new(146, 150);
        let steps = apply(&mut player, InputSnapshot { right: true, ..Default::default() }, &map, PARAMS);
        assert!(!steps.right);
        assert_eq!(player.x, 146);
    }

    #[test]
    fn blocked_axis_is_all_or_nothing() {
        // One px short of the wall would still fit, but a blocked
        // probe skips the whole step.
        let map = map_with_blocker(2, 0);
        let mut player = Player::new(170, 20); // probe x = 170+28+4 = 202 → tile 2
        let steps = apply(&mut player, InputSnapshot { right: true, ..Default::default() }, &map, PARAMS);
        assert!(!steps.right);
        assert_eq!(player.x, 170);
    }

    #[test]
    fn axes_are_independent_on_diagonals() {
        // Right is blocked, down is open: the down half of the
        // diagonal still applies.
        let map = map_with_blocker(2, 0);
        let mut player = Player::new(170, 20);
        let input = InputSnapshot { right: true, down: true, ..Default::default() };
        let steps = apply(&mut player, input, &map, PARAMS);
        assert!(!steps.right);
        assert!(steps.down);
        assert_eq!((player.x, player.y), (170, 24));
        assert_eq!(player.facing, Facing::SouthEast);
    }

    #[test]
    fn clamped_to_world_bounds() {
        let map = open_map(3, 3);
        let mut player = Player::new(242, 150);
        for _ in 0..10 {
            apply(&mut player, InputSnapshot { right: true, ..Default::default() }, &map, PARAMS);
        }
        // 300 - 56 = 244
        assert_eq!(player.x, 244);

        let mut player = Player::new(2, 150);
        apply(&mut player, InputSnapshot { left: true, ..Default::default() }, &map, PARAMS);
        assert_eq!(player.x, 0);
    }

    #[test]
    fn no_input_is_a_no_op() {
        let map = open_map(3, 3);
        let mut player = Player::new(150, 150);
        player.facing = Facing::West;
        let steps = apply(&mut player, InputSnapshot::default(), &map, PARAMS);
        assert!(!steps.any());
        assert_eq!((player.x, player.y), (150, 150));
        assert_eq!(player.facing, Facing::West); // unchanged
    }

    #[test]
    fn diagonal_may_clip_a_corner() {
        // Blocker diagonally adjacent: both straight probes pass, so
        // the combined step walks toward the corner unimpeded.
        let map = map_with_blocker(2, 2);
        let mut player = Player::new(140, 140);
        let input = InputSnapshot { right: true, down: true, ..Default::default() };
        let steps = apply(&mut player, input, &map, PARAMS);
        assert!(steps.right && steps.down);
    }
}
