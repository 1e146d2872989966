/// Deck map: tile grid, walkability queries, derived wall segments.
///
/// ## Coordinates
///
/// Two coordinate spaces, never mixed implicitly:
///   - world px  — player/object positions, continuous-ish (i32)
///   - tile      — grid cell (col, row), world / tile_size (floor)
///
/// ## Walls
///
/// Walls are derived once at construction by scanning each tile
/// against its upper and left neighbor only; right/down boundaries
/// are covered when the other tile is visited. A boundary is emitted
/// when the tile ids differ and at least one side is a blocker, so
/// every such boundary yields exactly one segment.
///
/// Scripted doors attach ids to derived walls; removing a wall by an
/// id that does not exist is a content bug and is reported, not
/// ignored.

use thiserror::Error;

use super::tile::Tile;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("deck grid ({cols}x{rows} tiles of {tile_size}px) does not cover world bounds {world_w}x{world_h}")]
    WorldNotCovered {
        cols: usize,
        rows: usize,
        tile_size: i32,
        world_w: i32,
        world_h: i32,
    },
    #[error("deck grid is empty or ragged at row {row}")]
    BadGrid { row: usize },
    #[error("no derived wall at tile ({col},{row}) side {side:?} for door {id:?}")]
    DoorWithoutWall { id: String, col: usize, row: usize, side: WallSide },
    #[error("no wall with id {0:?} to remove")]
    UnknownWall(String),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Which boundary of a tile a door sits on. Only the two sides the
/// derivation scan emits are addressable.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WallSide {
    North,
    West,
}

/// An impassable boundary segment between two tiles, tile-aligned,
/// one tile long. `id` is set only for scripted doors.
#[derive(Clone, Debug)]
pub struct Wall {
    pub x: i32,
    pub y: i32,
    pub orientation: Orientation,
    pub id: Option<String>,
}

/// Objects drawn on top of tiles. Markers come and go via narrative
/// effects; terminals are interaction points.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectKind {
    Decorative,
    Marker,
    Terminal,
}

#[derive(Clone, Debug)]
pub struct MapObject {
    pub x: i32,
    pub y: i32,
    pub kind: ObjectKind,
    pub id: Option<String>,
}

#[derive(Debug)]
pub struct TileMap {
    tiles: Vec<Vec<Tile>>,
    cols: usize,
    rows: usize,
    tile_size: i32,
    walls: Vec<Wall>,
}

impl TileMap {
    /// Build a map and derive its walls. The grid must be rectangular
    /// and must cover the full world bounds.
    pub fn new(
        tiles: Vec<Vec<Tile>>,
        tile_size: i32,
        world_w: i32,
        world_h: i32,
    ) -> Result<TileMap, MapError> {
        let rows = tiles.len();
        let cols = tiles.first().map_or(0, |r| r.len());
        if rows == 0 || cols == 0 {
            return Err(MapError::BadGrid { row: 0 });
        }
        for (row, r) in tiles.iter().enumerate() {
            if r.len() != cols {
                return Err(MapError::BadGrid { row });
            }
        }
        if (cols as i64) * (tile_size as i64) < world_w as i64
            || (rows as i64) * (tile_size as i64) < world_h as i64
        {
            return Err(MapError::WorldNotCovered {
                cols,
                rows,
                tile_size,
                world_w,
                world_h,
            });
        }

        let walls = derive_walls(&tiles, cols, rows, tile_size);
        Ok(TileMap { tiles, cols, rows, tile_size, walls })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Tile at grid coordinates, or None outside the grid.
    pub fn tile_at(&self, col: i32, row: i32) -> Option<Tile> {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        Some(self.tiles[row as usize][col as usize])
    }

    /// Tile containing a world position, or None outside the grid.
    pub fn tile_at_world(&self, x: i32, y: i32) -> Option<Tile> {
        let (col, row) = self.world_to_tile(x, y);
        self.tile_at(col, row)
    }

    /// World position → containing tile coordinate (floor division,
    /// so negative positions land outside the grid, not in column 0).
    pub fn world_to_tile(&self, x: i32, y: i32) -> (i32, i32) {
        (x.div_euclid(self.tile_size), y.div_euclid(self.tile_size))
    }

    /// Can a point at this world position be stood on?
    /// Anything outside the grid is simply not walkable, which lets
    /// movement probe past the map edge without special-casing.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        match self.tile_at_world(x, y) {
            Some(tile) => tile.is_walkable(),
            None => false,
        }
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Attach a scripted door id to the derived wall on the given
    /// side of a tile. A door definition that matches no derived wall is a
    /// content error.
    pub fn tag_door(
        &mut self,
        id: &str,
        col: usize,
        row: usize,
        side: WallSide,
    ) -> Result<(), MapError> {
        let (wx, wy) = (col as i32 * self.tile_size, row as i32 * self.tile_size);
        let orientation = match side {
            WallSide::North => Orientation::Horizontal,
            WallSide::West => Orientation::Vertical,
        };
        let wall = self
            .walls
            .iter_mut()
            .find(|w| w.x == wx && w.y == wy && w.orientation == orientation);
        match wall {
            Some(w) => {
                w.id = Some(id.to_string());
                Ok(())
            }
            None => Err(MapError::DoorWithoutWall {
                id: id.to_string(),
                col,
                row,
                side,
            }),
        }
    }

    /// Remove a scripted wall (open a door). The wall must exist:
    /// a missing id means the narrative script and the deck disagree.
    pub fn remove_wall(&mut self, id: &str) -> Result<Wall, MapError> {
        let idx = self
            .walls
            .iter()
            .position(|w| w.id.as_deref() == Some(id))
            .ok_or_else(|| MapError::UnknownWall(id.to_string()))?;
        Ok(self.walls.remove(idx))
    }
}

/// One-directional neighbor scan: each tile looks up and left only.
fn derive_walls(tiles: &[Vec<Tile>], cols: usize, rows: usize, tile_size: i32) -> Vec<Wall> {
    let mut walls = Vec::new();
    for row in 0..rows {
        for col in 0..cols {
            let here = tiles[row][col];
            let (wx, wy) = (col as i32 * tile_size, row as i32 * tile_size);
            if row > 0 {
                let above = tiles[row - 1][col];
                if boundary_between(here, above) {
                    walls.push(Wall {
                        x: wx,
                        y: wy,
                        orientation: Orientation::Horizontal,
                        id: None,
                    });
                }
            }
            if col > 0 {
                let left = tiles[row][col - 1];
                if boundary_between(here, left) {
                    walls.push(Wall {
                        x: wx,
                        y: wy,
                        orientation: Orientation::Vertical,
                        id: None,
                    });
                }
            }
        }
    }
    walls
}

fn boundary_between(a: Tile, b: Tile) -> bool {
    a.id() != b.id() && (a.is_blocker() || b.is_blocker())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[u8]]) -> Vec<Vec<Tile>> {
        rows.iter()
            .map(|r| r.iter().map(|&id| Tile::from_id(id).unwrap()).collect())
            .collect()
    }

    #[test]
    fn rejects_grid_smaller_than_world() {
        let tiles = grid(&[&[0, 0], &[0, 0]]);
        // 2x2 tiles of 100px = 200x200, world wants 300 wide
        let err = TileMap::new(tiles, 100, 300, 200).unwrap_err();
        assert!(matches!(err, MapError::WorldNotCovered { .. }));
    }

    #[test]
    fn rejects_ragged_grid() {
        let tiles = vec![
            vec![Tile::Deck, Tile::Deck],
            vec![Tile::Deck],
        ];
        let err = TileMap::new(tiles, 100, 200, 200).unwrap_err();
        assert!(matches!(err, MapError::BadGrid { row: 1 }));
    }

    #[test]
    fn out_of_bounds_is_never_walkable() {
        let map = TileMap::new(grid(&[&[0, 0], &[0, 0]]), 100, 200, 200).unwrap();
        assert!(map.is_walkable(50, 50));
        assert!(!map.is_walkable(-1, 50)); // left of grid, not column 0
        assert!(!map.is_walkable(50, -1));
        assert!(!map.is_walkable(200, 50)); // one px past the edge
        assert!(!map.is_walkable(50, 10_000));
    }

    #[test]
    fn blocker_tile_is_not_walkable() {
        let map = TileMap::new(grid(&[&[0, 1], &[0, 0]]), 100, 200, 200).unwrap();
        assert!(!map.is_walkable(150, 50)); // inside the Hull tile
        assert!(map.is_walkable(99, 50));
    }

    #[test]
    fn wall_derivation_single_blocker() {
        // Hull in the middle of open deck: 4 boundaries, each emitted once.
        let map = TileMap::new(
            grid(&[
                &[0, 0, 0],
                &[0, 1, 0],
                &[0, 0, 0],
            ]),
            100,
            300,
            300,
        )
        .unwrap();
        let walls = map.walls();
        assert_eq!(walls.len(), 4);
        // North of (1,1): horizontal at (100,100)
        assert!(walls.iter().any(|w| w.x == 100 && w.y == 100 && w.orientation == Orientation::Horizontal));
        // West of (1,1): vertical at (100,100)
        assert!(walls.iter().any(|w| w.x == 100 && w.y == 100 && w.orientation == Orientation::Vertical));
        // South boundary comes from tile (1,2) looking up: horizontal at (100,200)
        assert!(walls.iter().any(|w| w.x == 100 && w.y == 200 && w.orientation == Orientation::Horizontal));
        // East boundary comes from tile (2,1) looking left: vertical at (200,100)
        assert!(walls.iter().any(|w| w.x == 200 && w.y == 100 && w.orientation == Orientation::Vertical));
    }

    #[test]
    fn no_wall_between_same_tiles() {
        // Two adjacent Hull tiles: same id, no interior boundary.
        let map = TileMap::new(grid(&[&[1, 1]]), 100, 200, 100).unwrap();
        assert!(map.walls().is_empty());
    }

    #[test]
    fn no_wall_between_differing_walkables() {
        // Deck next to Vent: ids differ but neither blocks.
        let map = TileMap::new(grid(&[&[0, 3]]), 100, 200, 100).unwrap();
        assert!(map.walls().is_empty());
    }

    #[test]
    fn door_tagging_and_removal() {
        let mut map = TileMap::new(
            grid(&[
                &[0, 0],
                &[1, 0],
            ]),
            100,
            200,
            200,
        )
        .unwrap();
        // Horizontal boundary north of the Hull tile at (0,1)
        map.tag_door("brig-door", 0, 1, WallSide::North).unwrap();
        let wall = map.remove_wall("brig-door").unwrap();
        assert_eq!(wall.orientation, Orientation::Horizontal);
        assert_eq!((wall.x, wall.y), (0, 100));
        // Second removal: the id is gone, and that's a content bug.
        assert!(matches!(
            map.remove_wall("brig-door"),
            Err(MapError::UnknownWall(_))
        ));
    }

    #[test]
    fn door_on_boundary_that_was_never_derived() {
        let mut map = TileMap::new(grid(&[&[0, 0], &[0, 0]]), 100, 200, 200).unwrap();
        let err = map.tag_door("ghost", 1, 1, WallSide::West).unwrap_err();
        assert!(matches!(err, MapError::DoorWithoutWall { .. }));
    }

    #[test]
    fn removing_unknown_wall_is_an_error() {
        let mut map = TileMap::new(grid(&[&[0, 1]]), 100, 200, 100).unwrap();
        assert!(matches!(
            map.remove_wall("no-such-door"),
            Err(MapError::UnknownWall(_))
        ));
    }
}
