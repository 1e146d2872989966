/// Player entity and input primitives.
///
/// Positions are world pixels. The player is a fixed square; its
/// top-left corner is the stored position and collision probes work
/// off the leading edge of whichever direction is moving.

/// Held-direction snapshot for one frame. Keys stay "down" across
/// frames until released, so this is sampled state, not an event.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct InputSnapshot {
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,
}

impl InputSnapshot {
    pub fn idle(self) -> bool {
        !(self.up || self.right || self.down || self.left)
    }
}

/// Eight-octant facing, screen coordinates (y grows downward).
/// Diagonals win over single directions when both axes are pressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    North,
    NorthEast,
}

impl Facing {
    /// Facing for the pressed-direction combination, or None when
    /// nothing is pressed (caller keeps the previous facing).
    pub fn from_input(input: InputSnapshot) -> Option<Facing> {
        match (input.up, input.right, input.down, input.left) {
            (true, true, false, false) => Some(Facing::NorthEast),
            (false, true, true, false) => Some(Facing::SouthEast),
            (false, false, true, true) => Some(Facing::SouthWest),
            (true, false, false, true) => Some(Facing::NorthWest),
            (true, false, false, false) => Some(Facing::North),
            (false, true, false, false) => Some(Facing::East),
            (false, false, true, false) => Some(Facing::South),
            (false, false, false, true) => Some(Facing::West),
            _ => None, // idle, or opposing keys cancelling out
        }
    }

    /// Fixed octant angle in degrees, clockwise from east.
    pub fn degrees(self) -> u16 {
        match self {
            Facing::East => 0,
            Facing::SouthEast => 45,
            Facing::South => 90,
            Facing::SouthWest => 135,
            Facing::West => 180,
            Facing::NorthWest => 225,
            Facing::North => 270,
            Facing::NorthEast => 315,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: i32,
    pub y: i32,
    pub facing: Facing,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Player { x, y, facing: Facing::South }
    }
}
