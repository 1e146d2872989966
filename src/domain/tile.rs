/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Each tile carries a small numeric id used by deck files. An id
/// that maps to no variant is a content error, reported by the deck
/// loader with the offending coordinate.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Deck,   // open floor
    Hull,   // solid, opaque
    Glass,  // solid, see-through partition
    Vent,   // crawlspace: walkable, hidden from the sweep
    Alcove, // recess: walkable, hidden from the sweep, open sightline
}

impl Tile {
    /// Map a deck-file id to a tile. Unknown ids return None;
    /// the loader turns that into a fatal diagnostic.
    pub fn from_id(id: u8) -> Option<Tile> {
        match id {
            0 => Some(Tile::Deck),
            1 => Some(Tile::Hull),
            2 => Some(Tile::Glass),
            3 => Some(Tile::Vent),
            4 => Some(Tile::Alcove),
            _ => None,
        }
    }

    /// Numeric id as it appears in deck files.
    pub fn id(self) -> u8 {
        match self {
            Tile::Deck => 0,
            Tile::Hull => 1,
            Tile::Glass => 2,
            Tile::Vent => 3,
            Tile::Alcove => 4,
        }
    }

    /// Does this tile block movement?
    pub fn is_blocker(self) -> bool {
        matches!(self, Tile::Hull | Tile::Glass)
    }

    /// Can the player occupy this tile?
    pub fn is_walkable(self) -> bool {
        !self.is_blocker()
    }

    /// Can sight (and the renderer) pass through this tile?
    pub fn is_transparent(self) -> bool {
        matches!(self, Tile::Deck | Tile::Glass | Tile::Alcove)
    }

    /// Is the player exempt from detection while standing here?
    pub fn is_shielded(self) -> bool {
        matches!(self, Tile::Vent | Tile::Alcove)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Deck
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for id in 0..=4u8 {
            let tile = Tile::from_id(id).unwrap();
            assert_eq!(tile.id(), id);
        }
    }

    #[test]
    fn unknown_id_is_none() {
        assert_eq!(Tile::from_id(5), None);
        assert_eq!(Tile::from_id(255), None);
    }

    #[test]
    fn shielded_tiles_are_walkable() {
        // A hiding spot you can't enter would be useless
        for id in 0..=4u8 {
            let tile = Tile::from_id(id).unwrap();
            if tile.is_shielded() {
                assert!(tile.is_walkable(), "{:?} shielded but not walkable", tile);
            }
        }
    }
}
