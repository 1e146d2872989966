/// Deck loader: turns content files into a ready GameState.
///
/// ## Sources (priority order):
///   1. Files named in `config.toml` (`[data] deck = …, script = …`)
///   2. Built-in embedded deck + script
///
/// A named file that is missing falls back to the embedded content
/// with a warning. Content that is present but malformed is a
/// content bug and fails loading with a diagnostic naming the
/// offending id or coordinate.
///
/// ## Deck format (`.txt`):
///   Lines starting with `#` are comments. Every other line is a row
///   of single-digit tile ids (see `domain::tile`). All rows must be
///   the same width and the grid must cover the world bounds.
///
/// ## Script format (`.toml`):
///   ```toml
///   [[doors]]
///   id = "storage-hatch"
///   col = 3
///   row = 2
///   side = "west"          # north | west
///
///   [[terminals]]
///   id = "intro"
///   col = 2
///   row = 1
///   [[terminals.messages]]
///   sender = "system"
///   text = "…"
///   immediate = true
///   [terminals.messages.effect]
///   kind = "reveal_hud"
///   ```

use std::collections::HashMap;

use thiserror::Error;

use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::map::{MapError, MapObject, ObjectKind, TileMap, WallSide};
use crate::domain::tile::Tile;

use super::narrative::{Message, Terminal};
use super::world::GameState;

/// Decorative grid marks are spaced this many world px apart.
const GRID_MARK_SPACING: i32 = 50;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("unknown tile id {ch:?} at col {col}, row {row}")]
    UnknownTile { ch: char, col: usize, row: usize },
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("script parse error: {0}")]
    Script(#[from] toml::de::Error),
    #[error("door {id:?} has invalid side {side:?} (expected \"north\" or \"west\")")]
    BadDoorSide { id: String, side: String },
    #[error("terminal {id:?} at col {col}, row {row} is outside the deck grid")]
    TerminalOffDeck { id: String, col: usize, row: usize },
    #[error("duplicate terminal id {0:?}")]
    DuplicateTerminal(String),
}

// ── Script schema ──

#[derive(Deserialize, Debug, Default)]
struct Script {
    #[serde(default)]
    doors: Vec<DoorDef>,
    #[serde(default)]
    terminals: Vec<TerminalDef>,
}

#[derive(Deserialize, Debug)]
struct DoorDef {
    id: String,
    col: usize,
    row: usize,
    side: String,
}

#[derive(Deserialize, Debug)]
struct TerminalDef {
    id: String,
    col: usize,
    row: usize,
    #[serde(default)]
    messages: Vec<Message>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Load deck + script (external files or embedded) and assemble the
/// initial world.
pub fn build_world(config: &GameConfig) -> Result<GameState, DeckError> {
    let deck_text = read_or_embedded(config.deck_file.as_deref(), EMBEDDED_DECK, "deck");
    let script_text = read_or_embedded(config.script_file.as_deref(), EMBEDDED_SCRIPT, "script");
    build_world_from(config, &deck_text, &script_text)
}

/// Assemble a world from in-memory content. Split out so tests and
/// alternate front ends can skip the filesystem.
pub fn build_world_from(
    config: &GameConfig,
    deck_text: &str,
    script_text: &str,
) -> Result<GameState, DeckError> {
    let tiles = parse_deck(deck_text)?;
    let mut map = TileMap::new(
        tiles,
        config.world.tile_size,
        config.world.world_w,
        config.world.world_h,
    )?;

    let script: Script = toml::from_str(script_text)?;

    for door in &script.doors {
        let side = match door.side.as_str() {
            "north" => WallSide::North,
            "west" => WallSide::West,
            other => {
                return Err(DeckError::BadDoorSide {
                    id: door.id.clone(),
                    side: other.to_string(),
                })
            }
        };
        map.tag_door(&door.id, door.col, door.row, side)?;
    }

    let mut objects = seed_decorations(config);
    let mut terminals = HashMap::new();
    let ts = config.world.tile_size;
    for def in script.terminals {
        if def.col >= map.cols() || def.row >= map.rows() {
            return Err(DeckError::TerminalOffDeck {
                id: def.id,
                col: def.col,
                row: def.row,
            });
        }
        objects.push(MapObject {
            x: def.col as i32 * ts + ts / 2,
            y: def.row as i32 * ts + ts / 2,
            kind: ObjectKind::Terminal,
            id: Some(def.id.clone()),
        });
        let terminal = Terminal::new(&def.id, def.messages);
        if terminals.insert(def.id.clone(), terminal).is_some() {
            return Err(DeckError::DuplicateTerminal(def.id));
        }
    }

    Ok(GameState::new(config, map, objects, terminals))
}

// ══════════════════════════════════════════════════════════════
// Deck parsing
// ══════════════════════════════════════════════════════════════

fn parse_deck(text: &str) -> Result<Vec<Vec<Tile>>, DeckError> {
    let mut tiles = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row_idx = tiles.len();
        let mut row = Vec::with_capacity(trimmed.len());
        for (col, ch) in trimmed.chars().enumerate() {
            let tile = ch
                .to_digit(10)
                .and_then(|d| Tile::from_id(d as u8))
                .ok_or(DeckError::UnknownTile { ch, col, row: row_idx })?;
            row.push(tile);
        }
        tiles.push(row);
    }
    Ok(tiles)
}

/// Decorative survey marks: a dot every 50 px and the corner
/// calibration mark, both inherited from the old flight display.
fn seed_decorations(config: &GameConfig) -> Vec<MapObject> {
    let mut objects = Vec::new();
    let cols = config.world.world_w / GRID_MARK_SPACING;
    let rows = config.world.world_h / GRID_MARK_SPACING;
    for i in 0..cols {
        for j in 0..rows {
            objects.push(MapObject {
                x: i * GRID_MARK_SPACING - 2,
                y: j * GRID_MARK_SPACING - 2,
                kind: ObjectKind::Decorative,
                id: None,
            });
        }
    }
    objects.push(MapObject {
        x: config.world.view_w - 6,
        y: config.world.view_h - 6,
        kind: ObjectKind::Decorative,
        id: Some("corner-mark".to_string()),
    });
    objects
}

fn read_or_embedded(path: Option<&std::path::Path>, embedded: &str, what: &str) -> String {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("could not read {what} file {}: {e}; using built-in {what}", p.display());
                embedded.to_string()
            }
        },
        None => embedded.to_string(),
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback content
// ══════════════════════════════════════════════════════════════

/// 12×8 tiles of 100 px covering the default 1200×800 world.
/// 0 deck, 1 hull, 2 glass, 3 vent, 4 alcove.
const EMBEDDED_DECK: &str = "\
# Cargo deck, aft section
111111111111
100000000001
100110000001
100000003001
100200000001
100003100001
140000000001
111111111111
";

const EMBEDDED_SCRIPT: &str = r#"
[[doors]]
id = "storage-hatch"
col = 3
row = 2
side = "west"

[[terminals]]
id = "intro"
col = 2
row = 1

[[terminals.messages]]
sender = "system"
text = "CARGO DECK 4 // MAINTENANCE ACCESS"
immediate = true

[terminals.messages.effect]
kind = "reveal_hud"

[[terminals.messages]]
sender = "echo"
text = "You made it aboard. Stay off the open deck when the sweep runs."

[[terminals.messages]]
sender = "echo"
text = "There's a crawlspace grate east of you. I marked it."

[terminals.messages.effect]
kind = "add_marker"
x = 850
y = 350

[[terminals]]
id = "engineering"
col = 9
row = 6

[[terminals.messages]]
sender = "echo"
text = "Storage hatch is unlocked. Move before anyone notices."

[terminals.messages.effect]
kind = "remove_wall"
id = "storage-hatch"

[[terminals.messages]]
sender = "echo"
text = "I can blind the sweep from here, but not for long."

[terminals.messages.effect]
kind = "set_sweep_disabled"
on = true

[[terminals.messages]]
sender = "helm"
text = "Increasing cruise to 0.9c. Clocks below will drift further."
immediate = true

[terminals.messages.effect]
kind = "raise_speed_limit"
value = 0.9
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_content_builds_a_world() {
        let config = GameConfig::default();
        let world = build_world_from(&config, EMBEDDED_DECK, EMBEDDED_SCRIPT).unwrap();

        assert_eq!(world.map.cols(), 12);
        assert_eq!(world.map.rows(), 8);
        // Player spawn tile is open deck
        let (cx, cy) = world.player_center();
        assert!(world.map.is_walkable(cx, cy));
        // Both terminals placed and scripted
        assert!(world.terminals.contains_key("intro"));
        assert!(world.terminals.contains_key("engineering"));
        // The scripted hatch got attached to a derived wall
        assert!(world.map.walls().iter().any(|w| w.id.as_deref() == Some("storage-hatch")));
    }

    #[test]
    fn unknown_tile_digit_names_the_coordinate() {
        let deck = "000\n090\n000\n";
        let config = small_config();
        let err = build_world_from(&config, deck, "").unwrap_err();
        match err {
            DeckError::UnknownTile { ch, col, row } => {
                assert_eq!(ch, '9');
                assert_eq!((col, row), (1, 1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_digit_tile_is_rejected() {
        let config = small_config();
        let err = build_world_from(&config, "0a0\n000\n000\n", "").unwrap_err();
        assert!(matches!(err, DeckError::UnknownTile { ch: 'a', .. }));
    }

    #[test]
    fn door_must_match_a_derived_wall() {
        let config = small_config();
        let script = "[[doors]]\nid = \"ghost\"\ncol = 1\nrow = 1\nside = \"north\"\n";
        let err = build_world_from(&config, "000\n000\n000\n", script).unwrap_err();
        assert!(matches!(err, DeckError::Map(MapError::DoorWithoutWall { .. })));
    }

    #[test]
    fn bad_door_side_is_rejected() {
        let config = small_config();
        let script = "[[doors]]\nid = \"d\"\ncol = 1\nrow = 1\nside = \"south\"\n";
        let err = build_world_from(&config, "000\n010\n000\n", script).unwrap_err();
        assert!(matches!(err, DeckError::BadDoorSide { .. }));
    }

    #[test]
    fn terminal_outside_the_grid_is_rejected() {
        let config = small_config();
        let script = "[[terminals]]\nid = \"t\"\ncol = 7\nrow = 0\n";
        let err = build_world_from(&config, "000\n000\n000\n", script).unwrap_err();
        assert!(matches!(err, DeckError::TerminalOffDeck { .. }));
    }

    #[test]
    fn duplicate_terminal_ids_are_rejected() {
        let config = small_config();
        let script = "[[terminals]]\nid = \"t\"\ncol = 0\nrow = 0\n\n[[terminals]]\nid = \"t\"\ncol = 1\nrow = 0\n";
        let err = build_world_from(&config, "000\n000\n000\n", script).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateTerminal(_)));
    }

    #[test]
    fn grid_smaller_than_world_is_rejected() {
        let config = GameConfig::default(); // wants 1200x800
        let err = build_world_from(&config, "00\n00\n", "").unwrap_err();
        assert!(matches!(err, DeckError::Map(MapError::WorldNotCovered { .. })));
    }

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.world.world_w = 300;
        config.world.world_h = 300;
        config.world.view_w = 300;
        config.world.view_h = 300;
        config.player.start_x = 50;
        config.player.start_y = 50;
        config
    }
}
