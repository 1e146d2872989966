/// Terminal message playback with one-shot world effects.
///
/// Playback is sequential and monotonic: each `advance` dispatches
/// exactly the message at `read_count`, applies its effect, then
/// increments. Reading past the end is a normal Exhausted signal,
/// never an error. Effects are data, not code — a small tagged enum
/// interpreted here, so scripts stay declarative.
///
/// Effects run synchronously in the same tick that processed the
/// interaction; the presentation layer paces the visual reveal on its
/// own and the world state never waits for it.

use serde::Deserialize;
use thiserror::Error;

use crate::domain::map::{MapError, MapObject, ObjectKind};

use super::event::GameEvent;
use super::world::GameState;

/// Upper bound on messages dispatched by one skip-to-end call.
/// Hitting it stops the drain; it does not crash on a malformed
/// script that would otherwise spin.
pub const SKIP_LIMIT: usize = 64;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("no terminal with id {0:?}")]
    UnknownTerminal(String),
    #[error("effect raised ship speed to {value}, outside [0, 1)")]
    BadSpeed { value: f64 },
    #[error(transparent)]
    Map(#[from] MapError),
}

/// One scripted line. `immediate` asks the display to skip the
/// typing reveal; effects fire exactly once, on dispatch.
#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub sender: String,
    pub text: String,
    #[serde(default)]
    pub immediate: bool,
    #[serde(default)]
    pub effect: Option<Effect>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    RemoveWall { id: String },
    SetSweepDisabled { on: bool },
    AddMarker { x: i32, y: i32 },
    ClearMarkers,
    RaiseSpeedLimit { value: f64 },
    RevealHud,
}

/// A narrative checkpoint: ordered script plus how far the player
/// has read it.
#[derive(Clone, Debug)]
pub struct Terminal {
    pub id: String,
    pub read_count: usize,
    pub messages: Vec<Message>,
}

impl Terminal {
    pub fn new(id: &str, messages: Vec<Message>) -> Self {
        Terminal { id: id.to_string(), read_count: 0, messages }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Advance {
    /// This many messages were dispatched (1, or more under skip).
    Dispatched(usize),
    /// The script was already fully read.
    Exhausted,
}

/// Dispatch the next message of a terminal, or all remaining ones
/// when `skip` is set. An unknown terminal id means the deck and the
/// trigger wiring disagree — a content bug, reported as an error.
pub fn advance(
    world: &mut GameState,
    terminal_id: &str,
    skip: bool,
    events: &mut Vec<GameEvent>,
) -> Result<Advance, NarrativeError> {
    let limit = if skip { SKIP_LIMIT } else { 1 };
    let mut dispatched = 0;

    for _ in 0..limit {
        // Borrow the terminal just long enough to take one message;
        // effects need the rest of the world mutable.
        let msg = {
            let term = world
                .terminals
                .get_mut(terminal_id)
                .ok_or_else(|| NarrativeError::UnknownTerminal(terminal_id.to_string()))?;
            match term.messages.get(term.read_count) {
                Some(m) => {
                    let m = m.clone();
                    term.read_count += 1;
                    m
                }
                None => break,
            }
        };

        events.push(GameEvent::MessageRevealed {
            sender: msg.sender.clone(),
            text: msg.text.clone(),
            immediate: msg.immediate,
        });
        if let Some(effect) = msg.effect {
            apply_effect(world, effect, events)?;
        }
        dispatched += 1;
    }

    if dispatched == 0 {
        events.push(GameEvent::TerminalExhausted { id: terminal_id.to_string() });
        return Ok(Advance::Exhausted);
    }
    Ok(Advance::Dispatched(dispatched))
}

fn apply_effect(
    world: &mut GameState,
    effect: Effect,
    events: &mut Vec<GameEvent>,
) -> Result<(), NarrativeError> {
    match effect {
        Effect::RemoveWall { id } => {
            world.map.remove_wall(&id)?;
            events.push(GameEvent::WallRemoved { id });
        }
        Effect::SetSweepDisabled { on } => {
            world.sweep.disabled = on;
        }
        Effect::AddMarker { x, y } => {
            world.objects.push(MapObject { x, y, kind: ObjectKind::Marker, id: None });
            events.push(GameEvent::MarkerPlaced { x, y });
        }
        Effect::ClearMarkers => {
            world.objects.retain(|o| o.kind != ObjectKind::Marker);
            events.push(GameEvent::MarkersCleared);
        }
        Effect::RaiseSpeedLimit { value } => {
            if !(0.0..1.0).contains(&value) {
                return Err(NarrativeError::BadSpeed { value });
            }
            world.ship_speed = value;
            events.push(GameEvent::SpeedLimitRaised { value });
        }
        Effect::RevealHud => {
            world.hud_revealed = true;
            events.push(GameEvent::HudRevealed);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::config::GameConfig;
    use crate::domain::map::{ObjectKind, TileMap, WallSide};
    use crate::domain::tile::Tile;

    fn msg(text: &str, effect: Option<Effect>) -> Message {
        Message {
            sender: "echo".to_string(),
            text: text.to_string(),
            immediate: false,
            effect,
        }
    }

    /// World with one Hull tile (door-taggable) and one terminal.
    fn world_with(messages: Vec<Message>) -> GameState {
        let mut config = GameConfig::default();
        config.world.world_w = 300;
        config.world.world_h = 300;
        config.player.start_x = 50;
        config.player.start_y = 50;

        let mut tiles = vec![vec![Tile::Deck; 3]; 3];
        tiles[1][1] = Tile::Hull;
        let mut map = TileMap::new(tiles, 100, 300, 300).unwrap();
        map.tag_door("hatch", 1, 1, WallSide::North).unwrap();

        let mut terminals = HashMap::new();
        terminals.insert("t1".to_string(), Terminal::new("t1", messages));
        GameState::new(&config, map, vec![], terminals)
    }

    #[test]
    fn sequential_playback_then_exhausted() {
        let mut world = world_with(vec![msg("one", None), msg("two", None), msg("three", None)]);
        let mut events = vec![];

        for expect in ["one", "two", "three"] {
            let got = advance(&mut world, "t1", false, &mut events).unwrap();
            assert_eq!(got, Advance::Dispatched(1));
            match events.last().unwrap() {
                GameEvent::MessageRevealed { text, .. } => assert_eq!(text, expect),
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(world.terminals["t1"].read_count, 3);

        // Fourth call: a no-op signal, not an error
        let got = advance(&mut world, "t1", false, &mut events).unwrap();
        assert_eq!(got, Advance::Exhausted);
        assert_eq!(world.terminals["t1"].read_count, 3);
    }

    #[test]
    fn skip_dispatches_all_remaining_in_order() {
        let mut world = world_with(vec![msg("a", None), msg("b", None), msg("c", None)]);
        let mut events = vec![];
        let got = advance(&mut world, "t1", true, &mut events).unwrap();
        assert_eq!(got, Advance::Dispatched(3));

        let texts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::MessageRevealed { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn skip_stops_at_the_safety_limit() {
        let script: Vec<_> = (0..SKIP_LIMIT + 6).map(|i| msg(&format!("m{i}"), None)).collect();
        let mut world = world_with(script);
        let mut events = vec![];

        let got = advance(&mut world, "t1", true, &mut events).unwrap();
        assert_eq!(got, Advance::Dispatched(SKIP_LIMIT));
        // Recoverable: a second skip drains the tail
        let got = advance(&mut world, "t1", true, &mut events).unwrap();
        assert_eq!(got, Advance::Dispatched(6));
    }

    #[test]
    fn effects_fire_once_in_playback_order() {
        let mut world = world_with(vec![
            msg("door", Some(Effect::RemoveWall { id: "hatch".to_string() })),
            msg("quiet", Some(Effect::SetSweepDisabled { on: true })),
            msg("mark", Some(Effect::AddMarker { x: 120, y: 80 })),
            msg("hud", Some(Effect::RevealHud)),
            msg("burn", Some(Effect::RaiseSpeedLimit { value: 0.9 })),
        ]);
        let walls_before = world.map.walls().len();
        let mut events = vec![];

        advance(&mut world, "t1", true, &mut events).unwrap();

        assert_eq!(world.map.walls().len(), walls_before - 1);
        assert!(world.sweep.disabled);
        assert!(world.objects.iter().any(|o| o.kind == ObjectKind::Marker && o.x == 120));
        assert!(world.hud_revealed);
        assert!((world.ship_speed - 0.9).abs() < 1e-9);

        // Re-reading is impossible: playback is monotonic, so the
        // wall effect cannot fire twice.
        let got = advance(&mut world, "t1", true, &mut events).unwrap();
        assert_eq!(got, Advance::Exhausted);
    }

    #[test]
    fn clear_markers_removes_only_markers() {
        let mut world = world_with(vec![
            msg("mark", Some(Effect::AddMarker { x: 10, y: 10 })),
            msg("clear", Some(Effect::ClearMarkers)),
        ]);
        world.objects.push(MapObject { x: 1, y: 1, kind: ObjectKind::Decorative, id: None });

        let mut events = vec![];
        advance(&mut world, "t1", false, &mut events).unwrap();
        assert!(world.objects.iter().any(|o| o.kind == ObjectKind::Marker));
        advance(&mut world, "t1", false, &mut events).unwrap();
        assert!(!world.objects.iter().any(|o| o.kind == ObjectKind::Marker));
        assert!(world.objects.iter().any(|o| o.kind == ObjectKind::Decorative));
    }

    #[test]
    fn removing_a_wall_that_never_existed_is_fatal() {
        let mut world = world_with(vec![msg(
            "oops",
            Some(Effect::RemoveWall { id: "no-such-door".to_string() }),
        )]);
        let mut events = vec![];
        let err = advance(&mut world, "t1", false, &mut events).unwrap_err();
        assert!(matches!(err, NarrativeError::Map(MapError::UnknownWall(_))));
    }

    #[test]
    fn unknown_terminal_is_fatal() {
        let mut world = world_with(vec![]);
        let mut events = vec![];
        let err = advance(&mut world, "nope", false, &mut events).unwrap_err();
        assert!(matches!(err, NarrativeError::UnknownTerminal(_)));
    }

    #[test]
    fn speed_outside_unit_interval_is_fatal() {
        let mut world = world_with(vec![msg(
            "ftl",
            Some(Effect::RaiseSpeedLimit { value: 1.0 }),
        )]);
        let mut events = vec![];
        let err = advance(&mut world, "t1", false, &mut events).unwrap_err();
        assert!(matches!(err, NarrativeError::BadSpeed { .. }));
    }

    #[test]
    fn effect_toml_schema() {
        let effect: Effect =
            toml::from_str::<Message>(
                "sender = \"system\"\ntext = \"hatch open\"\n[effect]\nkind = \"remove_wall\"\nid = \"hatch\"\n",
            )
            .unwrap()
            .effect
            .unwrap();
        assert!(matches!(effect, Effect::RemoveWall { ref id } if id == "hatch"));
    }
}
