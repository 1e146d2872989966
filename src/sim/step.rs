/// The step function: advances the world by one frame.
///
/// Processing order, fixed because later passes read what earlier
/// ones produced this frame:
///   1. Clock advance
///   2. Sweep start/stop transitions
///   3. Crossing evaluation (against the pre-movement position the
///      renderer last showed)
///   4. Player movement
///   5. Viewport follow (reads the steps movement just took)
///
/// The renderer and the narrative trigger run outside this function;
/// narrative effects mutate the world synchronously in the same tick
/// via `narrative::advance`.

use crate::domain::entity::InputSnapshot;
use crate::domain::movement;

use super::clock::{self, Detection};
use super::event::GameEvent;
use super::world::GameState;

pub fn step(world: &mut GameState, input: InputSnapshot, dt_ms: u64) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();

    world.clock.advance(dt_ms);
    let now = world.clock.elapsed_ms;

    world.sweep.update(now, &world.sweep_cfg, &mut events);
    evaluate_crossing(world, now, &mut events);

    let steps = movement::apply(&mut world.player, input, &world.map, world.move_params);
    if steps.any() {
        world
            .viewport
            .follow(steps, &world.player, world.move_params.speed, &world.view);
    }

    events
}

/// Once per sweep: the first frame the scan line passes the player's
/// screen x, check the player's tile for shielding.
fn evaluate_crossing(world: &mut GameState, now: u64, events: &mut Vec<GameEvent>) {
    if !world.sweep.active || world.sweep.crossed {
        return;
    }
    let scan_x = match world.sweep.scan_x(now, &world.sweep_cfg, world.view.view_w) {
        Some(x) => x,
        None => return,
    };
    let (px, _) = world.player_screen();
    if scan_x <= px {
        return;
    }

    world.sweep.crossed = true;
    let (cx, cy) = world.player_center();
    match clock::check(world.map.tile_at_world(cx, cy)) {
        Detection::Clear => events.push(GameEvent::SweepClear),
        Detection::Busted => {
            let (col, row) = world.map.world_to_tile(cx, cy);
            events.push(GameEvent::BustDetected { col, row });
        }
    }
}
