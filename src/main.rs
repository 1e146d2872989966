/// Entry point and frame loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use sim::deck;
use sim::event::GameEvent;
use sim::narrative::{self, Advance};
use sim::step;
use sim::world::GameState;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(16);

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

fn main() {
    env_logger::init();
    let config = GameConfig::load();

    // Content errors are fatal here, before the terminal is taken
    // over, so the diagnostic lands on a usable stderr.
    let mut world = match deck::build_world(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Deck load failed: {e}");
            std::process::exit(1);
        }
    };
    log::info!(
        "deck loaded: {}x{} tiles, {} walls, {} terminals",
        world.map.cols(),
        world.map.rows(),
        world.map.walls().len(),
        world.terminals.len()
    );

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }
}

fn game_loop(
    world: &mut GameState,
    renderer: &mut Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.keyboard_enhanced();
    let mut last_frame = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }

        let dt_ms = last_frame.elapsed().as_millis() as u64;
        last_frame = Instant::now();

        let mut events = step::step(world, kb.direction_snapshot(), dt_ms);

        // Terminal interaction: edge-triggered, nearest terminal in
        // reach. Skip drains the whole script in one press.
        let skip = kb.skip_pressed();
        if kb.interact_pressed() || skip {
            if let Some(id) = world.terminal_in_reach().map(str::to_string) {
                match narrative::advance(world, &id, skip, &mut events)? {
                    Advance::Dispatched(n) => log::debug!("terminal {id}: {n} message(s)"),
                    Advance::Exhausted => log::debug!("terminal {id}: exhausted"),
                }
            }
        }

        process_events(&events);
        renderer.absorb_events(&events);
        renderer.render(world, dt_ms)?;

        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Diagnostic sink for core events. A bust has no enforced
/// consequence yet; it is surfaced here and left to a future
/// game-over flow.
fn process_events(events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::BustDetected { col, row } => {
                log::warn!("sweep caught the stowaway in the open at tile ({col},{row})");
            }
            GameEvent::SweepClear => log::debug!("sweep passed, position shielded"),
            GameEvent::SweepStarted => log::debug!("sweep started"),
            GameEvent::WallRemoved { id } => log::info!("hatch {id} opened"),
            GameEvent::SpeedLimitRaised { value } => log::info!("cruise raised to {value}c"),
            GameEvent::HudRevealed => log::info!("hud uplink established"),
            _ => {}
        }
    }
}
