/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or
/// incomplete. Tuning values live here; deck layout and terminal
/// scripts are content files resolved by the deck loader with the
/// same search order.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub world: WorldConfig,
    pub player: PlayerConfig,
    pub sweep: SweepTimings,
    pub ship: ShipConfig,
    /// Deck layout file, resolved against the search dirs.
    pub deck_file: Option<PathBuf>,
    /// Terminal script file, resolved against the search dirs.
    pub script_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    pub view_w: i32,
    pub view_h: i32,
    pub world_w: i32,
    pub world_h: i32,
    pub scroll_padding: i32,
    pub tile_size: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct PlayerConfig {
    pub start_x: i32,
    pub start_y: i32,
    pub size: i32,
    pub speed: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct SweepTimings {
    pub interval_ms: u64,
    pub duration_ms: u64,
    pub scan_width: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct ShipConfig {
    /// Cruise speed as a fraction of c; feeds the dilation readout.
    pub initial_speed: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            world: WorldConfig {
                view_w: default_view_w(),
                view_h: default_view_h(),
                world_w: default_world_w(),
                world_h: default_world_h(),
                scroll_padding: default_scroll_padding(),
                tile_size: default_tile_size(),
            },
            player: PlayerConfig {
                start_x: default_start_x(),
                start_y: default_start_y(),
                size: default_player_size(),
                speed: default_player_speed(),
            },
            sweep: SweepTimings {
                interval_ms: default_sweep_interval(),
                duration_ms: default_sweep_duration(),
                scan_width: default_scan_width(),
            },
            ship: ShipConfig { initial_speed: default_ship_speed() },
            deck_file: None,
            script_file: None,
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    sweep: TomlSweep,
    #[serde(default)]
    ship: TomlShip,
    #[serde(default)]
    data: TomlData,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_view_w")]
    view_w: i32,
    #[serde(default = "default_view_h")]
    view_h: i32,
    #[serde(default = "default_world_w")]
    world_w: i32,
    #[serde(default = "default_world_h")]
    world_h: i32,
    #[serde(default = "default_scroll_padding")]
    scroll_padding: i32,
    #[serde(default = "default_tile_size")]
    tile_size: i32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_start_x")]
    start_x: i32,
    #[serde(default = "default_start_y")]
    start_y: i32,
    #[serde(default = "default_player_size")]
    size: i32,
    #[serde(default = "default_player_speed")]
    speed: i32,
}

#[derive(Deserialize, Debug)]
struct TomlSweep {
    #[serde(default = "default_sweep_interval")]
    interval_ms: u64,
    #[serde(default = "default_sweep_duration")]
    duration_ms: u64,
    #[serde(default = "default_scan_width")]
    scan_width: i32,
}

#[derive(Deserialize, Debug)]
struct TomlShip {
    #[serde(default = "default_ship_speed")]
    initial_speed: f64,
}

#[derive(Deserialize, Debug, Default)]
struct TomlData {
    #[serde(default)]
    deck: Option<String>,
    #[serde(default)]
    script: Option<String>,
}

// ── Defaults ──

fn default_view_w() -> i32 { 800 }
fn default_view_h() -> i32 { 500 }
fn default_world_w() -> i32 { 1200 }
fn default_world_h() -> i32 { 800 }
fn default_scroll_padding() -> i32 { 100 }
fn default_tile_size() -> i32 { 100 }
fn default_start_x() -> i32 { 300 }
fn default_start_y() -> i32 { 300 }
fn default_player_size() -> i32 { 56 }
fn default_player_speed() -> i32 { 4 }
fn default_sweep_interval() -> u64 { 10_000 }
fn default_sweep_duration() -> u64 { 2_500 }
fn default_scan_width() -> i32 { 60 }
fn default_ship_speed() -> f64 { 0.7 }

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            view_w: default_view_w(),
            view_h: default_view_h(),
            world_w: default_world_w(),
            world_h: default_world_h(),
            scroll_padding: default_scroll_padding(),
            tile_size: default_tile_size(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            start_x: default_start_x(),
            start_y: default_start_y(),
            size: default_player_size(),
            speed: default_player_speed(),
        }
    }
}

impl Default for TomlSweep {
    fn default() -> Self {
        TomlSweep {
            interval_ms: default_sweep_interval(),
            duration_ms: default_sweep_duration(),
            scan_width: default_scan_width(),
        }
    }
}

impl Default for TomlShip {
    fn default() -> Self {
        TomlShip { initial_speed: default_ship_speed() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults;
    /// an out-of-range ship speed is tuning, not content, so it also
    /// falls back with a warning.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        let mut initial_speed = toml_cfg.ship.initial_speed;
        if !(0.0..1.0).contains(&initial_speed) {
            log::warn!(
                "config.toml ship.initial_speed {initial_speed} outside [0, 1), using {}",
                default_ship_speed()
            );
            initial_speed = default_ship_speed();
        }

        GameConfig {
            world: WorldConfig {
                view_w: toml_cfg.world.view_w,
                view_h: toml_cfg.world.view_h,
                world_w: toml_cfg.world.world_w,
                world_h: toml_cfg.world.world_h,
                scroll_padding: toml_cfg.world.scroll_padding,
                tile_size: toml_cfg.world.tile_size,
            },
            player: PlayerConfig {
                start_x: toml_cfg.player.start_x,
                start_y: toml_cfg.player.start_y,
                size: toml_cfg.player.size,
                speed: toml_cfg.player.speed,
            },
            sweep: SweepTimings {
                interval_ms: toml_cfg.sweep.interval_ms,
                duration_ms: toml_cfg.sweep.duration_ms,
                scan_width: toml_cfg.sweep.scan_width,
            },
            ship: ShipConfig { initial_speed },
            deck_file: resolve_data_file(&search_dirs, toml_cfg.data.deck.as_deref()),
            script_file: resolve_data_file(&search_dirs, toml_cfg.data.script.as_deref()),
        }
    }
}

/// Resolve a data file name against the search dirs; absolute paths
/// pass through untouched.
fn resolve_data_file(search_dirs: &[PathBuf], name: Option<&str>) -> Option<PathBuf> {
    let name = name?;
    let direct = PathBuf::from(name);
    if direct.is_absolute() {
        return Some(direct);
    }
    search_dirs
        .iter()
        .map(|d| d.join(name))
        .find(|p| p.is_file())
        .or(Some(direct))
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        log::warn!("config.toml parse error: {e}; using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
