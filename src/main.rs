/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use env_logger::{Env, Target};
use log::{info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use config::GameConfig;
use domain::controls::{Action, Controls};
use sim::event::GameEvent;
use sim::level::build_world;
use sim::step;
use sim::view::build_view;
use sim::world::{Phase, WorldState};
use ui::gamepad::GamepadState;
use ui::input::{InputState, KEYS_QUIT};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let (config, config_err) = GameConfig::load();
    init_logging(&config.general.log_file);
    if let Some(e) = config_err {
        warn!("config.toml ignored, using defaults: {e}");
    }

    let seed = config.general.seed.unwrap_or_else(rand::random);
    info!("starting {:?} with seed {}", config.general.preset, seed);
    let mut world = build_world(config.sim.clone(), Pcg32::seed_from_u64(seed));

    let mut renderer = Renderer::new();
    let mut kb = InputState::new();

    match renderer.init() {
        Ok(release_events) => kb.honor_release = release_events,
        Err(e) => {
            eprintln!("Terminal init failed: {e}");
            return;
        }
    }

    let result = game_loop(&mut world, &mut renderer, &mut kb, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    let outcome = match world.phase {
        Phase::Won => "You found the treasure!",
        Phase::GameOver => "You were defeated.",
        Phase::Playing => "See you next voyage.",
    };
    println!();
    println!("Thanks for playing Isle Quest! {outcome}");
    println!("Currency: {}", world.player.currency);
}

/// Log to the configured file so output never lands on the game screen.
/// Falls back to stderr at warn level when the file can't be created.
fn init_logging(path: &Path) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    let file_err = match File::create(path) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            None
        }
        Err(e) => {
            builder.filter_level(log::LevelFilter::Warn);
            Some(e)
        }
    };
    builder.init();
    if let Some(e) = file_err {
        warn!("cannot open log file {}: {e}", path.display());
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    kb: &mut InputState,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad detected");
    }
    let mut controls = Controls::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.general.frame_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(world, kb, &gp, &mut controls) {
            break;
        }

        // Presses between ticks stay latched until the core consumes them.
        kb.write_controls(&mut controls, |a| gp.held(a), |a| gp.pressed(a));

        if last_tick.elapsed() >= tick_rate {
            fit_viewport(world, renderer);
            let events = step::step(world, &mut controls);
            announce(world, &events);
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(&build_view(world))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Size the camera to what the terminal can show, capped to the world.
fn fit_viewport(world: &mut WorldState, renderer: &Renderer) {
    let (cols, rows) = renderer.viewport_tiles();
    let ts = world.terrain.tile_size();
    let (world_w, world_h) = world.terrain.pixel_size();
    world.camera.set_viewport((cols as f32 * ts).min(world_w), (rows as f32 * ts).min(world_h));
    world.follow_player();
}

fn announce(world: &mut WorldState, events: &[GameEvent]) {
    for event in events {
        if let Some((text, frames)) = event.message() {
            world.set_message(&text, frames);
        }
    }
}

/// Quit, pause and restart. Returns true when the player quits.
fn handle_meta(world: &mut WorldState, kb: &InputState, gp: &GamepadState, controls: &mut Controls) -> bool {
    if kb.any_pressed(KEYS_QUIT) {
        return true;
    }
    let pause = kb.action_pressed(Action::Pause) || gp.pressed(Action::Pause);
    let restart = kb.action_pressed(Action::Restart) || gp.pressed(Action::Restart);

    match world.phase {
        Phase::Playing if pause => {
            world.paused = !world.paused;
            controls.clear();
            info!("{}", if world.paused { "paused" } else { "resumed" });
        }
        Phase::Playing if restart && world.paused => {
            step::restart(world);
            controls.clear();
            world.set_message("A new voyage begins", 60);
        }
        Phase::GameOver | Phase::Won if restart => {
            step::restart(world);
            controls.clear();
            world.set_message("A new voyage begins", 60);
        }
        _ => {}
    }
    false
}
