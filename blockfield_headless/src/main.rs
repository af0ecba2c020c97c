// CLI entry point for the headless Blockfield driver.
//
// Runs a full `Session` without a window: a canned input script stands in
// for the keyboard and mouse, `LogRenderer` stands in for the display, and
// the world is saved to a directory on disk. Useful for soak-testing the
// simulation and for producing save files.
//
// Usage:
//   blockfield [OPTIONS]
//     --ticks <N>          Frames to run (default: 600)
//     --save-dir <DIR>     Save directory (default: blockfield-save)
//     --config <FILE>      JSON GameConfig overrides (optional)
//     --script <NAME>      idle | walk | tour (default: tour)
//     --realtime           Pace frames at the configured tick rate
//     --fresh              Ignore any existing save
//
// Logging goes through `env_logger`; set `RUST_LOG=debug` for per-action
// detail or `RUST_LOG=trace` for per-tick collision output.

mod script;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use blockfield_sim::config::GameConfig;
use blockfield_sim::event::{SimEvent, SimEventKind};
use blockfield_sim::render::{RenderFrame, Renderer};
use blockfield_sim::session::Session;
use blockfield_sim::store::DirStore;

use script::Script;

struct Options {
    ticks: u64,
    save_dir: PathBuf,
    config: Option<PathBuf>,
    script: Script,
    realtime: bool,
    fresh: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ticks: 600,
            save_dir: PathBuf::from("blockfield-save"),
            config: None,
            script: Script::Tour,
            realtime: false,
            fresh: false,
        }
    }
}

/// Logs a one-line summary once per simulated second, and every block
/// change as it happens.
struct LogRenderer {
    summary_every: u64,
    frames: u64,
}

impl LogRenderer {
    fn new(tick_rate_hz: u32) -> Self {
        Self {
            summary_every: u64::from(tick_rate_hz.max(1)),
            frames: 0,
        }
    }
}

impl Renderer for LogRenderer {
    fn on_event(&mut self, event: &SimEvent) {
        match &event.kind {
            SimEventKind::BlockPlaced { key, block_type } => {
                log::info!("[{}] placed {block_type} at {key}", event.tick);
            }
            SimEventKind::BlockRemoved { key, block_type } => {
                log::info!("[{}] removed {block_type} at {key}", event.tick);
            }
            SimEventKind::ActionRejected { action, reason } => {
                log::info!("[{}] {action:?} rejected: {reason}", event.tick);
            }
            other => log::debug!("[{}] {other:?}", event.tick),
        }
    }

    fn draw(&mut self, frame: &RenderFrame<'_>) {
        self.frames += 1;
        if self.frames % self.summary_every == 0 {
            let p = frame.pose.position;
            log::info!(
                "tick {:>6} {:?}: avatar ({:.2}, {:.2}, {:.2}) yaw {:.2} pitch {:.2}, {} blocks",
                frame.tick,
                frame.run_state,
                p.x,
                p.y,
                p.z,
                frame.pose.yaw,
                frame.pose.pitch,
                frame.grid.len()
            );
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let options = parse_args();

    let config = match &options.config {
        Some(path) => GameConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        }),
        None => GameConfig::default(),
    };
    let store = DirStore::open(&options.save_dir).unwrap_or_else(|e| {
        eprintln!("Cannot use save directory: {e}");
        std::process::exit(1);
    });
    log::info!(
        "running {} frames of {:?} with saves in {}",
        options.ticks,
        options.script,
        store.root().display()
    );

    let renderer = LogRenderer::new(config.tick_rate_hz);
    let input = options.script.input();
    let mut session = if options.fresh {
        Session::fresh(config, input, renderer, store)
    } else {
        Session::start(config, input, renderer, store)
    };

    if options.realtime {
        let step = Duration::from_secs(1) / session.world().config.tick_rate_hz.max(1);
        let mut last = Instant::now();
        while session.frames() < options.ticks {
            std::thread::sleep(step);
            let now = Instant::now();
            session.advance(now - last);
            last = now;
        }
    } else {
        for _ in 0..options.ticks {
            session.run_frame();
        }
    }

    if let Err(e) = session.save_now() {
        log::warn!("final save failed: {e}");
    }

    let world = session.world();
    let pose = world.avatar.pose();
    println!(
        "tick {} ({} frames, {} saves): avatar at ({:.2}, {:.2}, {:.2}) yaw {:.3} pitch {:.3}, {} blocks, holding {}",
        world.tick,
        session.frames(),
        session.saves(),
        pose.position.x,
        pose.position.y,
        pose.position.z,
        pose.yaw,
        pose.pitch,
        world.grid.len(),
        world.selection
    );
}

/// Parse command-line arguments into `Options`. Uses simple
/// `std::env::args()` matching, no clap dependency.
fn parse_args() -> Options {
    let mut options = Options::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--ticks" => {
                i += 1;
                options.ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--save-dir" => {
                i += 1;
                options.save_dir = args.get(i).map(PathBuf::from).unwrap_or_else(|| {
                    eprintln!("--save-dir requires a value");
                    std::process::exit(1);
                });
            }
            "--config" => {
                i += 1;
                options.config = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--config requires a value");
                    std::process::exit(1);
                });
            }
            "--script" => {
                i += 1;
                options.script = args
                    .get(i)
                    .and_then(|s| Script::parse(s))
                    .unwrap_or_else(|| {
                        eprintln!("--script requires one of: idle, walk, tour");
                        std::process::exit(1);
                    });
            }
            "--realtime" => options.realtime = true,
            "--fresh" => options.fresh = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    options
}

fn print_usage() {
    println!("Usage: blockfield [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --ticks <N>          Frames to run (default: 600)");
    println!("  --save-dir <DIR>     Save directory (default: blockfield-save)");
    println!("  --config <FILE>      JSON GameConfig overrides (optional)");
    println!("  --script <NAME>      idle | walk | tour (default: tour)");
    println!("  --realtime           Pace frames at the configured tick rate");
    println!("  --fresh              Ignore any existing save");
    println!("  --help, -h           Show this help");
}
