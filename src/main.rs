use std::path::PathBuf;

use clap::{Parser, Subcommand, Args};
use pirate_world::DEFAULT_FPS;

/// # Global Arguments
#[derive(Debug, Parser)]
#[command(version, about = "Pirate platformer simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Run the game headless at a fixed frame rate
    Run(RunArgs),

    /// Validate level files
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Level JSON files in overworld order, built-in levels when omitted
    #[arg(short = 'l', long = "level", value_name = "LEVEL_FILE")]
    levels: Vec<PathBuf>,

    /// Levels unlocked from the start
    #[arg(short = 'u', long = "unlocked", value_name = "LEVEL_INDEX", default_value_t = 0)]
    unlocked: u32,

    /// Skip the overworld and enter this level directly
    #[arg(short = 'e', long = "enter", value_name = "LEVEL_INDEX")]
    enter: Option<u32>,

    /// Simulation frames per second
    #[arg(short = 'f', long = "fps", value_name = "FPS", default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Stop after this many frames
    #[arg(short = 'n', long = "frames", value_name = "FRAMES")]
    frames: Option<u64>,

    /// Scripted input, e.g. "confirm, right:30, right+jump:1"
    #[arg(short = 's', long = "script", value_name = "SCRIPT", default_value_t = String::new())]
    script: String,

    /// Print every render frame as a JSON line
    #[arg(long = "dump-frames")]
    dump_frames: bool,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Level JSON files to validate
    #[arg(value_name = "LEVEL_FILE", required = true)]
    levels: Vec<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .format_file(false)
        .format_line_number(true)
        .init();

    let cli_args = Cli::parse();
    log::info!("Got args: '{:?}'.", cli_args);

    let result = match cli_args.mode {
        Mode::Run(run_args) => cli_run::run(run_args),
        Mode::Check(check_args) => cli_check::run(&check_args.levels),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

mod cli_run {
    use pirate_world::{
        driver::{
            DriverConfig,
            GameDriver,
            InputScript
        },
        game::progress::ProgressData,
        levels::{
            builtin_levels,
            LevelDescriptor
        },
        session::GameSession
    };

    use super::RunArgs;

    pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
        let levels = if args.levels.is_empty() {
            builtin_levels()
        } else {
            args.levels.iter()
                .map(LevelDescriptor::from_file)
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut progress = ProgressData::new();
        progress.unlock_level(args.unlocked);
        let mut session = GameSession::with_progress(levels, progress)?;
        if let Some(index) = args.enter {
            session.enter_level(index)?;
        }

        let config = DriverConfig {
            fps: args.fps,
            max_frames: args.frames,
            script: args.script.parse::<InputScript>()?,
            dump_frames: args.dump_frames,
        };

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(async move {
            let handler = GameDriver::new(session, config).run();

            let (ctrlc_sender, ctrlc_receiver) = tokio::sync::oneshot::channel();
            let mut ctrlc_sender = Some(ctrlc_sender);

            let ctrlc_result = ctrlc::set_handler(move || {
                log::info!("Captured ctrl-C, stopping the game...");
                if let Some(sndr) = ctrlc_sender.take() {
                    let _ = sndr.send(());
                }
            });
            if let Err(e) = ctrlc_result {
                log::warn!("Ctrl-C handler not installed: {e}");
            }

            tokio::select! {
                Ok(()) = ctrlc_receiver => {},
                _ = handler.await_stopped() => {},
            }
            handler.shutdown().await.map_err(Box::<dyn std::error::Error>::from)
        })?;

        log::info!("Ran {} frames, {} events", report.frames, report.events.len());
        if report.game_over {
            println!("Game over after {} frames", report.frames);
        }
        Ok(())
    }
}

mod cli_check {
    use std::path::PathBuf;

    use pirate_world::{
        game::level::Level,
        levels::LevelDescriptor
    };

    pub fn run(paths: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
        for path in paths {
            let descriptor = LevelDescriptor::from_file(path)?;
            let level = Level::from_descriptor(&descriptor)?;
            println!("{}: '{}' ok, {} entities", path.display(), level.name(), level.iter_entities().count());
        }
        Ok(())
    }
}
