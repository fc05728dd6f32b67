//! # Tilewright Main Entry Point
//!
//! Loads a tile catalog and configuration, grows a map step by step and prints
//! the result.

use clap::{Parser, ValueEnum};
use log::{debug, error, info, LevelFilter};
use std::path::PathBuf;
use tilewright::{
    sample_catalog, AsciiRenderer, GenerationConfig, LoggingObserver, MapGenerator, StepStatus,
    TileDatabase, TilewrightError, TilewrightResult,
};

/// How the finished map is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Ascii,
    Json,
}

/// Command line arguments for Tilewright.
#[derive(Parser, Debug)]
#[command(name = "tilewright")]
#[command(about = "Grows dungeon maps from a catalog of door-connected tiles")]
#[command(version)]
struct Args {
    /// Random seed for generation; the wall clock is used when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tile catalog JSON file; the built-in catalog is used when omitted
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Generation configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fewest tiles a finished map may have
    #[arg(long)]
    min_rooms: Option<u32>,

    /// Tile count at which open doors start being closed
    #[arg(long)]
    max_rooms: Option<u32>,

    /// Keep every tile inside the map half-extents
    #[arg(long)]
    bounded: bool,

    /// Largest absolute x a cell may have in bounded mode
    #[arg(long)]
    half_width: Option<i32>,

    /// Largest absolute y a cell may have in bounded mode
    #[arg(long)]
    half_height: Option<i32>,

    /// Restarts allowed before the run is aborted
    #[arg(long)]
    max_tries: Option<u32>,

    /// Pause between steps in milliseconds
    #[arg(long)]
    step_delay_ms: Option<u64>,

    /// Output format for the finished map
    #[arg(long, value_enum, default_value_t = OutputFormat::Ascii)]
    format: OutputFormat,

    /// Log per-step diagnostics (shown at debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> TilewrightResult<()> {
    let args = Args::parse();

    initialize_logging(&args.log_level)?;

    info!("Starting Tilewright v{}", tilewright::VERSION);

    let catalog = match &args.catalog {
        Some(path) => TileDatabase::load(path)?,
        None => sample_catalog()?,
    };
    let config = build_config(&args)?;

    let mut generator = MapGenerator::new(catalog, config)?;
    let cell_size = generator.config().cell_size;
    generator.add_observer(LoggingObserver { cell_size });

    generator.start()?;
    run_paced(&mut generator).await?;

    let map = generator.snapshot().ok_or_else(|| {
        TilewrightError::InvalidState("generator produced no map".to_string())
    })?;
    if let Err(e) = map.validate(generator.config().bounds()) {
        error!("Generated map failed validation: {}", e);
    }

    match args.format {
        OutputFormat::Ascii => println!("{}", AsciiRenderer::new().with_legend().render(&map)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&map)?),
    }

    info!(
        "Finished with {:?}: {} tiles, {} restarts, seed {}",
        map.outcome,
        map.tiles.len(),
        map.tries,
        map.seed
    );

    Ok(())
}

/// Initializes env_logger at the requested level; `RUST_LOG` still applies.
fn initialize_logging(log_level: &str) -> TilewrightResult<()> {
    let level: LevelFilter = log_level.parse().map_err(|_| {
        TilewrightError::InvalidConfig(format!("unknown log level '{}'", log_level))
    })?;

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .parse_default_env()
        .init();

    Ok(())
}

/// Merges the configuration file (if any) with command line overrides.
fn build_config(args: &Args) -> TilewrightResult<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig {
            use_seed: false,
            ..GenerationConfig::default()
        },
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
        config.use_seed = true;
    }
    if let Some(min_rooms) = args.min_rooms {
        config.min_rooms = min_rooms;
    }
    if let Some(max_rooms) = args.max_rooms {
        config.max_rooms = max_rooms;
    }
    if args.bounded {
        config.use_map_bounds = true;
    }
    if let Some(half_width) = args.half_width {
        config.map_half_extents.x = half_width;
    }
    if let Some(half_height) = args.half_height {
        config.map_half_extents.y = half_height;
    }
    if let Some(max_tries) = args.max_tries {
        config.max_tries = max_tries;
    }
    if let Some(step_delay_ms) = args.step_delay_ms {
        config.step_delay_ms = step_delay_ms;
    }
    config.verbose |= args.verbose;

    Ok(config)
}

/// Steps the generator until it finishes, pausing between steps so progress
/// can be followed in the log. Ctrl-C cancels the run and keeps the partial map.
async fn run_paced(generator: &mut MapGenerator<TileDatabase>) -> TilewrightResult<()> {
    let delay = generator.config().step_delay();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let status = generator.step()?;
        if let StepStatus::Restarted { tries } = status {
            debug!("Attempt {} started", tries + 1);
        }
        if status.is_finished() {
            return Ok(());
        }

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, keeping the partial map");
                generator.cancel();
                return Ok(());
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
