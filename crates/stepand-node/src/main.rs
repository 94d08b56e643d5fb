//! Step& Node - simulated story walk
//!
//! This binary runs a complete walk session against a simulated walker:
//! - Missions generated around the start location
//! - A scripted route at walking pace with optional GPS noise
//! - Dwell auto-completion, or simulated taps with `--no-auto-complete`
//! - A walk summary folded into the session totals

mod sim;

use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use stepand_core::config::{LogFormat, LogLevel, LoggingConfig};
use stepand_core::format::{format_clock, format_distance, format_planned_duration};
use stepand_core::{
    Coordinate, EventFilter, EventType, Genre, SessionContext, StepandConfig, Story, UserProfile,
    WalkEvent, WalkEventPayload, WalkSummary,
};
use stepand_walk::{ScriptedLocationProvider, WalkHandle, WalkService};

#[derive(Parser, Debug)]
#[command(name = "stepand-node")]
#[command(about = "Simulated Step& story walk")]
struct Args {
    /// Configuration file (JSON)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Start latitude in degrees
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Start longitude in degrees
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Story genre (mystery, fantasy, scifi, romance, adventure, horror)
    #[arg(long, short)]
    genre: Option<Genre>,

    /// Story title (defaults to one derived from the genre)
    #[arg(long)]
    title: Option<String>,

    /// Display name for the walker
    #[arg(long, short, default_value = "Walker")]
    name: String,

    /// Walking speed in meters per second
    #[arg(long)]
    speed: Option<f64>,

    /// Maximum GPS noise per sample in meters
    #[arg(long)]
    jitter: Option<f64>,

    /// Seed for the GPS noise
    #[arg(long)]
    seed: Option<u64>,

    /// Run the walk this many times faster than real time
    #[arg(long, default_value_t = 1.0)]
    speedup: f64,

    /// Confirm missions with a simulated tap instead of the dwell timer
    #[arg(long)]
    no_auto_complete: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut StepandConfig) -> anyhow::Result<()> {
        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            config.simulation.start = Coordinate::new(lat, lon)?;
        }
        if let Some(genre) = self.genre {
            config.walk.genre = genre;
        }
        if let Some(speed) = self.speed {
            config.simulation.speed_mps = speed;
        }
        if let Some(jitter) = self.jitter {
            config.simulation.jitter_m = jitter;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if self.no_auto_complete {
            config.walk.auto_complete = false;
        }
        if !self.speedup.is_finite() || self.speedup < 1.0 {
            anyhow::bail!("--speedup must be at least 1, got {}", self.speedup);
        }
        config.validate()?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StepandConfig::load(path)?,
        None => StepandConfig::default(),
    };
    args.apply(&mut config)?;

    // Initialize logging
    init_logging(&config.logging, args.verbose)?;

    let genre = config.walk.genre;
    let title = args
        .title
        .clone()
        .unwrap_or_else(|| format!("{} walk", genre.name()));
    let story = Story::new(title, genre, config.walk.planned_duration);

    info!("Starting Step& walk v{}", stepand_core::VERSION);
    info!(
        "Story: {} ({}, {})",
        story.title,
        genre,
        format_planned_duration(story.planned_duration)
    );
    info!("Start: {}", config.simulation.start);

    let mut session = SessionContext::new(UserProfile {
        name: args.name.clone(),
        ..Default::default()
    });
    session.select_story(story);

    // Plan the simulated route
    let route = sim::plan_route(&config.simulation, config.walk.dwell_delay)?;
    info!(
        "Simulated route: {} samples at {:.1} m/s",
        route.samples.len(),
        config.simulation.speed_mps
    );
    let interval = sim::scale(config.simulation.sample_interval, args.speedup);
    let provider = ScriptedLocationProvider::new(route.start, route.samples, interval).with_name("simulator");

    // Create walk service
    let walk_config = sim::scale_walk(&config.walk, args.speedup);
    let (service, handle, event_rx) = WalkService::new(walk_config, provider)?;
    info!("Walk session {}", handle.session_id());

    // Spawn event reporter
    let filter = if args.verbose {
        EventFilter::default()
    } else {
        EventFilter::for_types(vec![EventType::Lifecycle, EventType::Mission])
    };
    let tap = if config.walk.auto_complete { None } else { Some(handle.clone()) };
    let reporter = tokio::spawn(report_events(event_rx, filter, tap));

    // Ctrl-C ends the walk early with a partial summary
    let stopper = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, finishing walk");
            if let Err(e) = stopper.stop().await {
                warn!("Failed to stop walk: {}", e);
            }
        }
    });

    let summary = service.run().await?;
    reporter.await?;

    let outcome = session.record_walk(summary.clone());
    if outcome.leveled_up {
        info!("{} reached level {}", session.profile().name, outcome.new_level);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, &session);
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose { Level::DEBUG } else { tracing_level(logging.level) };
    let builder = FmtSubscriber::builder().with_max_level(level);
    match logging.format {
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Compact => tracing::subscriber::set_global_default(builder.compact().finish())?,
    }
    Ok(())
}

fn tracing_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Log walk events until the service goes away
///
/// With a `tap` handle, every mission is confirmed as soon as it comes into
/// range, standing in for the user pressing the button.
async fn report_events(
    mut events: broadcast::Receiver<WalkEvent>,
    filter: EventFilter,
    tap: Option<WalkHandle>,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!("Event reporter lagged, skipped {} events", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        if filter.matches(&event) {
            log_event(&event);
        }

        if let (Some(handle), WalkEventPayload::MissionInRange { mission_id, .. }) = (&tap, &event.payload) {
            match handle.confirm_mission().await {
                Ok(completion) => debug!("Confirmed mission {}", completion.mission_id),
                Err(e) => warn!("Could not confirm mission {}: {}", mission_id, e),
            }
        }
    }
}

fn log_event(event: &WalkEvent) {
    match &event.payload {
        WalkEventPayload::Started { missions, first_mission, .. } => {
            info!("Walk started with {} missions, heading for {:?}", missions, first_mission);
        }

        WalkEventPayload::NavigationUpdated { mission_id, fix, travelled_m } => {
            let direction = match fix.relative_bearing_deg {
                Some(relative) => format!("{:+.0}°", stepand_core::geo::wrap_180(relative)),
                None => "here".to_string(),
            };
            debug!(
                "Mission {}: {} ({}), walked {}",
                mission_id,
                format_distance(fix.distance_m),
                direction,
                format_distance(*travelled_m)
            );
        }

        WalkEventPayload::MissionInRange { mission_id, entry } => {
            info!("Mission {} in range (entry {})", mission_id, entry);
        }

        WalkEventPayload::MissionOutOfRange { mission_id } => {
            info!("Left the area of mission {}", mission_id);
        }

        WalkEventPayload::MissionCompleted { mission_id, reason, story_progress, chapter, .. } => {
            info!("Mission {} completed ({:?}), chapter {}", mission_id, reason, story_progress);
            info!("  {}", chapter);
        }

        WalkEventPayload::Tick { elapsed } => {
            debug!("Walk clock {}", format_clock(*elapsed));
        }

        WalkEventPayload::LocationLost { reason } => {
            warn!("Location lost: {}", reason);
        }

        WalkEventPayload::Finished { summary } => {
            info!(
                "Walk finished: {}/{} missions, rank {}",
                summary.missions_completed, summary.missions_total, summary.rank
            );
        }
    }
}

fn print_summary(summary: &WalkSummary, session: &SessionContext) {
    println!("Walk complete! Thanks, {}.", session.profile().name);
    println!("  Time:       {}", format_clock(summary.elapsed));
    println!("  Distance:   {}", format_distance(summary.distance_m));
    println!(
        "  Missions:   {}/{} ({:.0}%)",
        summary.missions_completed, summary.missions_total, summary.completion_percent
    );
    println!("  Rank:       {}", summary.rank);
    println!("  Level:      {}", session.profile().level);
    if !session.profile().badges.is_empty() {
        println!("  Badges:     {}", session.profile().badges.join(", "));
    }
    println!();
    println!("{}", summary.share_message());
}
