//! Laser Grid headless runner
//!
//! Loads settings, generates a seeded free-play layout, fires a fan of
//! beams from the launch point and runs the fixed-step simulation until
//! every beam is gone or the tick limit is reached. Prints a JSON summary.
//!
//! Usage: `laser-grid [settings.json] [--seed N] [--mirrors N] [--beams N] [--ticks N]`

use std::process::ExitCode;

use serde::Serialize;

use laser_grid::Settings;
use laser_grid::consts::SIM_DT;
use laser_grid::sim::{RemovalReason, SimEvent, SimState, generate_layout, tick};

/// Runner options
#[derive(Debug, Clone)]
struct Options {
    settings_path: Option<String>,
    seed: u64,
    mirrors: usize,
    beams: u32,
    max_ticks: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            settings_path: None,
            seed: 1,
            mirrors: 10,
            beams: 5,
            max_ticks: 60 * 60,
        }
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse()
        .map_err(|_| format!("invalid value for {flag}: {value}"))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => options.seed = parse_value(&arg, args.next())?,
            "--mirrors" => options.mirrors = parse_value(&arg, args.next())?,
            "--beams" => options.beams = parse_value(&arg, args.next())?,
            "--ticks" => options.max_ticks = parse_value(&arg, args.next())?,
            _ if arg.starts_with("--") => return Err(format!("unknown option {arg}")),
            _ => options.settings_path = Some(arg),
        }
    }
    Ok(options)
}

/// Outcome of a run
#[derive(Debug, Default, Serialize)]
struct Summary {
    seed: u64,
    mirrors: usize,
    beams: u32,
    ticks: u64,
    reflections: u64,
    bounces: u64,
    objective_hits: u64,
    out_of_bounds: u64,
    reflection_cap: u64,
    escape_failed: u64,
    escape_anomalies: u64,
    beams_remaining: usize,
}

impl Summary {
    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::ObjectiveReached { .. } => self.objective_hits += 1,
            SimEvent::BeamReflected { .. } => self.reflections += 1,
            SimEvent::BeamBounced { .. } => self.bounces += 1,
            SimEvent::BeamRemoved { reason, .. } => match reason {
                RemovalReason::OutOfBounds => self.out_of_bounds += 1,
                RemovalReason::ReflectionCap => self.reflection_cap += 1,
                RemovalReason::EscapeFailed => self.escape_failed += 1,
                RemovalReason::ObjectiveReached => {}
            },
            SimEvent::BeamEscaped { .. } | SimEvent::PlacementRejected { .. } => {}
        }
    }
}

fn run(options: &Options) -> Result<Summary, String> {
    let settings = match &options.settings_path {
        Some(path) => Settings::load_or_default(path),
        None => Settings::default(),
    };
    let rules = settings.placement_rules();

    let layout = generate_layout(options.seed, options.mirrors, &rules, &settings)
        .map_err(|e| e.to_string())?;

    let mut state = SimState::new();
    for mirror in layout {
        if let Err(reason) = state.insert_mirror(&rules, mirror) {
            log::warn!("Layout mirror rejected by the live set: {}", reason);
        }
    }

    // Fan of beams centered on the launch heading (straight right)
    let inc = settings.angle_increment_deg;
    let half = options.beams.saturating_sub(1) as f32 / 2.0;
    for i in 0..options.beams {
        let angle = (i as f32 - half) * inc;
        state.launch_beam(&settings, angle);
    }
    log::info!(
        "Running {} beams against {} mirrors (seed {})",
        state.beams.len(),
        state.mirrors.len(),
        options.seed
    );

    let mut summary = Summary {
        seed: options.seed,
        mirrors: state.mirrors.len(),
        beams: options.beams,
        ..Default::default()
    };

    while summary.ticks < options.max_ticks && !state.beams.is_empty() {
        for event in tick(&mut state, &settings, SIM_DT) {
            summary.record(&event);
        }
        state.drain_events();
        summary.ticks += 1;
    }

    summary.escape_anomalies = state.escape_anomalies;
    summary.beams_remaining = state.beams.len();
    log::info!(
        "Finished after {} ticks: {} objective hits, {} beams remaining",
        summary.ticks,
        summary.objective_hits,
        summary.beams_remaining
    );
    Ok(summary)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Laser Grid (headless) starting...");

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::from(2);
        }
    };

    match run(&options).and_then(|summary| {
        serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())
    }) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
