//! Offline tools for world-model maps and geofences: converting maps between formats, checking
//! what a geofence would cover, and replaying a set of geofences against a map.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod replay;

use anyhow::Result;
use structopt::StructOpt;

use abstutil::Timer;
use geofence::{get_affected_parts, BroadcasterConfig, ControlMessage};
use geom::LocalProjection;
use map_model::{conformance, Map};

#[derive(StructOpt)]
#[structopt(name = "wmcli", about = "Tools for world-model maps and geofences")]
enum Command {
    /// Print a binary map as JSON
    DumpJSON {
        #[structopt()]
        path: String,
    },
    /// Transform a JSON map that's been manually edited into the binary format the broadcaster
    /// expects.
    ImportJSONMap {
        /// The path to a JSON map file to import
        #[structopt(long)]
        input: String,
        /// The path to write
        #[structopt(long)]
        output: String,
    },
    /// Print the map elements a single geofence would affect.
    Resolve {
        /// The path to a binary map
        #[structopt(long)]
        map: String,
        /// The PROJ-style definition of the map's frame
        #[structopt(long)]
        georeference: String,
        /// The path to a JSON control message
        #[structopt(long)]
        geofence: String,
        /// The path to a JSON broadcaster config. Defaults are used if omitted.
        #[structopt(long)]
        config: Option<String>,
    },
    /// Register a list of geofences against a map, then step through time and print how speed
    /// limits change.
    Replay {
        /// The path to a binary map
        #[structopt(long)]
        map: String,
        /// The PROJ-style definition of the map's frame
        #[structopt(long)]
        georeference: String,
        /// The path to a JSON list of control messages
        #[structopt(long)]
        geofences: String,
        /// Stop after this many seconds since the epoch
        #[structopt(long)]
        until: f64,
        /// How many seconds to advance the clock each step
        #[structopt(long, default_value = "60")]
        step: f64,
        /// The path to a JSON broadcaster config. Defaults are used if omitted.
        #[structopt(long)]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let cmd = Command::from_args();

    // Dumping JSON writes to STDOUT; keep it clean
    if !matches!(cmd, Command::DumpJSON { .. }) {
        abstutil::logger::setup();
    }

    match cmd {
        Command::DumpJSON { path } => dump_json(path)?,
        Command::ImportJSONMap { input, output } => import_json_map(input, output)?,
        Command::Resolve {
            map,
            georeference,
            geofence,
            config,
        } => resolve(map, georeference, geofence, config)?,
        Command::Replay {
            map,
            georeference,
            geofences,
            until,
            step,
            config,
        } => replay::run(map, georeference, geofences, until, step, config)?,
    }
    Ok(())
}

fn dump_json(path: String) -> Result<()> {
    let map = Map::from_binary(&fs_err::read(path)?)?;
    println!("{}", map.to_json()?);
    Ok(())
}

fn import_json_map(input: String, output: String) -> Result<()> {
    let mut timer = Timer::new("import JSON map");
    timer.start("read");
    let mut map = Map::from_json(&fs_err::read(input)?)?;
    timer.stop("read");
    conformance::ensure_compliance(&mut map, &mut timer);
    let bytes = map.to_binary()?;
    fs_err::write(&output, &bytes)?;
    info!("Wrote {} ({} bytes)", output, bytes.len());
    Ok(())
}

fn resolve(
    map_path: String,
    georeference: String,
    geofence_path: String,
    config: Option<String>,
) -> Result<()> {
    let config = load_config(config)?;
    let map = load_map(map_path, &config)?;
    let msg: ControlMessage = abstutil::from_json(&fs_err::read(geofence_path)?)?;
    let affected = get_affected_parts(
        Some(&map),
        &georeference,
        &msg.proj,
        &msg.points,
        &LocalProjection,
        &config,
    )?;
    if affected.is_empty() {
        println!("No map elements affected");
    }
    for id in affected {
        println!("{}", id);
    }
    Ok(())
}

pub(crate) fn load_config(path: Option<String>) -> Result<BroadcasterConfig> {
    match path {
        Some(path) => BroadcasterConfig::from_json(&fs_err::read(path)?),
        None => Ok(BroadcasterConfig::default()),
    }
}

/// Loads a binary map and normalizes it the same way the broadcaster would.
fn load_map(path: String, config: &BroadcasterConfig) -> Result<Map> {
    let mut timer = Timer::new(format!("load {}", path));
    let mut map = Map::from_binary(&fs_err::read(&path)?)?;
    if config.map.default_speed_limit.is_some() {
        map.set_config(config.map.clone());
    }
    conformance::ensure_compliance(&mut map, &mut timer);
    Ok(map)
}
