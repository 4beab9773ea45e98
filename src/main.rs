#![deny(clippy::all)]
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

use std::error::Error;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env};
use log::{info, warn};
use structopt::StructOpt;

mod config;
mod error;
mod flight;
mod geo;
mod igc;
mod logbook;
mod sites;
mod template;
mod units;

use config::Config;
use flight::Fix;
use logbook::{CollectionSummary, FlightSummary, Options};
use sites::SiteCollection;
use template::{render, unescape, Fields};
use units::{AltitudeUnit, ClimbUnit, SpeedUnit, TimeFormat, Units};

#[derive(StructOpt)]
#[structopt(name = "igc-logbook", about = "Flight statistics and logbook entries from IGC track logs")]
struct Args {
    /// Config file to use instead of searching for igc-logbook.toml
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// One templated logbook line per flight, plus a batch summary
    #[structopt(name = "logbook")]
    Logbook(LogbookArgs),
    /// Show the headers and fixes of a single track
    #[structopt(name = "parse")]
    Parse(ParseArgs),
    /// List the fields usable in --format and --summary-format
    #[structopt(name = "fields")]
    Fields,
    /// Print the effective configuration
    #[structopt(name = "config")]
    Config,
}

#[derive(StructOpt)]
struct CommonArgs {
    /// m or ft
    #[structopt(short = "a", long = "altitude-unit")]
    altitude_unit: Option<String>,
    /// 24h or ampm
    #[structopt(short = "t", long = "time-format")]
    time_format: Option<String>,
}

#[derive(StructOpt)]
struct LogbookArgs {
    /// IGC files or directories holding them
    #[structopt(name = "paths", parse(from_os_str), required = true)]
    paths: Vec<PathBuf>,
    /// Descend into subdirectories
    #[structopt(short = "r", long = "recursive")]
    recursive: bool,
    #[structopt(short = "f", long = "format")]
    format: Option<String>,
    /// Always print the batch summary, even for a single flight
    #[structopt(long = "summary")]
    summary: bool,
    #[structopt(long = "summary-format")]
    summary_format: Option<String>,
    /// CSV of name,lat,lon,radius used to name takeoff and landing sites
    #[structopt(long = "sites", parse(from_os_str))]
    sites: Option<PathBuf>,
    /// Seconds over which short-interval ground speed is re-measured
    #[structopt(long = "speed-window")]
    speed_window: Option<f64>,
    /// kmh, mph, kts or ms
    #[structopt(long = "speed-unit")]
    speed_unit: Option<String>,
    /// ms or fpm
    #[structopt(long = "climb-unit")]
    climb_unit: Option<String>,
    #[structopt(flatten)]
    common: CommonArgs,
}

#[derive(StructOpt)]
struct ParseArgs {
    #[structopt(name = "input", parse(from_os_str))]
    input: PathBuf,
    /// Only the first and last fix
    #[structopt(short = "s", long = "summary")]
    summary: bool,
    #[structopt(flatten)]
    common: CommonArgs,
}

/// Flag value, else config value. Unknown names are reported and will fall
/// back to the metric default.
fn pick<'a>(what: &str, flag: &'a Option<String>, config: &'a str, known: &[&str]) -> &'a str {
    let value = flag.as_deref().unwrap_or(config);
    if !known.contains(&value) {
        warn!("Unknown {} {:?}, expected one of {}", what, value, known.join(", "));
    }
    value
}

fn load_sites(path: &Path) -> Option<SiteCollection> {
    match SiteCollection::from_file(path) {
        Ok(sites) if sites.is_empty() => {
            warn!("No valid landing sites found in {}", path.display());
            None
        }
        Ok(sites) => Some(sites),
        Err(e) => {
            warn!("Could not load landing sites from {}: {}", path.display(), e);
            None
        }
    }
}

fn run_logbook(config: &Config, args: LogbookArgs) -> Result<(), Box<dyn Error>> {
    let units = Units::new(
        pick("altitude unit", &args.common.altitude_unit, &config.altitude_unit, AltitudeUnit::NAMES),
        pick("speed unit", &args.speed_unit, &config.speed_unit, SpeedUnit::NAMES),
        pick("climb unit", &args.climb_unit, &config.climb_unit, ClimbUnit::NAMES),
    );
    let time_format = TimeFormat::from(pick(
        "time format",
        &args.common.time_format,
        &config.time_format,
        TimeFormat::NAMES,
    ));
    let speed_window = args.speed_window.unwrap_or(config.speed_window);
    let format = unescape(args.format.as_deref().unwrap_or(&config.logbook_format));
    let summary_format = unescape(args.summary_format.as_deref().unwrap_or(&config.summary_format));

    let sites = args
        .sites
        .as_ref()
        .or_else(|| config.sites_database_location.as_ref())
        .and_then(|path| load_sites(path));

    let files = igc::find_files(&args.paths, args.recursive)?;
    if files.is_empty() {
        return Err(error::Error::NoFiles.into());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut summaries = Vec::with_capacity(files.len());

    for path in files {
        info!("Processing {}...", path.display());
        let flight = match igc::read_flight(&path) {
            Ok(flight) => flight,
            Err(e) => {
                warn!("Error parsing {}: {}, skipping", path.display(), e);
                continue;
            }
        };

        let opts = Options {
            sites: sites.as_ref(),
            filename: path.display().to_string(),
            speed_window,
            units,
            time_format,
        };
        match FlightSummary::new(&flight, &opts) {
            Some(summary) => {
                out.write_all(render(&format, &summary)?.as_bytes())?;
                summaries.push(summary);
            }
            None => warn!("{} has no fixes, skipping", path.display()),
        }
    }

    if args.summary || summaries.len() > 1 {
        let collection = CollectionSummary::aggregate(&summaries, units);
        out.write_all(render(&summary_format, &collection)?.as_bytes())?;
    }
    Ok(())
}

fn print_fix(fix: &Fix, prefix: &str, altitude: AltitudeUnit, time_format: TimeFormat) {
    let symbol: &str = altitude.into();
    println!(
        "  {}{}: ({:.5}, {:.5}), Alt(GPS): {}{}, Alt(Baro): {}{}",
        prefix,
        time_format.format(fix.time.time()),
        fix.latlon.lat(),
        fix.latlon.lon(),
        altitude.convert(f64::from(fix.gps_alt)) as i32,
        symbol,
        altitude.convert(f64::from(fix.pressure_alt)) as i32,
        symbol,
    );
}

fn run_parse(config: &Config, args: ParseArgs) -> Result<(), Box<dyn Error>> {
    let altitude = AltitudeUnit::from(pick(
        "altitude unit",
        &args.common.altitude_unit,
        &config.altitude_unit,
        AltitudeUnit::NAMES,
    ));
    let time_format = TimeFormat::from(pick(
        "time format",
        &args.common.time_format,
        &config.time_format,
        TimeFormat::NAMES,
    ));
    let flight = igc::read_flight(&args.input)?;

    println!("Date: {}", flight.date.map(|d| d.to_string()).unwrap_or_default());
    println!("Pilot: {}", flight.pilot);
    println!("Glider Type: {}", flight.glider_type);

    // (label, value, placeholder meaning "not set")
    let headers = [
        ("Crew", &flight.crew, "NIL"),
        ("Glider ID", &flight.glider_id, "NKN"),
        ("Competition ID", &flight.competition_id, "NKN"),
        ("GPS Datum", &flight.gps_datum, ""),
        ("Firmware Version", &flight.firmware_version, ""),
        ("Hardware Version", &flight.hardware_version, ""),
        ("Flight Recorder Type", &flight.recorder_type, ""),
        ("GPS Receiver", &flight.gps_receiver, ""),
        ("Time Zone", &flight.time_zone, ""),
        ("Pressure Altitude Sensor", &flight.pressure_sensor, ""),
        ("GPS Altitude Reference", &flight.alt_gps_ref, ""),
        ("Pressure Altitude Reference", &flight.alt_pressure_ref, ""),
    ];
    for (label, value, unset) in headers.iter() {
        if !value.is_empty() && value.as_str() != *unset {
            println!("{}: {}", label, value);
        }
    }

    println!("\nFixes ({} total):", flight.fixes.len());
    if args.summary {
        if let Some(first) = flight.takeoff() {
            print_fix(first, "First: ", altitude, time_format);
        }
        if flight.fixes.len() > 1 {
            if let Some(last) = flight.landing() {
                print_fix(last, "Last:  ", altitude, time_format);
            }
        }
    } else {
        for fix in &flight.fixes {
            print_fix(fix, "", altitude, time_format);
        }
    }
    Ok(())
}

fn print_fields() {
    println!("Flight fields: {}", FlightSummary::FIELDS.join(", "));
    println!("Summary fields: {}", CollectionSummary::FIELDS.join(", "));
}

fn print_config(config: &Config) -> Result<(), Box<dyn Error>> {
    match &config.source {
        Some(path) => println!("# loaded from {}", path.display()),
        None => println!("# no {} found, defaults", config::CONFIG_FILE),
    }
    print!("{}", toml::to_string(config)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let args = Args::from_args();
    let config = Config::load(args.config.as_deref());

    match args.cmd {
        Command::Logbook(opts) => run_logbook(&config, opts)?,
        Command::Parse(opts) => run_parse(&config, opts)?,
        Command::Fields => print_fields(),
        Command::Config => print_config(&config)?,
    }
    Ok(())
}
