use chrono::{Duration, NaiveDate};
use itertools::Itertools;
use log::debug;
use std::collections::HashSet;

use crate::flight::{Fix, Flight};
use crate::sites::SiteCollection;
use crate::template::Fields;
use crate::units::{TimeFormat, Units};

/// How a flight is turned into a logbook line.
#[derive(Clone, Debug)]
pub struct Options<'a> {
    pub sites: Option<&'a SiteCollection>,
    pub filename: String,
    /// seconds
    pub speed_window: f64,
    pub units: Units,
    pub time_format: TimeFormat,
}

/// Formats as `XhYm`.
pub fn format_duration(d: Duration) -> String {
    format!("{}h{}m", d.num_hours(), d.num_minutes() % 60)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// One logbook entry, in the units it was built with.
///
/// Raw `date` and `duration` are kept next to their display strings so that
/// aggregation never has to parse text back.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightSummary {
    pub date: Option<NaiveDate>,
    pub duration: Duration,

    pub takeoff_lat: f64,
    pub takeoff_lon: f64,
    pub takeoff_position: String,
    pub takeoff_site: String,
    pub landing_lat: f64,
    pub landing_lon: f64,
    pub landing_position: String,
    pub landing_site: String,
    pub takeoff_alt: i32,
    pub landing_alt: i32,
    pub altitude_diff: i32,
    pub max_altitude: i32,
    pub min_altitude: i32,
    pub max_ground_speed: i32,
    pub max_climb_rate: f64,
    pub max_descent_rate: f64,
    pub takeoff_time: String,
    pub landing_time: String,

    pub pilot: String,
    pub crew: String,
    pub glider_type: String,
    pub glider_id: String,
    pub competition_id: String,
    pub recorder_type: String,
    pub filename: String,
    pub units: Units,
}

impl FlightSummary {
    /// `None` for a flight without fixes, which has no takeoff or landing.
    pub fn new(flight: &Flight, opts: &Options) -> Option<FlightSummary> {
        let takeoff = flight.takeoff()?;
        let landing = flight.landing()?;
        let stats = flight.statistics(opts.speed_window);
        let units = opts.units;

        let label = |fix: &Fix| match opts.sites {
            Some(sites) => sites.find_label(fix.latlon),
            None => fix.latlon.to_label(),
        };
        let alt = |meters: i32| units.altitude.convert(f64::from(meters)) as i32;

        Some(FlightSummary {
            date: flight.date,
            duration: stats.duration,
            takeoff_lat: takeoff.latlon.lat(),
            takeoff_lon: takeoff.latlon.lon(),
            takeoff_position: takeoff.latlon.to_label(),
            takeoff_site: label(takeoff),
            landing_lat: landing.latlon.lat(),
            landing_lon: landing.latlon.lon(),
            landing_position: landing.latlon.to_label(),
            landing_site: label(landing),
            takeoff_alt: alt(takeoff.gps_alt),
            landing_alt: alt(landing.gps_alt),
            altitude_diff: alt(landing.gps_alt - takeoff.gps_alt),
            max_altitude: alt(stats.max_altitude),
            min_altitude: alt(stats.min_altitude),
            max_ground_speed: units.speed.convert(stats.max_ground_speed).round() as i32,
            max_climb_rate: units.climb.convert(stats.max_climb_rate).round(),
            max_descent_rate: units.climb.convert(stats.max_descent_rate).round(),
            takeoff_time: opts.time_format.format(takeoff.time.time()),
            landing_time: opts.time_format.format(landing.time.time()),
            pilot: flight.pilot.clone(),
            crew: flight.crew.clone(),
            glider_type: flight.glider_type.clone(),
            glider_id: flight.glider_id.clone(),
            competition_id: flight.competition_id.clone(),
            recorder_type: flight.recorder_type.clone(),
            filename: opts.filename.clone(),
            units,
        })
    }

    pub fn flight_duration(&self) -> String {
        format_duration(self.duration)
    }
}

impl Fields for FlightSummary {
    const FIELDS: &'static [&'static str] = &[
        "Date",
        "TakeoffLat",
        "TakeoffLon",
        "TakeoffPosition",
        "TakeoffSite",
        "LandingLat",
        "LandingLon",
        "LandingPosition",
        "LandingSite",
        "TakeoffAlt",
        "LandingAlt",
        "AltitudeDiff",
        "MaxAltitude",
        "MinAltitude",
        "MaxGroundSpeed",
        "MaxClimbRate",
        "MaxDescentRate",
        "FlightDuration",
        "TakeoffTime",
        "LandingTime",
        "Pilot",
        "Crew",
        "GliderType",
        "GliderID",
        "CompetitionID",
        "FlightRecorderType",
        "Filename",
        "AltitudeUnit",
        "SpeedUnit",
        "VerticalSpeedUnit",
    ];

    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "Date" => format_date(self.date),
            "TakeoffLat" => self.takeoff_lat.to_string(),
            "TakeoffLon" => self.takeoff_lon.to_string(),
            "TakeoffPosition" => self.takeoff_position.clone(),
            "TakeoffSite" => self.takeoff_site.clone(),
            "LandingLat" => self.landing_lat.to_string(),
            "LandingLon" => self.landing_lon.to_string(),
            "LandingPosition" => self.landing_position.clone(),
            "LandingSite" => self.landing_site.clone(),
            "TakeoffAlt" => self.takeoff_alt.to_string(),
            "LandingAlt" => self.landing_alt.to_string(),
            "AltitudeDiff" => self.altitude_diff.to_string(),
            "MaxAltitude" => self.max_altitude.to_string(),
            "MinAltitude" => self.min_altitude.to_string(),
            "MaxGroundSpeed" => self.max_ground_speed.to_string(),
            "MaxClimbRate" => self.max_climb_rate.to_string(),
            "MaxDescentRate" => self.max_descent_rate.to_string(),
            "FlightDuration" => self.flight_duration(),
            "TakeoffTime" => self.takeoff_time.clone(),
            "LandingTime" => self.landing_time.clone(),
            "Pilot" => self.pilot.clone(),
            "Crew" => self.crew.clone(),
            "GliderType" => self.glider_type.clone(),
            "GliderID" => self.glider_id.clone(),
            "CompetitionID" => self.competition_id.clone(),
            "FlightRecorderType" => self.recorder_type.clone(),
            "Filename" => self.filename.clone(),
            "AltitudeUnit" => self.units.altitude_symbol().to_owned(),
            "SpeedUnit" => self.units.speed_symbol().to_owned(),
            "VerticalSpeedUnit" => self.units.climb_symbol().to_owned(),
            _ => return None,
        };
        Some(value)
    }
}

/// Roll-up of a batch of logbook entries.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionSummary {
    pub total_flights: usize,
    pub total_time: Duration,
    pub avg_flight_time: Duration,
    pub max_flight_time: Duration,
    pub min_flight_time: Duration,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub max_altitude: i32,
    pub avg_max_altitude: i32,
    pub unique_pilots: Vec<String>,
    pub unique_gliders: Vec<String>,
    pub unique_sites: Vec<String>,
    pub units: Units,
}

impl CollectionSummary {
    /// Aggregate the whole batch at once. Every summary must already be in
    /// `units`; nothing is converted here.
    pub fn aggregate(summaries: &[FlightSummary], units: Units) -> CollectionSummary {
        let mut total_time = Duration::zero();
        let mut max_flight_time: Option<Duration> = None;
        let mut min_flight_time: Option<Duration> = None;
        let mut total_altitude: i64 = 0;
        let mut max_altitude: Option<i32> = None;
        let mut date_range: Option<(NaiveDate, NaiveDate)> = None;

        let mut pilots = HashSet::new();
        let mut gliders = HashSet::new();
        let mut sites = HashSet::new();

        for s in summaries {
            total_time = total_time + s.duration;
            max_flight_time = Some(max_flight_time.map_or(s.duration, |d| d.max(s.duration)));
            min_flight_time = Some(min_flight_time.map_or(s.duration, |d| d.min(s.duration)));

            total_altitude += i64::from(s.max_altitude);
            max_altitude = Some(max_altitude.map_or(s.max_altitude, |a| a.max(s.max_altitude)));

            if !s.pilot.is_empty() {
                pilots.insert(s.pilot.as_str());
            }
            if !s.glider_type.is_empty() {
                gliders.insert(s.glider_type.as_str());
            }
            if !s.takeoff_site.is_empty() {
                sites.insert(s.takeoff_site.as_str());
            }

            match (s.date, date_range) {
                (Some(date), Some((first, last))) => date_range = Some((first.min(date), last.max(date))),
                (Some(date), None) => date_range = Some((date, date)),
                (None, _) => debug!("{}: undated, left out of the date range", s.filename),
            }
        }

        let count = summaries.len();
        let (avg_flight_time, avg_max_altitude) = if count == 0 {
            (Duration::zero(), 0)
        } else {
            (total_time / count as i32, (total_altitude / count as i64) as i32)
        };

        let sorted = |set: HashSet<&str>| set.into_iter().sorted().map(str::to_owned).collect::<Vec<_>>();

        CollectionSummary {
            total_flights: count,
            total_time,
            avg_flight_time,
            max_flight_time: max_flight_time.unwrap_or_else(Duration::zero),
            min_flight_time: min_flight_time.unwrap_or_else(Duration::zero),
            first_date: date_range.map(|(first, _)| first),
            last_date: date_range.map(|(_, last)| last),
            max_altitude: max_altitude.unwrap_or(0),
            avg_max_altitude,
            unique_pilots: sorted(pilots),
            unique_gliders: sorted(gliders),
            unique_sites: sorted(sites),
            units,
        }
    }
}

impl Fields for CollectionSummary {
    const FIELDS: &'static [&'static str] = &[
        "TotalFlights",
        "TotalTime",
        "AvgFlightTime",
        "MaxFlightTime",
        "MinFlightTime",
        "FirstDate",
        "LastDate",
        "MaxAltitude",
        "AvgMaxAltitude",
        "UniquePilots",
        "UniqueGliders",
        "UniqueSites",
        "AltitudeUnit",
        "SpeedUnit",
        "VerticalSpeedUnit",
    ];

    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "TotalFlights" => self.total_flights.to_string(),
            "TotalTime" => format_duration(self.total_time),
            "AvgFlightTime" => format_duration(self.avg_flight_time),
            "MaxFlightTime" => format_duration(self.max_flight_time),
            "MinFlightTime" => format_duration(self.min_flight_time),
            "FirstDate" => format_date(self.first_date),
            "LastDate" => format_date(self.last_date),
            "MaxAltitude" => self.max_altitude.to_string(),
            "AvgMaxAltitude" => self.avg_max_altitude.to_string(),
            "UniquePilots" => self.unique_pilots.join(", "),
            "UniqueGliders" => self.unique_gliders.join(", "),
            "UniqueSites" => self.unique_sites.join(", "),
            "AltitudeUnit" => self.units.altitude_symbol().to_owned(),
            "SpeedUnit" => self.units.speed_symbol().to_owned(),
            "VerticalSpeedUnit" => self.units.climb_symbol().to_owned(),
            _ => return None,
        };
        Some(value)
    }
}
