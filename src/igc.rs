use crate::error::{Error, Result};
use crate::flight::{Fix, Flight, FlightBuilder};
use crate::geo::LatLon;
use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const B_RECORD: &[(usize, usize)] = &[
    (0, 1),  // Type
    (1, 6),  // Time, HHMMSS UTC
    (7, 8),  // Latitude
    (15, 9), // Longitude
    (24, 1), // Fix validity
    (25, 5), // Pressure altitude
    (30, 5), // GNSS altitude
];

#[derive(Debug)]
pub struct IgcFile {
    name: String,
    buf: String,
}

impl IgcFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<IgcFile> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path)?;
        IgcFile::from_reader(&path.display().to_string(), &mut file)
    }

    pub fn from_reader<B: Read>(name: &str, reader: &mut B) -> Result<IgcFile> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(IgcFile {
            name: name.to_owned(),
            buf: String::from_utf8_lossy(&buf).into_owned(),
        })
    }

    /// Value of the `H` record with the given three letter code, e.g. `PLT`.
    pub fn header(&self, code: &str) -> Option<&str> {
        self.buf
            .lines()
            .filter(|l| l.starts_with('H'))
            .find(|l| l.get(2..5) == Some(code))
            .map(|l| {
                let rest = &l[5..];
                match rest.find(':') {
                    Some(i) => rest[i + 1..].trim(),
                    None => rest.trim(),
                }
            })
    }

    // HFDTE150725 or HFDTEDATE:150725,01
    pub fn date(&self) -> Option<NaiveDate> {
        lazy_static! {
            static ref DATE_REGEX: Regex = Regex::new(r"(\d{2})(\d{2})(\d{2})").unwrap();
        }

        let cap = DATE_REGEX.captures(self.header("DTE")?)?;
        let (d, m, y): (u32, u32, i32) = (cap[1].parse().ok()?, cap[2].parse().ok()?, cap[3].parse().ok()?);
        let century = if y >= 69 { 1900 } else { 2000 };
        NaiveDate::from_ymd_opt(century + y, m, d)
    }

    /// B records stamped on `date`. A clock that runs backwards means the
    /// flight crossed UTC midnight.
    pub fn fixes(&self, date: NaiveDate) -> Vec<Fix> {
        let mut day = date;
        let mut last_time: Option<NaiveTime> = None;
        let mut fixes = Vec::new();

        for r in self.records("B", B_RECORD) {
            let time = NaiveTime::parse_from_str(r[1], "%H%M%S").ok();
            let latlon = LatLon::from_igc(r[2], r[3]);
            let pressure_alt = r[5].parse().ok();
            let gps_alt = r[6].parse().ok();

            match (time, latlon, pressure_alt, gps_alt) {
                (Some(time), Some(latlon), Some(pressure_alt), Some(gps_alt)) => {
                    if last_time.map_or(false, |t| time < t) {
                        day = day.succ_opt().unwrap_or(day);
                    }
                    last_time = Some(time);
                    fixes.push(Fix::new(latlon, pressure_alt, gps_alt, day.and_time(time)));
                }
                _ => warn!("{}: bad B record at {}, ignoring!", self.name, r[1]),
            }
        }
        fixes
    }

    pub fn to_flight(&self) -> Result<Flight> {
        let has_headers = self.buf.lines().any(|l| l.starts_with('H'));
        let date = self.date();
        if date.is_none() {
            debug!("{}: no HFDTE record", self.name);
        }

        let fixes = self.fixes(date.unwrap_or_default());
        if !has_headers && fixes.is_empty() {
            return Err(Error::NoFixes { path: self.name.clone() });
        }

        let header = |code: &str| self.header(code).unwrap_or("").to_owned();

        FlightBuilder::default()
            .date(date)
            .pilot(header("PLT"))
            .crew(header("CM2"))
            .glider_type(header("GTY"))
            .glider_id(header("GID"))
            .competition_id(header("CID"))
            .gps_datum(header("DTM"))
            .firmware_version(header("RFW"))
            .hardware_version(header("RHW"))
            .recorder_type(header("FTY"))
            .gps_receiver(header("GPS"))
            .time_zone(header("TZN"))
            .pressure_sensor(header("PRS"))
            .alt_gps_ref(header("ALG"))
            .alt_pressure_ref(header("ALP"))
            .fixes(fixes)
            .build()
            .map_err(|_| Error::NotYielded)
    }
}

pub fn read_flight<P: AsRef<Path>>(path: P) -> Result<Flight> {
    IgcFile::from_file(path)?.to_flight()
}

/// Collect `.igc` files named directly or found in the given directories.
pub fn find_files<P: AsRef<Path>>(paths: &[P], recursive: bool) -> Result<Vec<PathBuf>> {
    fn is_igc(path: &Path) -> bool {
        path.extension().map_or(false, |e| e.eq_ignore_ascii_case("igc"))
    }

    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if std::fs::metadata(path)?.is_dir() {
            let walker = WalkDir::new(path).min_depth(1).sort_by_file_name();
            let walker = if recursive { walker } else { walker.max_depth(1) };
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() && is_igc(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else if is_igc(path) {
            files.push(path.to_path_buf());
        } else {
            return Err(Error::NotIgc { path: path.display().to_string() });
        }
    }
    Ok(files)
}

struct Span(usize, usize);

impl IgcFile {
    fn records<'a, 'b>(&'a self, ty: &'b str, delimiters: &'b [(usize, usize)]) -> RecordIter<'a, 'b> {
        let delimiters = delimiters.iter().map(|&(p, l)| Span(p, p + l)).collect::<Vec<_>>();
        RecordIter {
            lines: self.buf.lines(),
            ty,
            delimiters,
        }
    }
}

use std::str::Lines;
struct RecordIter<'a, 'b> {
    lines: Lines<'a>,
    ty: &'b str,
    delimiters: Vec<Span>,
}

impl<'a, 'b> Iterator for RecordIter<'a, 'b> {
    type Item = Record<'a>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            let Span(l, r) = self.delimiters[0];
            if line.get(l..r) != Some(self.ty) {
                continue;
            }

            let fields = self
                .delimiters
                .iter()
                .map(|&Span(l, r)| line.get(l..r).map(str::trim))
                .collect::<Option<Vec<_>>>();
            match fields {
                Some(fields) => break Some(Record { fields }),
                None => warn!("Truncated {} record {:?}, ignoring!", self.ty, line),
            }
        }
    }
}

#[derive(Debug)]
struct Record<'a> {
    fields: Vec<&'a str>,
}

use std::ops::Index;
impl<'a> Index<usize> for Record<'a> {
    type Output = &'a str;

    fn index(&self, i: usize) -> &Self::Output {
        &self.fields[i]
    }
}
