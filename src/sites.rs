use crate::error::Result;
use crate::geo::LatLon;
use log::{info, warn};
use std::io::Read;
use std::path::Path;

/// A named circular area, e.g. a takeoff or landing field.
#[derive(Clone, Debug, PartialEq)]
pub struct LandingSite {
    pub name: String,
    pub center: LatLon,
    /// meters
    pub radius: f64,
}

impl LandingSite {
    pub fn new(name: &str, center: LatLon, radius: f64) -> Self {
        LandingSite {
            name: name.to_owned(),
            center,
            radius,
        }
    }

    pub fn contains(&self, point: LatLon) -> bool {
        self.center.distance(point) <= self.radius
    }
}

/// Label for `point`: the first site, in order, whose radius covers it.
///
/// Overlapping sites resolve to whichever was listed first, even when a later
/// one is closer. Points outside every site get their coordinates as label.
pub fn find_label(point: LatLon, sites: &[LandingSite]) -> String {
    sites
        .iter()
        .find(|site| site.contains(point))
        .map(|site| site.name.clone())
        .unwrap_or_else(|| point.to_label())
}

#[derive(Clone, Debug, Default)]
pub struct SiteCollection {
    sites: Vec<LandingSite>,
}

impl SiteCollection {
    #[cfg(test)]
    pub fn new(sites: Vec<LandingSite>) -> Self {
        SiteCollection { sites }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SiteCollection> {
        let path = path.as_ref();
        let sites = SiteCollection::from_reader(std::fs::File::open(path)?)?;
        info!("Loaded {} sites from {}", sites.len(), path.display());
        Ok(sites)
    }

    /// Reads `name,lat,lon,radius` rows, with or without a header row.
    /// Rows that don't fit are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<SiteCollection> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut sites = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if i == 0 && record.get(0) == Some("name") {
                continue;
            }
            if record.len() != 4 || record[0].is_empty() {
                warn!("Site row {} is incomplete, ignoring!", i + 1);
                continue;
            }

            match (record[1].parse(), record[2].parse(), record[3].parse()) {
                (Ok(lat), Ok(lon), Ok(radius)) => {
                    sites.push(LandingSite::new(&record[0], LatLon::new(lat, lon), radius))
                }
                _ => warn!("Bad numbers for site {}, ignoring!", &record[0]),
            }
        }

        Ok(SiteCollection { sites })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    #[cfg(test)]
    pub fn sites(&self) -> &[LandingSite] {
        &self.sites
    }

    pub fn find_label(&self, point: LatLon) -> String {
        find_label(point, &self.sites)
    }
}
