use lazy_static::lazy_static;
use regex::Regex;

/// Spherical earth radius used for every distance in the crate.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon(f64, f64);

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        LatLon(lat, lon)
    }

    pub fn lat(self) -> f64 {
        self.0
    }

    pub fn lon(self) -> f64 {
        self.1
    }

    //Ex: 4548840N 00614760E (degrees, minutes, thousandths of a minute)
    pub fn from_igc(lat: &str, lon: &str) -> Option<Self> {
        fn to_dd(d: f64, m: f64, mmm: f64) -> f64 {
            d + (m + mmm / 1000.0) / 60.0
        }

        lazy_static! {
            static ref IGC_COORD_REGEX: Regex = Regex::new(r"^(\d{2,3})(\d{2})(\d{3})([NSEW])$").unwrap();
        }

        let parse = |raw: &str| {
            IGC_COORD_REGEX.captures(raw).and_then(|cap| {
                let (d, m, mmm, dir) = (&cap[1], &cap[2], &cap[3], &cap[4]);
                let (d, m, mmm) = (d.parse().ok()?, m.parse().ok()?, mmm.parse().ok()?);
                let mut dd = to_dd(d, m, mmm);
                if dir == "S" || dir == "W" {
                    dd = -dd;
                }
                Some(dd)
            })
        };

        match (parse(lat), parse(lon)) {
            (Some(lat), Some(lon)) => Some(LatLon(lat, lon)),
            _ => None,
        }
    }

    /// Great-circle distance in meters (haversine).
    ///
    /// Uses `atan2` for the angular distance so that nearly antipodal points
    /// don't lose precision the way `acos` would.
    pub fn distance(self, other: LatLon) -> f64 {
        let (lat1, lat2) = (self.0.to_radians(), other.0.to_radians());
        let dlat = (other.0 - self.0).to_radians();
        let dlon = (other.1 - self.1).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        // rounding can push `a` a hair above 1 for antipodes
        let a = a.min(1.0);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }

    /// Fallback label for a point that no named site covers.
    pub fn to_label(self) -> String {
        format!("{:.3},{:.3}", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coincident_points_are_zero_apart() {
        let p = LatLon::new(45.814, 6.246);
        assert_eq!(p.distance(p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = LatLon::new(45.814, 6.246);
        let b = LatLon::new(-33.9, 151.2);
        assert_eq!(a.distance(b), b.distance(a));
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = LatLon::new(0.0, 0.0).distance(LatLon::new(1.0, 0.0));
        assert!((d - 111_194.93).abs() < 0.1, "{}", d);
    }

    #[test]
    fn antipodal_points_are_half_the_circumference() {
        let d = LatLon::new(10.0, 20.0).distance(LatLon::new(-10.0, -160.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_M;
        assert!((d - half).abs() < 1.0, "{}", d);
    }

    #[test]
    fn parses_igc_coordinates() {
        let p = LatLon::from_igc("4548840N", "00614760E").unwrap();
        assert!((p.lat() - 45.814).abs() < 1e-9);
        assert!((p.lon() - 6.246).abs() < 1e-9);

        let p = LatLon::from_igc("3330000S", "07030000W").unwrap();
        assert!((p.lat() + 33.5).abs() < 1e-9);
        assert!((p.lon() + 70.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_malformed_igc_coordinates() {
        assert!(LatLon::from_igc("45488A0N", "00614760E").is_none());
        assert!(LatLon::from_igc("4548840N", "00614760").is_none());
    }

    #[test]
    fn label_has_three_decimals() {
        assert_eq!(LatLon::new(45.81449, -6.2).to_label(), "45.814,-6.200");
    }
}
