use chrono::{Duration, NaiveDate, NaiveDateTime};
use itertools::Itertools;

use crate::geo::LatLon;

/// Fix pairs closer together than this are GPS jitter, not movement.
const MIN_TIME_DIFF_S: f64 = 1.0;
const MS_TO_KMH: f64 = 3.6;
/// Number of fixes that must precede a fix before speed smoothing kicks in.
const SMOOTHING_MIN_FIXES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fix {
    pub latlon: LatLon,
    pub pressure_alt: i32,
    pub gps_alt: i32,
    pub time: NaiveDateTime,
}

impl Fix {
    pub fn new(latlon: LatLon, pressure_alt: i32, gps_alt: i32, time: NaiveDateTime) -> Self {
        Fix {
            latlon,
            pressure_alt,
            gps_alt,
            time,
        }
    }

    fn seconds_to(&self, later: &Fix) -> f64 {
        (later.time - self.time).num_milliseconds() as f64 / 1000.0
    }

    /// Ground speed in km/h between two fixes.
    fn speed_to(&self, later: &Fix) -> f64 {
        self.latlon.distance(later.latlon) / self.seconds_to(later) * MS_TO_KMH
    }
}

/// A recorded flight: header metadata plus the ordered track.
#[derive(Clone, Debug, Default, Builder)]
#[builder(default, setter(into))]
pub struct Flight {
    pub date: Option<NaiveDate>,
    pub pilot: String,
    pub crew: String,
    pub glider_type: String,
    pub glider_id: String,
    pub competition_id: String,
    pub gps_datum: String,
    pub firmware_version: String,
    pub hardware_version: String,
    pub recorder_type: String,
    pub gps_receiver: String,
    pub time_zone: String,
    pub pressure_sensor: String,
    pub alt_gps_ref: String,
    pub alt_pressure_ref: String,
    pub fixes: Vec<Fix>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Statistics {
    pub max_altitude: i32,
    pub min_altitude: i32,
    /// km/h
    pub max_ground_speed: f64,
    /// m/s
    pub max_climb_rate: f64,
    /// m/s, positive magnitude
    pub max_descent_rate: f64,
    pub duration: Duration,
}

impl Flight {
    pub fn takeoff(&self) -> Option<&Fix> {
        self.fixes.first()
    }

    pub fn landing(&self) -> Option<&Fix> {
        self.fixes.last()
    }

    /// Derive the summary statistics of the track.
    ///
    /// `speed_window` is the smoothing window in seconds applied to ground
    /// speed. Empty and single-fix tracks produce zeroed values.
    pub fn statistics(&self, speed_window: f64) -> Statistics {
        let (max_climb, min_vertical) = self.vertical_speeds();

        Statistics {
            max_altitude: self.max_altitude(),
            min_altitude: self.min_altitude(),
            max_ground_speed: self.max_ground_speed(speed_window),
            max_climb_rate: max_climb,
            max_descent_rate: min_vertical.abs(),
            duration: self.duration(),
        }
    }

    fn duration(&self) -> Duration {
        match (self.takeoff(), self.landing()) {
            (Some(first), Some(last)) if self.fixes.len() >= 2 => last.time - first.time,
            _ => Duration::zero(),
        }
    }

    // 0 is a sentinel for an empty track, not an altitude
    fn max_altitude(&self) -> i32 {
        self.fixes.iter().map(|f| f.gps_alt).max().unwrap_or(0)
    }

    fn min_altitude(&self) -> i32 {
        self.fixes.iter().map(|f| f.gps_alt).min().unwrap_or(0)
    }

    fn max_ground_speed(&self, window: f64) -> f64 {
        let mut max_speed = 0.0_f64;

        for (i, (prev, curr)) in self.fixes.iter().tuple_windows().enumerate() {
            let i = i + 1;
            let dt = prev.seconds_to(curr);
            if dt < MIN_TIME_DIFF_S {
                continue;
            }

            let mut speed = prev.speed_to(curr);

            // Short intervals amplify position noise, so measure over the
            // window instead. Only ever lowers the reading.
            if dt < window && i >= SMOOTHING_MIN_FIXES {
                let wide = self.fixes[..i]
                    .iter()
                    .rev()
                    .find(|f| f.seconds_to(curr) >= window)
                    .map(|f| f.speed_to(curr));
                if let Some(wide) = wide {
                    speed = speed.min(wide);
                }
            }

            max_speed = max_speed.max(speed);
        }
        max_speed
    }

    /// (max climb, min vertical speed) in m/s; the second value is <= 0.
    fn vertical_speeds(&self) -> (f64, f64) {
        self.fixes
            .iter()
            .tuple_windows()
            .filter_map(|(prev, curr)| {
                let dt = prev.seconds_to(curr);
                if dt < MIN_TIME_DIFF_S {
                    None
                } else {
                    Some(f64::from(curr.gps_alt - prev.gps_alt) / dt)
                }
            })
            .fold((0.0_f64, 0.0_f64), |(climb, sink), vs| (climb.max(vs), sink.min(vs)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Degrees of latitude covering roughly ten meters.
    const TEN_METERS: f64 = 10.0 / 111_194.93;

    pub(crate) fn at(seconds: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 18)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + Duration::seconds(seconds)
    }

    pub(crate) fn fix(lat: f64, lon: f64, alt: i32, seconds: i64) -> Fix {
        Fix::new(LatLon::new(lat, lon), alt, alt, at(seconds))
    }

    fn flight(fixes: Vec<Fix>) -> Flight {
        FlightBuilder::default().fixes(fixes).build().unwrap()
    }

    #[test]
    fn empty_flight_is_all_zero() {
        let stats = flight(Vec::new()).statistics(5.0);
        assert_eq!(stats.max_altitude, 0);
        assert_eq!(stats.min_altitude, 0);
        assert_eq!(stats.max_ground_speed, 0.0);
        assert_eq!(stats.max_climb_rate, 0.0);
        assert_eq!(stats.max_descent_rate, 0.0);
        assert_eq!(stats.duration, Duration::zero());
    }

    #[test]
    fn single_fix_has_altitude_but_no_speed() {
        let stats = flight(vec![fix(45.8, 6.2, 1500, 0)]).statistics(5.0);
        assert_eq!(stats.max_altitude, 1500);
        assert_eq!(stats.min_altitude, 1500);
        assert_eq!(stats.max_ground_speed, 0.0);
        assert_eq!(stats.max_climb_rate, 0.0);
        assert_eq!(stats.max_descent_rate, 0.0);
        assert_eq!(stats.duration, Duration::zero());
    }

    #[test]
    fn climb_and_descent_rates() {
        let f = flight(vec![
            fix(45.8, 6.2, 1000, 0),
            fix(45.8, 6.2, 1100, 10),
            fix(45.8, 6.2, 1050, 20),
        ]);
        let stats = f.statistics(5.0);
        assert!((stats.max_climb_rate - 10.0).abs() < 1e-9);
        assert!((stats.max_descent_rate - 5.0).abs() < 1e-9);
        assert_eq!(stats.max_altitude, 1100);
        assert_eq!(stats.min_altitude, 1000);
        assert_eq!(stats.duration, Duration::seconds(20));
    }

    #[test]
    fn sub_second_pairs_are_ignored() {
        let a = fix(45.8, 6.2, 1000, 0);
        let mut b = fix(45.9, 6.2, 1300, 0);
        b.time = at(0) + Duration::milliseconds(500);
        let stats = flight(vec![a, b]).statistics(5.0);
        assert_eq!(stats.max_ground_speed, 0.0);
        assert_eq!(stats.max_climb_rate, 0.0);
    }

    #[test]
    fn ground_speed_in_kmh() {
        // 10 m/s == 36 km/h
        let f = flight(vec![fix(0.0, 0.0, 100, 0), fix(TEN_METERS * 10.0, 0.0, 100, 10)]);
        let speed = f.statistics(0.0).max_ground_speed;
        assert!((speed - 36.0).abs() < 0.01, "{}", speed);
    }

    fn glitchy_track() -> Flight {
        // steady 10 m/s with a one-sample position spike at index 6
        let mut fixes: Vec<Fix> = (0..10)
            .map(|i| fix(TEN_METERS * i as f64, 0.0, 100, i))
            .collect();
        fixes[6].latlon = LatLon::new(TEN_METERS * 16.0, 0.0);
        flight(fixes)
    }

    #[test]
    fn smoothing_window_suppresses_spikes() {
        let track = glitchy_track();
        let raw = track.statistics(0.0).max_ground_speed;
        let smoothed = track.statistics(5.0).max_ground_speed;

        // 110 m in one second going into the spike
        assert!((raw - 396.0).abs() < 0.1, "{}", raw);
        // spike re-measured from fix 1, five seconds back: 150 m / 5 s
        assert!((smoothed - 108.0).abs() < 0.01, "{}", smoothed);
    }

    /// Fixes along a meridian at (meters north, seconds) positions.
    fn track(points: &[(f64, i64)]) -> Flight {
        flight(points.iter().map(|&(m, t)| fix(TEN_METERS * m / 10.0, 0.0, 100, t)).collect())
    }

    #[test]
    fn smoothing_uses_nearest_fix_a_full_window_back() {
        // 3 s sampling, so nothing sits exactly 5 s before the last fix.
        // From fix 2 (7 s back): 140 m / 7 s = 72 km/h. Fix 3 is only 4 s
        // back; fixes 1 and 0 are further away and would read slower.
        let f = track(&[(0.0, 0), (30.0, 3), (60.0, 6), (90.0, 9), (120.0, 12), (200.0, 13)]);
        let speed = f.statistics(5.0).max_ground_speed;
        assert!((speed - 72.0).abs() < 0.01, "{}", speed);
        assert!((f.statistics(0.0).max_ground_speed - 288.0).abs() < 0.01);
    }

    #[test]
    fn widening_the_window_never_raises_speed() {
        let track = glitchy_track();
        let raw = track.statistics(0.0).max_ground_speed;
        for window in &[1.0, 2.0, 3.0, 5.0, 8.0, 30.0] {
            assert!(track.statistics(*window).max_ground_speed <= raw + 1e-9);
        }
    }

    #[test]
    fn smoothing_needs_five_prior_fixes() {
        // spike at index 2 is too early in the track to be smoothed
        let mut fixes: Vec<Fix> = (0..4)
            .map(|i| fix(TEN_METERS * i as f64, 0.0, 100, i))
            .collect();
        fixes[2].latlon = LatLon::new(TEN_METERS * 12.0, 0.0);
        let track = flight(fixes);
        let raw = track.statistics(0.0).max_ground_speed;
        assert_eq!(track.statistics(5.0).max_ground_speed, raw);
    }
}
