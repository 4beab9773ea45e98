//! Display units. Everything is computed in meters, km/h and m/s and only
//! converted on the way out.

use chrono::NaiveTime;

const METERS_TO_FEET: f64 = 3.28084;
const KMH_TO_MPH: f64 = 0.621371;
const KMH_TO_KNOTS: f64 = 0.539957;
const MS_TO_KMH: f64 = 3.6;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AltitudeUnit {
    Meters,
    Feet,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpeedUnit {
    Kmh,
    Mph,
    Knots,
    Ms,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClimbUnit {
    Ms,
    Fpm,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeFormat {
    H24,
    AmPm,
}

// Unknown names fall back to the metric option instead of failing.

impl From<&str> for AltitudeUnit {
    fn from(x: &str) -> Self {
        match x {
            "ft" => AltitudeUnit::Feet,
            _ => AltitudeUnit::Meters,
        }
    }
}

impl From<&str> for SpeedUnit {
    fn from(x: &str) -> Self {
        match x {
            "mph" => SpeedUnit::Mph,
            "kts" => SpeedUnit::Knots,
            "ms" => SpeedUnit::Ms,
            _ => SpeedUnit::Kmh,
        }
    }
}

impl From<&str> for ClimbUnit {
    fn from(x: &str) -> Self {
        match x {
            "fpm" => ClimbUnit::Fpm,
            _ => ClimbUnit::Ms,
        }
    }
}

impl From<&str> for TimeFormat {
    fn from(x: &str) -> Self {
        match x {
            "ampm" => TimeFormat::AmPm,
            _ => TimeFormat::H24,
        }
    }
}

impl From<AltitudeUnit> for &str {
    fn from(x: AltitudeUnit) -> &'static str {
        match x {
            AltitudeUnit::Meters => "m",
            AltitudeUnit::Feet => "ft",
        }
    }
}

impl From<SpeedUnit> for &str {
    fn from(x: SpeedUnit) -> &'static str {
        match x {
            SpeedUnit::Kmh => "km/h",
            SpeedUnit::Mph => "mph",
            SpeedUnit::Knots => "kts",
            SpeedUnit::Ms => "m/s",
        }
    }
}

impl From<ClimbUnit> for &str {
    fn from(x: ClimbUnit) -> &'static str {
        match x {
            ClimbUnit::Ms => "m/s",
            ClimbUnit::Fpm => "ft/min",
        }
    }
}

impl AltitudeUnit {
    pub const NAMES: &'static [&'static str] = &["m", "ft"];

    pub fn convert(self, meters: f64) -> f64 {
        match self {
            AltitudeUnit::Meters => meters,
            AltitudeUnit::Feet => meters * METERS_TO_FEET,
        }
    }
}

impl SpeedUnit {
    pub const NAMES: &'static [&'static str] = &["kmh", "mph", "kts", "ms"];

    pub fn convert(self, kmh: f64) -> f64 {
        match self {
            SpeedUnit::Kmh => kmh,
            SpeedUnit::Mph => kmh * KMH_TO_MPH,
            SpeedUnit::Knots => kmh * KMH_TO_KNOTS,
            SpeedUnit::Ms => kmh / MS_TO_KMH,
        }
    }
}

impl ClimbUnit {
    pub const NAMES: &'static [&'static str] = &["ms", "fpm"];

    pub fn convert(self, ms: f64) -> f64 {
        match self {
            ClimbUnit::Ms => ms,
            ClimbUnit::Fpm => ms * METERS_TO_FEET * 60.0,
        }
    }
}

impl TimeFormat {
    pub const NAMES: &'static [&'static str] = &["24h", "ampm"];

    pub fn format(self, t: NaiveTime) -> String {
        match self {
            TimeFormat::H24 => t.format("%H:%M:%S").to_string(),
            TimeFormat::AmPm => t.format("%-I:%M:%S %p").to_string(),
        }
    }
}

/// The unit system a batch of flights is reported in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Units {
    pub altitude: AltitudeUnit,
    pub speed: SpeedUnit,
    pub climb: ClimbUnit,
}

impl Default for Units {
    fn default() -> Self {
        Units {
            altitude: AltitudeUnit::Meters,
            speed: SpeedUnit::Kmh,
            climb: ClimbUnit::Ms,
        }
    }
}

impl Units {
    pub fn new(altitude: &str, speed: &str, climb: &str) -> Self {
        Units {
            altitude: altitude.into(),
            speed: speed.into(),
            climb: climb.into(),
        }
    }

    pub fn altitude_symbol(self) -> &'static str {
        self.altitude.into()
    }

    pub fn speed_symbol(self) -> &'static str {
        self.speed.into()
    }

    pub fn climb_symbol(self) -> &'static str {
        self.climb.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_metric() {
        assert_eq!(AltitudeUnit::from("yards"), AltitudeUnit::Meters);
        assert_eq!(SpeedUnit::from(""), SpeedUnit::Kmh);
        assert_eq!(ClimbUnit::from("m/s"), ClimbUnit::Ms);
        assert_eq!(TimeFormat::from("12h"), TimeFormat::H24);
    }

    #[test]
    fn every_listed_name_round_trips_to_its_own_variant() {
        let alts: Vec<AltitudeUnit> = AltitudeUnit::NAMES.iter().map(|&n| n.into()).collect();
        assert_eq!(alts, vec![AltitudeUnit::Meters, AltitudeUnit::Feet]);
        let speeds: Vec<SpeedUnit> = SpeedUnit::NAMES.iter().map(|&n| n.into()).collect();
        assert_eq!(speeds, vec![SpeedUnit::Kmh, SpeedUnit::Mph, SpeedUnit::Knots, SpeedUnit::Ms]);
    }

    #[test]
    fn conversions() {
        assert!((AltitudeUnit::Feet.convert(1000.0) - 3280.84).abs() < 1e-9);
        assert!((SpeedUnit::Mph.convert(100.0) - 62.1371).abs() < 1e-9);
        assert!((SpeedUnit::Knots.convert(100.0) - 53.9957).abs() < 1e-9);
        assert!((SpeedUnit::Ms.convert(36.0) - 10.0).abs() < 1e-9);
        assert!((ClimbUnit::Fpm.convert(1.0) - 196.8504).abs() < 1e-9);
    }

    #[test]
    fn symbols() {
        let units = Units::new("ft", "kts", "fpm");
        assert_eq!(units.altitude_symbol(), "ft");
        assert_eq!(units.speed_symbol(), "kts");
        assert_eq!(units.climb_symbol(), "ft/min");
        assert_eq!(Units::default().speed_symbol(), "km/h");
    }

    #[test]
    fn time_formats() {
        let t = NaiveTime::from_hms_opt(14, 5, 9).unwrap();
        assert_eq!(TimeFormat::H24.format(t), "14:05:09");
        assert_eq!(TimeFormat::AmPm.format(t), "2:05:09 PM");
    }
}
