use crate::error::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "igc-logbook.toml";
const ENV_PREFIX: &str = "IGC_";

pub const DEFAULT_LOGBOOK_FORMAT: &str = "{{.Date}} {{.TakeoffSite}} {{.TakeoffAlt}}{{.AltitudeUnit}} {{.AltitudeDiff}}{{.AltitudeUnit}} {{.FlightDuration}} {{.MaxAltitude}}{{.AltitudeUnit}} {{.MaxGroundSpeed}}{{.SpeedUnit}} +{{.MaxClimbRate}}{{.VerticalSpeedUnit}} -{{.MaxDescentRate}}{{.VerticalSpeedUnit}}\n";
pub const DEFAULT_SUMMARY_FORMAT: &str = "# {{.TotalFlights}} flights {{.FirstDate}}..{{.LastDate}} total {{.TotalTime}} avg {{.AvgFlightTime}} max alt {{.MaxAltitude}}{{.AltitudeUnit}}\n";

/// Settings shared by every command. Command line flags override these.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub altitude_unit: String,
    pub speed_unit: String,
    pub climb_unit: String,
    pub time_format: String,
    pub logbook_format: String,
    pub summary_format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites_database_location: Option<PathBuf>,
    pub speed_window: f64,

    /// File the settings came from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            altitude_unit: "m".to_owned(),
            speed_unit: "kmh".to_owned(),
            climb_unit: "ms".to_owned(),
            time_format: "24h".to_owned(),
            logbook_format: DEFAULT_LOGBOOK_FORMAT.to_owned(),
            summary_format: DEFAULT_SUMMARY_FORMAT.to_owned(),
            sites_database_location: None,
            speed_window: 5.0,
            source: None,
        }
    }
}

impl Config {
    /// Defaults, then the first config file found (or `explicit`), then
    /// `IGC_*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Config {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Config::search_paths().into_iter().find(|p| p.is_file()),
        };

        let mut config = match path {
            Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
                warn!("Could not read {}: {}, using defaults", path.display(), e);
                Config::default()
            }),
            None => {
                debug!("No {} found, using defaults", CONFIG_FILE);
                Config::default()
            }
        };

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&text)?;
        config.source = Some(path.to_path_buf());
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut dirs = vec![PathBuf::from(".")];
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            dirs.push(home.join(".config").join("igc-logbook"));
            dirs.push(home);
        }
        dirs.push(PathBuf::from("/etc/igc-logbook"));
        dirs.into_iter().map(|d| d.join(CONFIG_FILE)).collect()
    }

    /// `IGC_SPEED_UNIT` overrides `speed-unit` and so on.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        let var = |key: &str| lookup(&format!("{}{}", ENV_PREFIX, key.to_uppercase().replace('-', "_")));

        if let Some(v) = var("altitude-unit") {
            self.altitude_unit = v;
        }
        if let Some(v) = var("speed-unit") {
            self.speed_unit = v;
        }
        if let Some(v) = var("climb-unit") {
            self.climb_unit = v;
        }
        if let Some(v) = var("time-format") {
            self.time_format = v;
        }
        if let Some(v) = var("logbook-format") {
            self.logbook_format = v;
        }
        if let Some(v) = var("summary-format") {
            self.summary_format = v;
        }
        if let Some(v) = var("sites-database-location") {
            self.sites_database_location = Some(PathBuf::from(v)).filter(|p| !p.as_os_str().is_empty());
        }
        if let Some(v) = var("speed-window") {
            match v.parse() {
                Ok(window) => self.speed_window = window,
                Err(_) => warn!("Ignoring {}SPEED_WINDOW={:?}, not a number", ENV_PREFIX, v),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn reads_partial_file_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "altitude-unit = \"ft\"\nspeed-window = 3.0\nsites-database-location = \"sites.csv\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.altitude_unit, "ft");
        assert_eq!(config.speed_window, 3.0);
        assert_eq!(config.sites_database_location, Some(PathBuf::from("sites.csv")));
        assert_eq!(config.speed_unit, "kmh");
        assert_eq!(config.logbook_format, DEFAULT_LOGBOOK_FORMAT);
        assert_eq!(config.source, Some(path));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "speed-window = \"fast\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
        let config = Config::load(Some(path.as_path()));
        assert_eq!(config.source, None);
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("IGC_SPEED_UNIT", "kts"),
            ("IGC_SPEED_WINDOW", "8"),
            ("IGC_CLIMB_UNIT", "fpm"),
        ]
        .iter()
        .cloned()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.speed_unit, "kts");
        assert_eq!(config.climb_unit, "fpm");
        assert_eq!(config.speed_window, 8.0);
        assert_eq!(config.altitude_unit, "m");
    }

    #[test]
    fn bad_environment_number_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|key| if key == "IGC_SPEED_WINDOW" { Some("soon".to_owned()) } else { None });
        assert_eq!(config.speed_window, 5.0);
    }

    #[test]
    fn serializes_back_to_toml() {
        let text = toml::to_string(&Config::default()).unwrap();
        assert!(text.contains("speed-unit = \"kmh\""));
        assert!(!text.contains("sites-database-location"));
    }
}
