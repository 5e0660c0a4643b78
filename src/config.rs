// config.rs

use crate::quantize::Timing;
use crate::score::{ScoreHeader, TimeSignature};
use config::{Config, Environment, File};
use log::{debug, info};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "scorescribe";
pub const ENV_PREFIX: &str = "SCORESCRIBE";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub beats: u32,
    pub beat_type: u32,
    /// Milliseconds per timing tick before normalization to duration units.
    pub precision_millis: u64,
    pub max_tie_chain: usize,
    /// Shortest silence, in duration units, written as a rest.
    pub min_rest_units: u64,
    pub title: String,
    pub log_level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
            precision_millis: 100,
            max_tie_chain: 256,
            min_rest_units: 1,
            title: "Live Notes".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl Settings {
    /// Layers built-in defaults, an optional settings file and
    /// `SCORESCRIBE_*` environment variables.
    ///
    /// An explicit `path` must exist; without one, `scorescribe.toml` in the
    /// working directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("beats", i64::from(defaults.beats))?
            .set_default("beat_type", i64::from(defaults.beat_type))?
            .set_default("precision_millis", defaults.precision_millis as i64)?
            .set_default("max_tie_chain", defaults.max_tie_chain as i64)?
            .set_default("min_rest_units", defaults.min_rest_units as i64)?
            .set_default("title", defaults.title.as_str())?
            .set_default("log_level", defaults.log_level.as_str())?;

        builder = match path {
            Some(path) => {
                info!("Loading settings from {}", path.display());
                builder.add_source(File::from(path).required(true))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        debug!("Loaded settings: {:?}", settings);

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !matches!(self.beat_type, 1 | 2 | 4 | 8) {
            return Err(SettingsError::Invalid {
                key: "beat_type",
                reason: format!("{} is not one of 1, 2, 4, 8", self.beat_type),
            });
        }
        if self.beats == 0 {
            return Err(SettingsError::Invalid {
                key: "beats",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.precision_millis == 0 {
            return Err(SettingsError::Invalid {
                key: "precision_millis",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_tie_chain == 0 {
            return Err(SettingsError::Invalid {
                key: "max_tie_chain",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn timing(&self) -> Timing {
        Timing::new(self.precision_millis, self.beat_type)
    }

    pub fn time_signature(&self) -> TimeSignature {
        TimeSignature::new(self.beats, self.beat_type)
    }

    /// Header for a document started now.
    pub fn score_header(&self) -> ScoreHeader {
        ScoreHeader {
            title: self.title.clone(),
            encoding_date: chrono::Local::now().date_naive(),
            time_signature: self.time_signature(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_odd_beat_type() {
        let settings = Settings {
            beat_type: 3,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid {
                key: "beat_type",
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "beats = 3\ntitle = \"Waltz\"\nprecision_millis = 50").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.beats, 3);
        assert_eq!(settings.beat_type, 4);
        assert_eq!(settings.precision_millis, 50);
        assert_eq!(settings.title, "Waltz");
        assert_eq!(settings.time_signature().measure_divisions(), 48);
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(file, "beat_type = 5").unwrap();
        assert!(Settings::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = Path::new("/nonexistent/scorescribe-settings.toml");
        assert!(matches!(
            Settings::load(Some(path)),
            Err(SettingsError::Load(_))
        ));
    }
}
