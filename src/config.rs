use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "xray-intake";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

const ENV_API_URL: &str = "XRAY_INTAKE_API_URL";
const ENV_TIMEOUT_SECS: &str = "XRAY_INTAKE_TIMEOUT_SECS";
const ENV_MOCK_ENABLED: &str = "XRAY_INTAKE_MOCK_ENABLED";
const ENV_FAILURE_THRESHOLD: &str = "XRAY_INTAKE_FAILURE_THRESHOLD";
const ENV_SIMULATION_FLAG: &str = "XRAY_INTAKE_SIMULATION_FLAG";
const ENV_CLOUDINARY_CLOUD: &str = "CLOUDINARY_CLOUD_NAME";
const ENV_CLOUDINARY_PRESET: &str = "CLOUDINARY_UPLOAD_PRESET";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?} ({expected})")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "xray_intake=info,warn"
}

/// Local state directory (`~/.xray-intake`). Falls back to the working
/// directory when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".xray-intake")
}

/// Default location of the persisted simulation flag.
pub fn simulation_flag_path() -> PathBuf {
    app_data_dir().join("simulation_mode")
}

/// Unsigned-upload credentials for the image store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

/// Runtime configuration for the intake pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Answer every request with a simulated verdict.
    pub mock_enabled: bool,
    pub failure_threshold: u32,
    pub simulation_flag_path: PathBuf,
    /// Image upload is disabled when unset.
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            mock_enabled: false,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            simulation_flag_path: simulation_flag_path(),
            cloudinary: None,
        }
    }
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let timeout_secs = match get(ENV_TIMEOUT_SECS) {
            Some(v) => parse_positive(ENV_TIMEOUT_SECS, &v)?,
            None => defaults.timeout_secs,
        };
        let failure_threshold = match get(ENV_FAILURE_THRESHOLD) {
            Some(v) => parse_positive(ENV_FAILURE_THRESHOLD, &v)? as u32,
            None => defaults.failure_threshold,
        };
        let mock_enabled = match get(ENV_MOCK_ENABLED) {
            Some(v) => parse_bool(ENV_MOCK_ENABLED, &v)?,
            None => defaults.mock_enabled,
        };

        let cloudinary = match (get(ENV_CLOUDINARY_CLOUD), get(ENV_CLOUDINARY_PRESET)) {
            (Some(cloud_name), Some(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
            }),
            _ => None,
        };

        Ok(Self {
            api_url: get(ENV_API_URL).unwrap_or(defaults.api_url),
            timeout_secs,
            mock_enabled,
            failure_threshold,
            simulation_flag_path: get(ENV_SIMULATION_FLAG)
                .map(PathBuf::from)
                .unwrap_or(defaults.simulation_flag_path),
            cloudinary,
        })
    }
}

fn parse_positive(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0 && *n <= u64::from(u32::MAX))
        .ok_or_else(|| ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            expected: "a positive integer",
        })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            expected: "true or false",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_is_hidden_folder() {
        assert!(app_data_dir().ends_with(".xray-intake"));
        assert!(simulation_flag_path().starts_with(app_data_dir()));
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = IntakeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, IntakeConfig::default());
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.failure_threshold, 2);
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = IntakeConfig::from_lookup(lookup(&[
            ("XRAY_INTAKE_API_URL", "http://inference:9000"),
            ("XRAY_INTAKE_TIMEOUT_SECS", "15"),
            ("XRAY_INTAKE_MOCK_ENABLED", "TRUE"),
            ("XRAY_INTAKE_FAILURE_THRESHOLD", "5"),
            ("XRAY_INTAKE_SIMULATION_FLAG", "/var/lib/xray/sim"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
            ("CLOUDINARY_UPLOAD_PRESET", "unsigned"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://inference:9000");
        assert_eq!(config.timeout_secs, 15);
        assert!(config.mock_enabled);
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.simulation_flag_path, PathBuf::from("/var/lib/xray/sim"));
        assert_eq!(
            config.cloudinary,
            Some(CloudinaryConfig {
                cloud_name: "demo".into(),
                upload_preset: "unsigned".into()
            })
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            IntakeConfig::from_lookup(lookup(&[("XRAY_INTAKE_API_URL", "  "), ("XRAY_INTAKE_TIMEOUT_SECS", "")]))
                .unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn cloudinary_needs_both_values() {
        let config =
            IntakeConfig::from_lookup(lookup(&[("CLOUDINARY_CLOUD_NAME", "demo")])).unwrap();
        assert!(config.cloudinary.is_none());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = IntakeConfig::from_lookup(lookup(&[("XRAY_INTAKE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "XRAY_INTAKE_TIMEOUT_SECS",
                ..
            }
        ));

        assert!(IntakeConfig::from_lookup(lookup(&[("XRAY_INTAKE_FAILURE_THRESHOLD", "0")])).is_err());
        assert!(IntakeConfig::from_lookup(lookup(&[("XRAY_INTAKE_MOCK_ENABLED", "sometimes")])).is_err());
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().starts_with("xray_intake="));
    }
}
