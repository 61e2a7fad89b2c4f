use chrono_tz::Tz;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub debug: bool,
    pub auth_token: String,
    pub enable_swagger: bool,
    pub port: u16,
    /// Studio time zone, used to decide what "today" is.
    pub timezone: Tz,
    pub calendar_name: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            // APP_AUTH_TOKEN -> auth_token
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("debug", false)?
            .set_default("auth_token", "default-token-change-me")?
            .set_default("enable_swagger", true)?
            .set_default("port", 8080)?
            .set_default("timezone", "UTC")?
            .set_default("calendar_name", "Studio class schedule")?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const KEYS: [&str; 3] = ["APP_PORT", "APP_AUTH_TOKEN", "APP_TIMEZONE"];

    fn clear() {
        for key in KEYS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.timezone, Tz::UTC);
        assert!(settings.enable_swagger);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        clear();
        // SAFETY: tests touching the environment are serialized.
        unsafe {
            std::env::set_var("APP_PORT", "9090");
            std::env::set_var("APP_AUTH_TOKEN", "s3cret");
            std::env::set_var("APP_TIMEZONE", "Europe/Warsaw");
        }
        let settings = Settings::from_env().unwrap();
        clear();

        assert_eq!(settings.port, 9090);
        assert_eq!(settings.auth_token, "s3cret");
        assert_eq!(settings.timezone, chrono_tz::Europe::Warsaw);
    }
}
