use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Memory,
}

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub database_url: String,
}

#[derive(Deserialize, Debug)]
pub struct DisplaySettings {
    pub timezone: String,
}

impl DisplaySettings {
    pub fn timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
        self.timezone.parse().map_err(|error| {
            anyhow::anyhow!("Invalid display timezone {:?}: {error}", self.timezone)
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct NotificationSettings {
    pub title: String,
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub display: DisplaySettings,
    pub notification: NotificationSettings,
}

impl AppSettings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage.kind", "sqlite")?
            .set_default("storage.database_url", "sqlite://slacker.db")?
            .set_default("display.timezone", "UTC")?
            .set_default("notification.title", "Slacker")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_source() {
        let settings: AppSettings = AppSettings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.storage.kind, StorageKind::Sqlite);
        assert_eq!(settings.storage.database_url, "sqlite://slacker.db");
        assert_eq!(settings.display.timezone().unwrap(), chrono_tz::UTC);
        assert_eq!(settings.notification.title, "Slacker");
    }

    #[test]
    fn file_values_override_defaults() {
        let settings: AppSettings = AppSettings::builder()
            .unwrap()
            .add_source(File::from_str(
                "[storage]\nkind = \"memory\"\n[display]\ntimezone = \"Europe/Prague\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.storage.kind, StorageKind::Memory);
        assert_eq!(
            settings.display.timezone().unwrap(),
            chrono_tz::Europe::Prague
        );
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        let display = DisplaySettings {
            timezone: "Mars/Olympus_Mons".to_string(),
        };

        assert!(display.timezone().is_err());
    }
}
