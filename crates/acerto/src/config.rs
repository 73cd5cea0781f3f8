//! Configuration management for acerto.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::money::{Locale, Money, Percent};
use crate::pix::PixPayload;
use crate::receipt::{ReceiptStyle, MAX_WIDTH, MIN_WIDTH};
use crate::routing::GeoPoint;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "acerto";

/// Default document database file name.
const DATABASE_FILE_NAME: &str = "documents.db";

/// Default local store file name.
const LOCAL_FILE_NAME: &str = "local.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ACERTO_`, sections split on `__`)
/// 2. TOML config file at `~/.config/acerto/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Document database configuration.
    pub database: DatabaseConfig,
    /// Local store configuration.
    pub local: LocalConfig,
    /// Business details and defaults.
    pub business: BusinessConfig,
    /// PIX receiver details.
    pub pix: PixConfig,
    /// Receipt layout.
    pub receipt: ReceiptConfig,
    /// Route planning.
    pub route: RouteConfig,
    /// Connectivity.
    pub sync: SyncConfig,
}

/// Document database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/acerto/documents.db`
    pub path: Option<PathBuf>,
    /// Account scope for document paths.
    pub account: String,
}

/// Local store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Path to the local store file.
    /// Defaults to `~/.local/share/acerto/local.db`
    pub path: Option<PathBuf>,
}

/// Business details and form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// Printed on receipts.
    pub company_name: String,
    /// Printed on receipts.
    pub phone: Option<String>,
    /// Number and date formatting.
    pub locale: Locale,
    /// Establishment's share for new equipment, e.g. `"40"` or `"37,5%"`.
    pub default_customer_percent: String,
    /// Ficha price for new equipment, e.g. `"R$ 2,00"`.
    pub default_price_per_play: String,
}

/// PIX receiver details. Leave `key` unset to omit payment codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixConfig {
    /// PIX key.
    pub key: Option<String>,
    /// Receiver name; defaults to the company name.
    pub merchant_name: Option<String>,
    /// Receiver city.
    pub merchant_city: String,
}

/// Receipt layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Paper width in characters.
    pub width: usize,
    /// Printed at the bottom.
    pub footer: Option<String>,
}

/// Route planning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Latitude of the depot routes start from.
    pub depot_latitude: Option<f64>,
    /// Longitude of the depot routes start from.
    pub depot_longitude: Option<f64>,
}

/// Connectivity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Start without a connection; writes are queued.
    pub offline: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None, // Will be resolved to default at runtime
            account: "default".to_string(),
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            phone: None,
            locale: Locale::PtBr,
            default_customer_percent: "40".to_string(),
            default_price_per_play: "2,00".to_string(),
        }
    }
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            width: 32,
            footer: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("ACERTO_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.database.account.trim().is_empty() || self.database.account.contains('/') {
            return Err(invalid("database.account must be non-empty and contain no '/'"));
        }

        if !(MIN_WIDTH..=MAX_WIDTH).contains(&self.receipt.width) {
            return Err(invalid(format!(
                "receipt.width ({}) must be between {MIN_WIDTH} and {MAX_WIDTH}",
                self.receipt.width
            )));
        }

        self.default_customer_percent()
            .map_err(|e| invalid(format!("business.default_customer_percent: {e}")))?;
        let price = self
            .default_price_per_play()
            .map_err(|e| invalid(format!("business.default_price_per_play: {e}")))?;
        if price.is_negative() {
            return Err(invalid("business.default_price_per_play must not be negative"));
        }

        match (self.route.depot_latitude, self.route.depot_longitude) {
            (None, None) => {}
            (Some(lat), Some(lon)) => {
                if !GeoPoint::new(lat, lon).is_valid() {
                    return Err(invalid(format!("route depot ({lat}, {lon}) is out of range")));
                }
            }
            _ => {
                return Err(invalid(
                    "route.depot_latitude and route.depot_longitude must be set together",
                ));
            }
        }

        if let Some(template) = self.pix_template() {
            template
                .encode()
                .map_err(|e| invalid(format!("pix: {e}")))?;
        }

        Ok(())
    }

    /// Get the document database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the local store path, resolving defaults if not set.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.local
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(LOCAL_FILE_NAME))
    }

    /// Default establishment share for new equipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value does not parse.
    pub fn default_customer_percent(&self) -> Result<Percent> {
        Percent::parse(&self.business.default_customer_percent, self.business.locale)
    }

    /// Default ficha price for new equipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured value does not parse.
    pub fn default_price_per_play(&self) -> Result<Money> {
        Money::parse(&self.business.default_price_per_play, self.business.locale)
    }

    /// Depot coordinates, if configured.
    #[must_use]
    pub fn depot(&self) -> Option<GeoPoint> {
        Some(GeoPoint::new(self.route.depot_latitude?, self.route.depot_longitude?))
    }

    /// PIX receiver without an amount, if a key is configured.
    #[must_use]
    pub fn pix_template(&self) -> Option<PixPayload> {
        let key = self.pix.key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        let name = self
            .pix
            .merchant_name
            .clone()
            .unwrap_or_else(|| self.business.company_name.clone());
        Some(PixPayload::new(key, name, self.pix.merchant_city.clone()))
    }

    /// Receipt style built from the business and receipt sections.
    #[must_use]
    pub fn receipt_style(&self) -> ReceiptStyle {
        ReceiptStyle {
            width: self.receipt.width,
            company_name: self.business.company_name.clone(),
            phone: self.business.phone.clone(),
            footer: self.receipt.footer.clone(),
            locale: self.business.locale,
            pix: self.pix_template(),
        }
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.account, "default");
        assert!(config.database.path.is_none());
        assert_eq!(config.business.locale, Locale::PtBr);
        assert_eq!(config.receipt.width, 32);
        assert!(!config.sync.offline);
        assert!(config.pix_template().is_none());
        assert!(config.depot().is_none());
    }

    #[test]
    fn test_default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_customer_percent().unwrap(), Percent::whole(40));
        assert_eq!(config.default_price_per_play().unwrap(), Money::from_units(2));
    }

    #[test]
    fn test_validate_receipt_width() {
        let mut config = Config::default();
        config.receipt.width = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("receipt.width"));

        config.receipt.width = MAX_WIDTH;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_percent_and_price() {
        let mut config = Config::default();
        config.business.default_customer_percent = "120".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.business.default_price_per_play = "dois reais".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.business.default_price_per_play = "-1".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_depot() {
        let mut config = Config::default();
        config.route.depot_latitude = Some(-22.9);
        assert!(config.validate().is_err());

        config.route.depot_longitude = Some(-47.06);
        assert!(config.validate().is_ok());
        assert_eq!(config.depot(), Some(GeoPoint::new(-22.9, -47.06)));

        config.route.depot_latitude = Some(120.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_account() {
        let mut config = Config::default();
        config.database.account = "a/b".to_string();
        assert!(config.validate().is_err());
        config.database.account = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pix_template() {
        let mut config = Config::default();
        config.business.company_name = "Diversões Acerto".to_string();
        config.pix.key = Some("11987654321".to_string());
        config.pix.merchant_city = String::new();
        assert!(config.validate().is_err());

        config.pix.merchant_city = "Campinas".to_string();
        assert!(config.validate().is_ok());
        let template = config.pix_template().unwrap();
        assert_eq!(template.merchant_name, "Diversões Acerto");
        assert!(config.receipt_style().pix.is_some());
    }

    #[test]
    fn test_paths_resolve_defaults() {
        let config = Config::default();
        assert!(config.database_path().ends_with("acerto/documents.db"));
        assert!(config.local_path().ends_with("acerto/local.db"));

        let mut config = Config::default();
        config.database.path = Some(PathBuf::from("/tmp/docs.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/docs.db"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("acerto-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[default.business]
company_name = "Sinucas Silva"
locale = "en-US"
default_price_per_play = "1.50"

[default.receipt]
width = 40
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert_eq!(config.business.company_name, "Sinucas Silva");
        assert_eq!(config.business.locale, Locale::EnUs);
        assert_eq!(config.default_price_per_play().unwrap(), Money::from_cents(150));
        assert_eq!(config.receipt.width, 40);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = PathBuf::from("/nonexistent/acerto/config.toml");
        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.receipt.width, 32);
    }

    #[test]
    fn test_receipt_style() {
        let mut config = Config::default();
        config.business.company_name = "Acerto".to_string();
        config.receipt.footer = Some("Volte sempre".to_string());
        let style = config.receipt_style();
        assert_eq!(style.width, 32);
        assert_eq!(style.company_name, "Acerto");
        assert_eq!(style.footer.as_deref(), Some("Volte sempre"));
    }
}
