use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bom: BomConfig,
    pub logging: LoggingConfig,
}

/// Table naming and column conventions for BOM sources.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BomConfig {
    /// File stem (or nothing, for workbooks) of the master parts list.
    #[validate(length(min = 1, message = "Parts file name must not be empty"))]
    pub parts_file_name: String,
    #[validate(length(min = 1, message = "At least one identifier column is required"))]
    pub identifier_columns: Vec<String>,
    #[validate(length(min = 1, message = "At least one quantity column is required"))]
    pub quantity_columns: Vec<String>,
    pub package_quantity_column: String,
    pub package_price_column: String,
    pub unit_cost_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Layered load: defaults, `config/{default,ENVIRONMENT,local}`, an explicit
    /// file when given, then `BOMTREE__*` environment variables.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: AppConfig = builder
            .add_source(Environment::with_prefix("BOMTREE").separator("__"))
            .build()?
            .try_deserialize()?;

        config
            .bom
            .validate()
            .map_err(|e| ConfigError::Message(crate::validation::format_validation_errors(&e)))?;
        Ok(config)
    }
}

impl Default for BomConfig {
    fn default() -> Self {
        Self {
            parts_file_name: "Parts list".to_string(),
            identifier_columns: vec![
                "pn".to_string(),
                "part_number".to_string(),
                "part_no".to_string(),
                "item_number".to_string(),
                "sku".to_string(),
            ],
            quantity_columns: vec!["qty".to_string(), "quantity".to_string()],
            package_quantity_column: "pkg qty".to_string(),
            package_price_column: "pkg price".to_string(),
            unit_cost_column: "cost".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
            file_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.bom.parts_file_name, "Parts list");
        assert_eq!(config.bom.quantity_columns, vec!["qty", "quantity"]);
        assert!(config.bom.validate().is_ok());
    }

    #[test]
    fn test_empty_parts_file_name_is_rejected() {
        let config = BomConfig {
            parts_file_name: String::new(),
            ..BomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[bom]\nparts_file_name = \"Catalog\"\n[logging]\nlevel = \"debug\"").unwrap();

        let config = AppConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.bom.parts_file_name, "Catalog");
        assert_eq!(config.logging.level, "debug");
        // untouched keys keep their defaults
        assert_eq!(config.bom.package_quantity_column, "pkg qty");
    }
}
