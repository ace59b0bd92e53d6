use crate::domain::model::{FreightClass, LocationType};
use crate::domain::ports::QuoteSettings;
use crate::utils::error::{QuoteError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_TIMEOUT_SECONDS: u64 = 12;
const DEFAULT_COMPACT_OPTIONS: usize = 2;
const DEFAULT_MIN_WEIGHT_LBS: u64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    pub provider: ProviderConfig,
    pub shipment: ShipmentConfig,
    pub display: Option<DisplayConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentConfig {
    pub origin_postal: Option<String>,
    pub origin_type: Option<LocationType>,
    pub dest_type: Option<LocationType>,
    pub freight_class: Option<FreightClass>,
    pub min_weight_lbs: Option<u64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Options shown on single-product surfaces.
    pub compact_options: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
    /// `EnvFilter` directives, e.g. `"freight_quote=debug,reqwest=warn"`.
    pub filter: Option<String>,
}

impl LoggingConfig {
    /// 明確設定的 filter 優先，否則依 verbose 決定等級
    pub fn directive(&self, verbose: bool) -> String {
        match &self.filter {
            Some(filter) => filter.clone(),
            None if verbose || self.verbose.unwrap_or(false) => {
                "freight_quote=debug,info".to_string()
            }
            None => "freight_quote=info".to_string(),
        }
    }
}

impl QuoteConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| QuoteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RATE_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("provider.endpoint", &self.provider.endpoint)?;

        if let Some(timeout) = self.provider.timeout_seconds {
            validation::validate_positive_number("provider.timeout_seconds", timeout, 1)?;
        }

        let origin = validation::validate_required_field(
            "shipment.origin_postal",
            &self.shipment.origin_postal,
        )?;
        validation::validate_non_empty_string("shipment.origin_postal", origin)?;

        if let Some(currency) = &self.shipment.currency {
            if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
                return Err(QuoteError::InvalidConfigValueError {
                    field: "shipment.currency".to_string(),
                    value: currency.clone(),
                    reason: "Expected a three-letter ISO currency code".to_string(),
                });
            }
        }

        if let Some(compact) = self.display.as_ref().and_then(|d| d.compact_options) {
            validation::validate_range("display.compact_options", compact, 1, 10)?;
        }

        if let Some(filter) = self.logging.as_ref().and_then(|l| l.filter.as_ref()) {
            tracing_subscriber::EnvFilter::try_new(filter).map_err(|e| {
                QuoteError::InvalidConfigValueError {
                    field: "logging.filter".to_string(),
                    value: filter.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.provider.headers.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    pub fn json_logs(&self) -> bool {
        self.logging().json.unwrap_or(false)
    }
}

impl QuoteSettings for QuoteConfig {
    fn origin_postal(&self) -> &str {
        self.shipment.origin_postal.as_deref().unwrap_or_default()
    }

    fn origin_type(&self) -> LocationType {
        self.shipment.origin_type.unwrap_or(LocationType::Business)
    }

    fn dest_type(&self) -> LocationType {
        self.shipment.dest_type.unwrap_or_default()
    }

    fn freight_class(&self) -> FreightClass {
        self.shipment.freight_class.unwrap_or_default()
    }

    fn min_weight_lbs(&self) -> u64 {
        self.shipment.min_weight_lbs.unwrap_or(DEFAULT_MIN_WEIGHT_LBS)
    }

    fn currency(&self) -> &str {
        self.shipment.currency.as_deref().unwrap_or("USD")
    }

    fn timeout_seconds(&self) -> u64 {
        self.provider.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    fn compact_option_limit(&self) -> usize {
        self.display
            .as_ref()
            .and_then(|d| d.compact_options)
            .unwrap_or(DEFAULT_COMPACT_OPTIONS)
    }
}

impl Validate for QuoteConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
