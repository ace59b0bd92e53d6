use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Destination postal code is required")]
    BlankDestination,

    #[error("Shipment has no shippable weight")]
    EmptyShipment,

    #[error("Quantity {quantity} is below the minimum order quantity of {minimum} for {product}")]
    QuantityBelowMinimum {
        product: String,
        quantity: u32,
        minimum: u32,
    },

    #[error("No freight option at position {index} (only {available} listed)")]
    InvalidSelection { index: usize, available: usize },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Rate provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Malformed rate response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Freight quote request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Pattern compilation error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

/// 錯誤分類，對應報價流程中的失敗種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InputValidation,
    TransportFailure,
    Timeout,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuoteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            QuoteError::BlankDestination
            | QuoteError::EmptyShipment
            | QuoteError::QuantityBelowMinimum { .. }
            | QuoteError::InvalidSelection { .. }
            | QuoteError::ValidationError { .. } => ErrorCategory::InputValidation,
            QuoteError::ApiError(e) if e.is_timeout() => ErrorCategory::Timeout,
            QuoteError::ApiError(_)
            | QuoteError::HttpStatus { .. }
            | QuoteError::MalformedResponse { .. }
            | QuoteError::SerializationError(_) => ErrorCategory::TransportFailure,
            QuoteError::Timeout { .. } => ErrorCategory::Timeout,
            QuoteError::ConfigError { .. }
            | QuoteError::ConfigValidationError { .. }
            | QuoteError::InvalidConfigValueError { .. }
            | QuoteError::MissingConfigError { .. } => ErrorCategory::Configuration,
            QuoteError::CsvError(_) | QuoteError::IoError(_) | QuoteError::RegexError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::InputValidation => ErrorSeverity::High,
            ErrorCategory::TransportFailure | ErrorCategory::Timeout => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 可重試的錯誤（傳輸失敗、逾時）
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::TransportFailure | ErrorCategory::Timeout
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            QuoteError::BlankDestination => {
                "Please enter a destination ZIP code to get a freight quote.".to_string()
            }
            QuoteError::EmptyShipment => {
                "There is nothing with a known weight to ship yet.".to_string()
            }
            QuoteError::QuantityBelowMinimum {
                product, minimum, ..
            } => format!("{} must be ordered in quantities of at least {}.", product, minimum),
            QuoteError::InvalidSelection { available, .. } => {
                format!("Please choose one of the {} listed freight options.", available)
            }
            QuoteError::ValidationError { message } => message.clone(),
            _ => match self.category() {
                ErrorCategory::Timeout => {
                    "The freight quote request timed out. Please try again.".to_string()
                }
                ErrorCategory::TransportFailure => {
                    "We could not reach the freight rate service. Please try again.".to_string()
                }
                ErrorCategory::Configuration => format!("Configuration problem: {}", self),
                _ => format!("Unexpected error: {}", self),
            },
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::InputValidation => "Correct the highlighted input and request the quote again".to_string(),
            ErrorCategory::TransportFailure => "Check network access to the rate provider and retry".to_string(),
            ErrorCategory::Timeout => "Retry the request or raise provider.timeout_seconds".to_string(),
            ErrorCategory::Configuration => "Review the quote configuration file".to_string(),
            ErrorCategory::System => "Check file paths and permissions".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuoteError>;
