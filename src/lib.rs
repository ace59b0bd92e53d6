pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpRateProvider;
pub use app::surface::{PendingQuote, QuoteSurface, SurfaceKind};
pub use config::QuoteConfig;
pub use core::specs::SpecExtractor;
pub use utils::error::{QuoteError, Result};
